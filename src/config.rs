use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub servers: Vec<String>,
    pub current_server: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().context("Could not find config directory")?;
        path.push("regman");
        path.push("config.toml");
        Ok(path)
    }

    pub fn add_server(&mut self, url: String) {
        if !self.servers.contains(&url) {
            self.servers.push(url.clone());
        }
        self.current_server = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_server_deduplicates_and_tracks_current() {
        let mut config = Config::default();
        config.add_server("https://a".to_string());
        config.add_server("https://b".to_string());
        config.add_server("https://a".to_string());

        assert_eq!(config.servers, vec!["https://a", "https://b"]);
        assert_eq!(config.current_server.as_deref(), Some("https://a"));
    }
}
