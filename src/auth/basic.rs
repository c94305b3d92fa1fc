//! Credential holder for registry HTTP basic auth

/// Server URL plus the optional credentials attached to every request.
///
/// Browsing works anonymously on open registries; mutations without
/// credentials fail server-side and surface through the normal error path.
pub struct BasicAuthenticator {
    server_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl BasicAuthenticator {
    /// Create an authenticator for the given registry server URL
    ///
    /// # Arguments
    /// * `server_url` - The registry base URL (e.g., "https://registry.example.org")
    pub fn new(
        server_url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        let server_url = server_url.into();
        let server_url = server_url.trim_end_matches('/').to_string();

        Self {
            server_url,
            username,
            password,
        }
    }

    /// Get the server URL
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Username/password pair, if a username was supplied
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.username
            .as_deref()
            .map(|user| (user, self.password.as_deref().unwrap_or("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url_normalization() {
        let auth = BasicAuthenticator::new("https://registry.example.org/", None, None);
        assert_eq!(auth.server_url(), "https://registry.example.org");
    }

    #[test]
    fn test_credentials_pairing() {
        let auth = BasicAuthenticator::new("https://r", None, None);
        assert!(auth.credentials().is_none());

        let auth = BasicAuthenticator::new("https://r", Some("admin".into()), None);
        assert_eq!(auth.credentials(), Some(("admin", "")));

        let auth =
            BasicAuthenticator::new("https://r", Some("admin".into()), Some("secret".into()));
        assert_eq!(auth.credentials(), Some(("admin", "secret")));
    }
}
