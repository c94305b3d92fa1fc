use crate::models::User;
use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export formats
pub enum ExportFormat {
    Csv,
    Json,
}

/// Export a page of users to a file
pub fn export_users(users: &[User], format: ExportFormat, path: &Path) -> Result<String> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Csv => export_to_csv(users, path),
        ExportFormat::Json => export_to_json(users, path),
    }
}

fn export_to_csv(users: &[User], path: &Path) -> Result<String> {
    let mut file = File::create(path)?;

    writeln!(file, "key,username,name,email,country,roles,deleted")?;

    for user in users {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            user.key,
            user.user_name.as_deref().unwrap_or(""),
            user.get_display_name(),
            user.email.as_deref().unwrap_or(""),
            user.country.as_deref().unwrap_or(""),
            user.roles.join(";"),
            user.deleted.as_deref().unwrap_or("")
        )?;
    }

    Ok(path.to_string_lossy().to_string())
}

fn export_to_json(users: &[User], path: &Path) -> Result<String> {
    let mut file = File::create(path)?;

    let json = serde_json::to_string_pretty(users)?;
    file.write_all(json.as_bytes())?;

    Ok(path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_export() {
        let users: Vec<User> = serde_json::from_str(
            r#"[{"key": "u1", "userName": "alice", "email": "alice@example.org",
                 "roles": ["ADMIN", "VIEWER"]}]"#,
        )
        .unwrap();

        let path = std::env::temp_dir().join("regman_export_test.csv");
        export_users(&users, ExportFormat::Csv, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("key,username,name,email,country,roles,deleted"));
        assert_eq!(lines.next(), Some("u1,alice,alice,alice@example.org,,ADMIN;VIEWER,"));

        std::fs::remove_file(&path).ok();
    }
}
