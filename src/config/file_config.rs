use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_path: Option<String>,
    pub notifications: Option<NotificationsConfig>,
    pub sync: Option<SyncConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Storage key holding the notification log
    pub storage_key: Option<String>,
    pub max_notifications: Option<usize>,
    pub count_badge_window_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
db_path = "/tmp/state.db"

[notifications]
storage_key = "inbox"
max_notifications = 20
count_badge_window_secs = 5

[sync]
poll_interval_ms = 250
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.db_path.as_deref(), Some("/tmp/state.db"));
        let notifications = config.notifications.unwrap();
        assert_eq!(notifications.storage_key.as_deref(), Some("inbox"));
        assert_eq!(notifications.max_notifications, Some(20));
        assert_eq!(notifications.count_badge_window_secs, Some(5));
        assert_eq!(config.sync.unwrap().poll_interval_ms, Some(250));
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert!(config.db_path.is_none());
        assert!(config.notifications.is_none());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_notifications = [").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load(Path::new("/nonexistent/feed.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
