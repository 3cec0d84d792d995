mod file_config;

pub use file_config::{FileConfig, NotificationsConfig, SyncConfig};

use crate::notifications::NotificationStoreConfig;
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NOTIFICATIONS_KEY: &str = "notifications";
pub const DEFAULT_MAX_NOTIFICATIONS: usize = 50;
pub const DEFAULT_COUNT_BADGE_WINDOW_SECS: u64 = 10;
pub const DEFAULT_SYNC_POLL_INTERVAL_MS: u64 = 500;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub notifications_key: String,
    pub max_notifications: usize,
    pub count_badge_window_secs: u64,
    pub sync_poll_interval_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            notifications_key: DEFAULT_NOTIFICATIONS_KEY.to_string(),
            max_notifications: DEFAULT_MAX_NOTIFICATIONS,
            count_badge_window_secs: DEFAULT_COUNT_BADGE_WINDOW_SECS,
            sync_poll_interval_ms: DEFAULT_SYNC_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub notifications_key: String,
    pub max_notifications: usize,
    pub count_badge_window: Duration,
    pub sync_poll_interval: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let notifications = file.notifications.unwrap_or_default();
        let notifications_key = notifications
            .storage_key
            .unwrap_or_else(|| cli.notifications_key.clone());
        if notifications_key.trim().is_empty() {
            bail!("notifications storage key must not be empty");
        }

        let max_notifications = notifications
            .max_notifications
            .unwrap_or(cli.max_notifications);
        if max_notifications < 1 {
            bail!("max_notifications must be at least 1");
        }

        let count_badge_window_secs = notifications
            .count_badge_window_secs
            .unwrap_or(cli.count_badge_window_secs);
        if count_badge_window_secs < 1 {
            bail!("count_badge_window_secs must be at least 1");
        }

        let sync_poll_interval_ms = file
            .sync
            .unwrap_or_default()
            .poll_interval_ms
            .unwrap_or(cli.sync_poll_interval_ms);
        if sync_poll_interval_ms < 10 {
            bail!("sync poll interval must be at least 10ms");
        }

        Ok(Self {
            db_path,
            notifications_key,
            max_notifications,
            count_badge_window: Duration::from_secs(count_badge_window_secs),
            sync_poll_interval: Duration::from_millis(sync_poll_interval_ms),
        })
    }

    pub fn store_config(&self) -> NotificationStoreConfig {
        NotificationStoreConfig {
            storage_key: self.notifications_key.clone(),
            max_notifications: self.max_notifications,
            count_badge_window: self.count_badge_window,
        }
    }
}
