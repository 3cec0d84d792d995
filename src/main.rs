use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feed_client_core::config;
use feed_client_core::notifications::{
    self, Notification, NotificationIcon, NotificationInput, NotificationSnapshot,
    NotificationStore, NotificationType,
};
use feed_client_core::persistence::SqliteStateStorage;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
#[command(name = "feed-notifications")]
#[command(about = "Inspect and edit a persisted notification log")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// SQLite database holding the client state. Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Storage key of the notification log.
    #[clap(long, default_value = config::DEFAULT_NOTIFICATIONS_KEY)]
    pub notifications_key: String,

    /// Maximum number of notifications kept.
    #[clap(long, default_value_t = config::DEFAULT_MAX_NOTIFICATIONS)]
    pub max_notifications: usize,

    /// Seconds after an arrival during which the badge shows a count.
    #[clap(long, default_value_t = config::DEFAULT_COUNT_BADGE_WINDOW_SECS)]
    pub count_badge_window_secs: u64,

    /// How often to look for writes made by other processes.
    #[clap(long, default_value_t = config::DEFAULT_SYNC_POLL_INTERVAL_MS)]
    pub sync_poll_interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Shows all notifications, newest first.
    List,

    /// Adds a notification.
    Add {
        /// auth, moderation, comment, reaction, announcement, system or any custom type.
        #[clap(long = "type", default_value = "system")]
        notification_type: String,
        title: String,
        message: String,
        #[clap(long)]
        urgent: bool,
        /// success, warning, error or info.
        #[clap(long, default_value = "info")]
        icon: String,
        #[clap(long)]
        action_url: Option<String>,
        #[clap(long)]
        action_text: Option<String>,
    },

    /// Marks one notification as read.
    Read { id: String },

    /// Marks every notification as read.
    ReadAll,

    /// Removes one notification.
    Remove { id: String },

    /// Removes every notification.
    Clear,

    /// Prints the log whenever another process changes it, until Ctrl+C.
    Watch,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            notifications_key: args.notifications_key.clone(),
            max_notifications: args.max_notifications,
            count_badge_window_secs: args.count_badge_window_secs,
            sync_poll_interval_ms: args.sync_poll_interval_ms,
        }
    }
}

fn parse_icon(s: &str) -> Result<NotificationIcon> {
    match serde_json::from_value(serde_json::Value::String(s.to_lowercase())) {
        Ok(icon) => Ok(icon),
        Err(_) => bail!("Unknown icon {:?}, expected success, warning, error or info", s),
    }
}

fn print_notification(notification: &Notification) {
    let marker = if notification.read { " " } else { "*" };
    let urgent = if notification.urgent { " [urgent]" } else { "" };
    let time = chrono::DateTime::from_timestamp_millis(notification.timestamp)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| notification.timestamp.to_string());
    println!(
        "{} {} {} [{}]{} {}: {}",
        marker,
        notification.id,
        time,
        notification.notification_type,
        urgent,
        notification.title,
        notification.message
    );
    if let Some(url) = &notification.action_url {
        let text = notification.action_text.as_deref().unwrap_or("Open");
        println!("    {} -> {}", text, url);
    }
}

fn print_snapshot(snapshot: &NotificationSnapshot) {
    println!(
        "{} notifications, {} unread, badge {:?}",
        snapshot.notifications.len(),
        snapshot.unread_count,
        snapshot.badge_state
    );
    for notification in &snapshot.notifications {
        print_notification(notification);
    }
    if !snapshot.persistence_healthy {
        println!("warning: the last write to the database failed");
    }
}

async fn watch(store: &NotificationStore) -> Result<()> {
    let mut rx = store.subscribe();
    print_snapshot(&rx.borrow_and_update());
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                print_snapshot(&snapshot);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    if !app_config.db_path.exists() {
        info!("Creating new state database at {:?}", app_config.db_path);
    }
    let storage = Arc::new(SqliteStateStorage::new(&app_config.db_path)?);
    let store = notifications::init(NotificationStore::new(
        app_config.store_config(),
        storage.clone(),
    ));

    match cli_args.command {
        Command::List => print_snapshot(&store.snapshot()),
        Command::Add {
            notification_type,
            title,
            message,
            urgent,
            icon,
            action_url,
            action_text,
        } => {
            let notification_type: NotificationType = notification_type.parse()?;
            let mut input = NotificationInput::new(notification_type, title, message)
                .urgent(urgent)
                .icon(parse_icon(&icon)?);
            if let Some(url) = action_url {
                input = input.action(url, action_text);
            }
            println!("{}", store.add(input));
        }
        Command::Read { id } => {
            if !store.mark_as_read(&id) {
                bail!("No notification with id {}", id);
            }
        }
        Command::ReadAll => store.mark_all_as_read(),
        Command::Remove { id } => {
            if !store.remove(&id) {
                bail!("No notification with id {}", id);
            }
        }
        Command::Clear => store.clear_all(),
        Command::Watch => {
            let watcher = storage.spawn_watcher(app_config.sync_poll_interval);
            watch(store).await?;
            watcher.abort();
        }
    }

    if !store.snapshot().persistence_healthy {
        bail!("Failed to persist notifications to {:?}", app_config.db_path);
    }
    Ok(())
}
