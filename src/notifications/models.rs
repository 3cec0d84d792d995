//! Notification data models

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Notification type.
///
/// The built-in vocabulary covers the known producers; anything else is kept
/// as [`NotificationType::Custom`] so producers can register their own types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    Auth,
    Moderation,
    Comment,
    Reaction,
    Announcement,
    System,
    Custom(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationType::Auth => "auth",
            NotificationType::Moderation => "moderation",
            NotificationType::Comment => "comment",
            NotificationType::Reaction => "reaction",
            NotificationType::Announcement => "announcement",
            NotificationType::System => "system",
            NotificationType::Custom(name) => name,
        }
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "auth" => NotificationType::Auth,
            "moderation" => NotificationType::Moderation,
            "comment" => NotificationType::Comment,
            "reaction" => NotificationType::Reaction,
            "announcement" => NotificationType::Announcement,
            "system" => NotificationType::System,
            _ => NotificationType::Custom(value),
        }
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        match value {
            NotificationType::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl FromStr for NotificationType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NotificationType::from(s.to_string()))
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationIcon {
    Success,
    Warning,
    Error,
    #[default]
    Info,
}

/// A notification as stored in the persisted log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub icon: NotificationIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_text: Option<String>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Generate a notification id: the timestamp plus a random base-36 suffix.
pub(crate) fn generate_notification_id(timestamp: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_ALPHABET[rng.random_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", timestamp, suffix)
}

/// What a producer hands to the store. Id, timestamp and read state are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationInput {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub urgent: bool,
    pub icon: NotificationIcon,
    pub action_url: Option<String>,
    pub action_text: Option<String>,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl NotificationInput {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            message: message.into(),
            urgent: false,
            icon: NotificationIcon::default(),
            action_url: None,
            action_text: None,
            data: serde_json::Map::new(),
        }
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    pub fn icon(mut self, icon: NotificationIcon) -> Self {
        self.icon = icon;
        self
    }

    pub fn action(mut self, url: impl Into<String>, text: Option<String>) -> Self {
        self.action_url = Some(url.into());
        self.action_text = text;
        self
    }

    pub fn data(mut self, data: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    pub(crate) fn into_notification(self, timestamp: i64) -> Notification {
        Notification {
            id: generate_notification_id(timestamp),
            notification_type: self.notification_type,
            title: self.title,
            message: self.message,
            timestamp,
            read: false,
            urgent: self.urgent,
            icon: self.icon,
            action_url: self.action_url,
            action_text: self.action_text,
            data: self.data,
        }
    }
}

/// Badge shown for unread notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BadgeState {
    /// Nothing unread.
    #[default]
    None,
    /// Unread notifications exist.
    Dot,
    /// Unread notifications exist and one arrived recently.
    Count,
}

/// State published to subscribers after every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub badge_state: BadgeState,
    /// False while the last write to storage failed.
    pub persistence_healthy: bool,
}
