//! Typed push payloads, one variant per event family.
//!
//! Payloads are validated here, at the adapter boundary. Fields a family does
//! not know about are carried into the notification's `data` bag untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::notifications::{NotificationIcon, NotificationInput, NotificationType};
use crate::reconcile::PushEnvelope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementPayload {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub action_text: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNotificationPayload {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub level: NotificationIcon,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthEventPayload {
    /// e.g. "login", "logout", "session_expired"
    pub event: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEventPayload {
    /// e.g. "post_removed", "warning"
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All push events the delivery adapters understand.
///
/// Serialized adjacently tagged, like the transport envelope:
/// `{"type": "event_name", "payload": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PushEvent {
    Announcement(AnnouncementPayload),
    SystemNotification(SystemNotificationPayload),
    Auth(AuthEventPayload),
    Moderation(ModerationEventPayload),
    PostCreated(PushEnvelope),
}

impl PushEvent {
    /// Validate the raw payload of `event`.
    pub fn parse(event: &str, payload: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json!({ "type": event, "payload": payload }))
    }

    /// The notification this event should surface, if any.
    pub fn into_notification(self) -> Option<NotificationInput> {
        match self {
            PushEvent::Announcement(payload) => {
                let mut input = NotificationInput::new(
                    NotificationType::Announcement,
                    payload.title,
                    payload.message,
                )
                .urgent(payload.urgent)
                .data(payload.extra);
                if let Some(url) = payload.url {
                    input = input.action(url, payload.action_text);
                }
                Some(input)
            }
            PushEvent::SystemNotification(payload) => Some(
                NotificationInput::new(NotificationType::System, payload.title, payload.message)
                    .icon(payload.level)
                    .data(payload.extra),
            ),
            PushEvent::Auth(payload) => Some(auth_notification(payload)),
            PushEvent::Moderation(payload) => Some(moderation_notification(payload)),
            PushEvent::PostCreated(_) => None,
        }
    }
}

fn auth_notification(payload: AuthEventPayload) -> NotificationInput {
    let (title, default_message, icon, urgent) = match payload.event.as_str() {
        "login" => (
            "Signed in",
            "A new session was started on your account",
            NotificationIcon::Success,
            false,
        ),
        "logout" => ("Signed out", "You have been signed out", NotificationIcon::Info, false),
        "session_expired" => (
            "Session expired",
            "Please sign in again",
            NotificationIcon::Warning,
            true,
        ),
        _ => ("Account activity", "Something changed on your account", NotificationIcon::Info, false),
    };
    let mut data = payload.extra;
    data.insert("event".to_string(), Value::String(payload.event));

    NotificationInput::new(
        NotificationType::Auth,
        title,
        payload.message.unwrap_or_else(|| default_message.to_string()),
    )
    .icon(icon)
    .urgent(urgent)
    .data(data)
}

fn moderation_notification(payload: ModerationEventPayload) -> NotificationInput {
    let (title, icon, urgent) = match payload.action.as_str() {
        "post_removed" => ("Post removed", NotificationIcon::Error, false),
        "warning" => ("Moderation warning", NotificationIcon::Warning, true),
        _ => ("Moderation update", NotificationIcon::Info, false),
    };
    let mut data = payload.extra;
    data.insert("action".to_string(), Value::String(payload.action));
    if let Some(post_id) = payload.post_id {
        data.insert("post_id".to_string(), Value::from(post_id));
    }

    let mut input = NotificationInput::new(
        NotificationType::Moderation,
        title,
        payload
            .reason
            .unwrap_or_else(|| "A moderator reviewed your content".to_string()),
    )
    .icon(icon)
    .urgent(urgent)
    .data(data);
    if let Some(post_id) = payload.post_id {
        input = input.action(format!("/posts/{}", post_id), Some("View post".to_string()));
    }
    input
}
