//! Push channel contract and an in-process implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Callback invoked with the raw payload of a push event.
pub type PushHandler = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Identifies one handler registration, used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The real-time push transport as seen by this core.
pub trait PushChannel: Send + Sync {
    fn subscribe(&self, event: &str, handler: PushHandler) -> SubscriptionId;

    /// Returns false if no such subscription exists.
    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool;
}

/// Push message envelope as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushMessage {
    /// Event name (e.g. "announcement", "post_created")
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Event-specific payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Event names the delivery adapters listen on.
pub mod event_names {
    pub const ANNOUNCEMENT: &str = "announcement";
    pub const SYSTEM_NOTIFICATION: &str = "system_notification";
    pub const AUTH: &str = "auth";
    pub const MODERATION: &str = "moderation";
    pub const POST_CREATED: &str = "post_created";
}

/// Dispatches published events to handlers registered in the same process.
#[derive(Default)]
pub struct LocalPushChannel {
    /// event name -> registered handlers, in registration order
    handlers: RwLock<HashMap<String, Vec<(SubscriptionId, PushHandler)>>>,
    next_id: AtomicU64,
}

impl LocalPushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `payload` to every handler of `event`. Returns how many
    /// handlers were called.
    pub fn publish(&self, event: &str, payload: &serde_json::Value) -> usize {
        // Handlers run outside the lock so they may (un)subscribe.
        let handlers: Vec<PushHandler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map(|registered| registered.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        if handlers.is_empty() {
            debug!("No handlers for push event {}", event);
        }
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn publish_message(&self, message: &PushMessage) -> usize {
        self.publish(&message.msg_type, &message.payload)
    }

    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map_or(0, Vec::len)
    }
}

impl PushChannel for LocalPushChannel {
    fn subscribe(&self, event: &str, handler: PushHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn unsubscribe(&self, event: &str, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(registered) = handlers.get_mut(event) else {
            return false;
        };
        let before = registered.len();
        registered.retain(|(existing, _)| *existing != id);
        let removed = registered.len() != before;
        if registered.is_empty() {
            handlers.remove(event);
        }
        removed
    }
}
