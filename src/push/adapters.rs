//! Wires push channel events into the notification store and the post feed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::channel::{event_names, PushChannel, PushHandler, SubscriptionId};
use super::events::PushEvent;
use crate::feed::PostFeed;
use crate::notifications::NotificationStore;

const NOTIFICATION_EVENTS: [&str; 4] = [
    event_names::ANNOUNCEMENT,
    event_names::SYSTEM_NOTIFICATION,
    event_names::AUTH,
    event_names::MODERATION,
];

/// Handler registrations on a push channel. Dropping this detaches them.
pub struct DeliveryAdapters {
    channel: Arc<dyn PushChannel>,
    subscriptions: Vec<(&'static str, SubscriptionId)>,
}

impl DeliveryAdapters {
    /// Register one handler per event family.
    ///
    /// `post_created` is only listened to when a feed is given.
    pub fn attach(
        channel: Arc<dyn PushChannel>,
        store: NotificationStore,
        feed: Option<PostFeed>,
    ) -> Self {
        let mut subscriptions = Vec::new();

        for event in NOTIFICATION_EVENTS {
            let store = store.clone();
            let handler: PushHandler = Arc::new(move |payload: &serde_json::Value| {
                let Some(parsed) = parse_or_warn(event, payload) else {
                    return;
                };
                if let Some(input) = parsed.into_notification() {
                    let id = store.add(input);
                    debug!("Push event {} stored as notification {}", event, id);
                }
            });
            subscriptions.push((event, channel.subscribe(event, handler)));
        }

        if let Some(feed) = feed {
            let handler: PushHandler = Arc::new(move |payload: &serde_json::Value| {
                if let Some(PushEvent::PostCreated(envelope)) =
                    parse_or_warn(event_names::POST_CREATED, payload)
                {
                    feed.apply_push(envelope);
                }
            });
            subscriptions.push((
                event_names::POST_CREATED,
                channel.subscribe(event_names::POST_CREATED, handler),
            ));
        }

        info!("Attached {} push handlers", subscriptions.len());
        Self {
            channel,
            subscriptions,
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Unregister every handler now.
    pub fn detach(mut self) {
        self.unsubscribe_all();
    }

    fn unsubscribe_all(&mut self) {
        for (event, id) in self.subscriptions.drain(..) {
            if !self.channel.unsubscribe(event, id) {
                debug!("Push handler for {} was already gone", event);
            }
        }
    }
}

impl Drop for DeliveryAdapters {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}

fn parse_or_warn(event: &str, payload: &serde_json::Value) -> Option<PushEvent> {
    match PushEvent::parse(event, payload) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Dropping invalid {} push payload: {}", event, e);
            None
        }
    }
}
