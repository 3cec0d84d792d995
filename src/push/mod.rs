//! Push delivery: the channel contract, typed event payloads and the adapters
//! forwarding them into the notification store and the post feed.

mod adapters;
mod channel;
mod events;

pub use adapters::DeliveryAdapters;
pub use channel::{
    event_names, LocalPushChannel, PushChannel, PushHandler, PushMessage, SubscriptionId,
};
pub use events::{
    AnnouncementPayload, AuthEventPayload, ModerationEventPayload, PushEvent,
    SystemNotificationPayload,
};
