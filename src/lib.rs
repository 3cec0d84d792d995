//! Client-side state core for a social feed.
//!
//! Reconciles optimistic posts with server confirmations and keeps a
//! persisted, cross-instance notification log with badge state.

pub mod config;
pub mod feed;
pub mod identity;
pub mod notifications;
pub mod persistence;
pub mod push;
pub mod reconcile;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use feed::{PostDraft, PostFeed};
pub use identity::ClientIdentity;
pub use notifications::{NotificationInput, NotificationStore, NotificationStoreConfig};
pub use persistence::{MemoryStorageHub, SqliteStateStorage, StateStorage, StorageError};
pub use push::{DeliveryAdapters, LocalPushChannel, PushChannel};
pub use reconcile::{PushEnvelope, Record};
