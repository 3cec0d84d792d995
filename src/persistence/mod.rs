//! Device-local key-value persistence shared by every running instance.
//!
//! Each instance (tab, window, process) talks to the shared state through its
//! own [`StateStorage`] handle. Writes made through one handle are announced to
//! every *other* handle via [`StateStorage::subscribe`], which is what drives
//! cross-instance resynchronization.

mod memory;
mod schema;
mod sqlite_state_storage;

pub use memory::{MemoryStorage, MemoryStorageHub};
pub use sqlite_state_storage::SqliteStateStorage;

use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the change notification channel of each handle.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Errors returned by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A key was written or removed through another handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
}

/// Key-value storage contract.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait StateStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to changes made by other handles. Own writes are never
    /// delivered. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
