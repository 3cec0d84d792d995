//! Test fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use feed_client_core::notifications::{
    NotificationInput, NotificationSnapshot, NotificationStore, NotificationStoreConfig,
    NotificationType,
};
use feed_client_core::{ClientIdentity, MemoryStorageHub, PostFeed, Record, SqliteStateStorage};
use tempfile::TempDir;
use tokio::sync::watch;

/// A notification store on a fresh handle of `hub`.
pub fn memory_store(hub: &MemoryStorageHub) -> NotificationStore {
    NotificationStore::new(NotificationStoreConfig::default(), Arc::new(hub.handle()))
}

/// An empty feed whose identity lives in `hub`.
pub fn memory_feed(hub: &MemoryStorageHub) -> PostFeed {
    PostFeed::new(ClientIdentity::new(Arc::new(hub.handle())))
}

pub fn notification(title: &str) -> NotificationInput {
    NotificationInput::new(NotificationType::Comment, title, "someone replied")
}

pub fn confirmed_record(id: i64, tx_id: &str, content: &str) -> Record {
    Record {
        id: Some(id),
        client_tx_id: Some(tx_id.to_string()),
        content: Some(content.to_string()),
        ..Default::default()
    }
}

/// Wait until `rx` sees a new snapshot, failing the test after 30 seconds.
pub async fn wait_for_change(rx: &mut watch::Receiver<NotificationSnapshot>) -> NotificationSnapshot {
    tokio::time::timeout(Duration::from_secs(30), rx.changed())
        .await
        .expect("Timed out waiting for a snapshot change")
        .expect("Notification store dropped");
    rx.borrow_and_update().clone()
}

/// A SQLite database file in a temporary directory, removed on drop.
pub struct SqliteFixture {
    _temp_dir: TempDir,
    pub db_path: PathBuf,
}

impl SqliteFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("client_state.db");
        Self {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// Opens a new connection, as another process would.
    pub fn open(&self) -> Arc<SqliteStateStorage> {
        sqlite_storage(&self.db_path)
    }
}

pub fn sqlite_storage(path: &std::path::Path) -> Arc<SqliteStateStorage> {
    Arc::new(SqliteStateStorage::new(path).expect("Failed to open client state database"))
}
