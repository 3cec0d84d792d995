use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::schema::CLIENT_STATE_VERSIONED_SCHEMAS;
use super::{StateStorage, StorageChange, StorageError, CHANGE_CHANNEL_CAPACITY};
use crate::sqlite_persistence::BASE_DB_VERSION;

/// SQLite-backed storage shared by several processes on the same device.
///
/// Every connection gets its own writer id. Rows carry a global revision, and
/// [`SqliteStateStorage::poll_changes`] turns rows written by other writers
/// since the last poll into [`StorageChange`] events.
pub struct SqliteStateStorage {
    conn: Arc<Mutex<Connection>>,
    writer_id: String,
    last_seen_revision: Mutex<i64>,
    sender: broadcast::Sender<StorageChange>,
}

impl SqliteStateStorage {
    pub fn new<P: AsRef<Path>>(db_path: P) -> anyhow::Result<Self> {
        let path = db_path.as_ref();
        let file_existed = path.exists();

        let mut conn = Connection::open(path).context("Failed to open client state database")?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let table_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get(0))?;
        // An existing but empty file (pre-created, or another process has not
        // created the schema yet) is initialized like a missing one.
        let is_new_db = !file_existed || (raw_version == 0 && table_count == 0);

        let latest = CLIENT_STATE_VERSIONED_SCHEMAS
            .last()
            .context("No client state schema defined")?;

        if is_new_db {
            info!("Creating new client state database at {:?}", path);
            latest.create(&conn)?;
        } else {
            let db_version = raw_version - BASE_DB_VERSION as i64;
            if db_version < 1 {
                anyhow::bail!(
                    "Client state database user_version {} is invalid (expected >= {})",
                    raw_version,
                    BASE_DB_VERSION + 1
                );
            }

            let schema = CLIENT_STATE_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown client state database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Client state database schema validation failed for version {}",
                    db_version
                )
            })?;

            if (db_version as usize) < latest.version {
                Self::migrate(&mut conn, db_version as usize)?;
            }
        }

        let last_seen: i64 = conn.query_row(
            "SELECT COALESCE(MAX(revision), 0) FROM client_state",
            [],
            |row| row.get(0),
        )?;
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            writer_id: Uuid::new_v4().to_string(),
            last_seen_revision: Mutex::new(last_seen),
            sender,
        })
    }

    fn migrate(conn: &mut Connection, from_version: usize) -> anyhow::Result<()> {
        let tx = conn.transaction()?;
        let mut latest_from = from_version;
        for schema in CLIENT_STATE_VERSIONED_SCHEMAS
            .iter()
            .filter(|s| s.version > from_version)
        {
            info!(
                "Migrating client state database from version {} to {}",
                latest_from, schema.version
            );
            if let Some(migration_fn) = schema.migration {
                migration_fn(&tx).with_context(|| {
                    format!("Failed to run migration to version {}", schema.version)
                })?;
            }
            latest_from = schema.version;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("client state connection lock poisoned".to_string()))
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn()?.execute(
            "INSERT INTO client_state (key, value, writer, revision, updated_at)
             VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(revision), 0) + 1 FROM client_state), ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                writer = excluded.writer,
                revision = excluded.revision,
                updated_at = excluded.updated_at",
            params![key, value, self.writer_id, now],
        )?;
        Ok(())
    }

    /// Emit a change for every key written by another writer since the last
    /// poll. Returns the number of changes emitted.
    pub fn poll_changes(&self) -> Result<usize, StorageError> {
        let mut last_seen = self
            .last_seen_revision
            .lock()
            .map_err(|_| StorageError::Backend("revision lock poisoned".to_string()))?;

        let rows: Vec<(String, String, i64)> = {
            let conn = self.conn()?;
            let mut stmt = conn.prepare(
                "SELECT key, writer, revision FROM client_state
                 WHERE revision > ?1 ORDER BY revision ASC",
            )?;
            let rows: Vec<(String, String, i64)> = stmt
                .query_map(params![*last_seen], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut emitted = 0;
        for (key, writer, revision) in rows {
            *last_seen = (*last_seen).max(revision);
            if writer == self.writer_id {
                continue;
            }
            debug!("Detected change of {} by writer {}", key, writer);
            let _ = self.sender.send(StorageChange { key });
            emitted += 1;
        }
        Ok(emitted)
    }

    /// Poll for changes by other writers every `interval` until the storage is
    /// dropped.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(storage) = weak.upgrade() else {
                    debug!("Client state storage dropped, stopping watcher");
                    break;
                };
                if let Err(err) = storage.poll_changes() {
                    warn!("Failed to poll client state changes: {}", err);
                }
            }
        })
    }

    pub fn writer_id(&self) -> &str {
        &self.writer_id
    }
}

impl StateStorage for SqliteStateStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value: Option<Option<String>> = self
            .conn()?
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(key, Some(value))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.write(key, None)
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.sender.subscribe()
    }
}
