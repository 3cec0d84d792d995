//! Ordered post feed kept consistent across optimistic inserts and confirmations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::SecondsFormat;
use tokio::sync::watch;
use tracing::debug;

use crate::identity::{derive_temp_key, ClientIdentity};
use crate::reconcile::{self, PushEnvelope, Record};

/// A post the user is about to publish.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub content: String,
    pub author_hash: String,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PostDraft {
    pub fn new(content: impl Into<String>, author_hash: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author_hash: author_hash.into(),
            extra: serde_json::Map::new(),
        }
    }
}

struct FeedInner {
    identity: ClientIdentity,
    records: Mutex<Vec<Record>>,
    records_tx: watch::Sender<Vec<Record>>,
}

/// Shared handle to the feed. Clones point at the same records.
#[derive(Clone)]
pub struct PostFeed {
    inner: Arc<FeedInner>,
}

impl PostFeed {
    pub fn new(identity: ClientIdentity) -> Self {
        Self::with_records(identity, Vec::new())
    }

    /// Start from already-fetched records (e.g. the first page from the server).
    pub fn with_records(identity: ClientIdentity, records: Vec<Record>) -> Self {
        let records = reconcile::dedupe(records);
        let (records_tx, _) = watch::channel(records.clone());
        Self {
            inner: Arc::new(FeedInner {
                identity,
                records: Mutex::new(records),
                records_tx,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Record>> {
        self.inner
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, f: impl FnOnce(Vec<Record>) -> Vec<Record>) {
        let mut records = self.lock();
        let current = std::mem::take(&mut *records);
        *records = f(current);
        self.inner.records_tx.send_replace(records.clone());
    }

    /// Show a draft immediately, before the server knows about it.
    ///
    /// The returned record carries the transaction id and temp key that the
    /// confirmation will be matched against.
    pub fn insert_optimistic(&self, draft: PostDraft) -> Record {
        let tx_id = self.inner.identity.next_tx_id();
        let created_at = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let temp_key = derive_temp_key(
            &draft.content,
            &created_at,
            &draft.author_hash,
            Some(tx_id.as_str()),
        );
        let record = Record {
            id: None,
            client_tx_id: Some(tx_id),
            temp_key: Some(temp_key),
            content: Some(draft.content),
            created_at: Some(created_at),
            author_hash: Some(draft.author_hash),
            origin: Some(self.inner.identity.client_id().to_string()),
            event_id: None,
            extra: draft.extra,
        };
        debug!("Inserting optimistic record {}", reconcile::resolve_key(&record));
        self.apply(|records| reconcile::upsert(records, record.clone()));
        record
    }

    /// Merge an authoritative record, e.g. the body of the HTTP response.
    pub fn confirm(&self, record: Record) {
        self.apply(|records| reconcile::upsert(records, record));
    }

    /// Merge a record delivered by the real-time push channel.
    pub fn apply_push(&self, envelope: PushEnvelope) {
        self.apply(|records| reconcile::upsert_from_push(records, envelope));
    }

    pub fn records(&self) -> Vec<Record> {
        self.lock().clone()
    }

    /// Subscribe to feed changes. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Record>> {
        self.inner.records_tx.subscribe()
    }
}
