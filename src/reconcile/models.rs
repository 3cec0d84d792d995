//! Reconciled record and push envelope models

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record that may exist optimistically before the server confirms it.
///
/// Field names follow the camelCase compatibility contract of the HTTP and
/// push layers; fields this core does not know about are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, alias = "client_tx_id", skip_serializing_if = "Option::is_none")]
    pub client_tx_id: Option<String>,
    #[serde(default, alias = "temp_key", skip_serializing_if = "Option::is_none")]
    pub temp_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, alias = "author_hash", skip_serializing_if = "Option::is_none")]
    pub author_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, alias = "event_id", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Treat empty identifiers like missing ones.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Record {
    pub fn tx_id(&self) -> Option<&str> {
        present(&self.client_tx_id)
    }

    pub fn temp_key(&self) -> Option<&str> {
        present(&self.temp_key)
    }

    /// Shallow merge: fields set on `incoming` win, the others are preserved.
    pub fn merge_from(&mut self, incoming: Record) {
        fn take<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }
        take(&mut self.id, incoming.id);
        take(&mut self.client_tx_id, incoming.client_tx_id);
        take(&mut self.temp_key, incoming.temp_key);
        take(&mut self.content, incoming.content);
        take(&mut self.created_at, incoming.created_at);
        take(&mut self.author_hash, incoming.author_hash);
        take(&mut self.origin, incoming.origin);
        take(&mut self.event_id, incoming.event_id);
        self.extra.extend(incoming.extra);
    }
}

/// The key deciding whether two records are the same logical entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub(crate) fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Real-time push envelope carrying a record plus transport metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    #[serde(default, alias = "clientTxId", skip_serializing_if = "Option::is_none")]
    pub client_tx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, alias = "eventId", skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl PushEnvelope {
    /// Unwrap the carried record and enrich it with the transport metadata.
    ///
    /// The record's own transaction id wins over the envelope's; origin and
    /// event id are taken from the envelope when it has them.
    pub fn into_record(self) -> Option<Record> {
        let mut record = self.post.or(self.record)?;
        if record.tx_id().is_none() && present(&self.client_tx_id).is_some() {
            record.client_tx_id = self.client_tx_id;
        }
        if self.origin.is_some() {
            record.origin = self.origin;
        }
        if self.event_id.is_some() {
            record.event_id = self.event_id;
        }
        Some(record)
    }
}
