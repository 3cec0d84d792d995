//! Merging of optimistic and authoritative records.
//!
//! Every function takes the current ordered collection by value and returns
//! the new one. Collections returned from here never hold two records with
//! the same [`IdentityKey`].

use std::collections::HashSet;

use tracing::{debug, warn};

use super::models::{IdentityKey, PushEnvelope, Record};
use crate::identity::fingerprint;

/// Resolve the identity key of a record.
///
/// Priority order: server id, client transaction id, temp key, content hash.
pub fn resolve_key(record: &Record) -> IdentityKey {
    if let Some(id) = record.id {
        return IdentityKey::new(format!("id:{}", id));
    }
    if let Some(signature) = record.tx_id().or_else(|| record.temp_key()) {
        return IdentityKey::new(signature);
    }
    let content = record.content.as_deref().unwrap_or_default();
    IdentityKey::new(format!("content-hash:{}", fingerprint(content)))
}

/// Keep the first record of each identity key, preserving order.
pub fn dedupe(records: Vec<Record>) -> Vec<Record> {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    let deduped: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(resolve_key(record)))
        .collect();
    if deduped.len() != before {
        debug!("Dropped {} duplicate records", before - deduped.len());
    }
    deduped
}

fn find_by_id(records: &[Record], incoming: &Record) -> Option<usize> {
    let id = incoming.id?;
    records.iter().position(|existing| existing.id == Some(id))
}

fn find_by_signature(records: &[Record], incoming: &Record) -> Option<usize> {
    let tx_id = incoming.tx_id();
    let temp_key = incoming.temp_key();
    if tx_id.is_none() && temp_key.is_none() {
        return None;
    }
    records.iter().position(|existing| {
        // A confirmed record is never re-identified through a signature that
        // now points at a different server id.
        if let (Some(a), Some(b)) = (existing.id, incoming.id) {
            if a != b {
                return false;
            }
        }
        (tx_id.is_some() && existing.tx_id() == tx_id)
            || (temp_key.is_some() && existing.temp_key() == temp_key)
    })
}

/// Merge `incoming` into `records`.
///
/// A match (by server id first, then by transaction id or temp key) is
/// replaced in place by a shallow merge. Anything else is prepended. A missing
/// `incoming` leaves the collection untouched.
pub fn upsert(records: Vec<Record>, incoming: impl Into<Option<Record>>) -> Vec<Record> {
    let Some(incoming) = incoming.into() else {
        warn!("Ignoring upsert without an incoming record");
        return records;
    };

    let mut records = dedupe(records);
    let position =
        find_by_id(&records, &incoming).or_else(|| find_by_signature(&records, &incoming));

    match position {
        Some(index) => {
            debug!(
                "Replacing record {} at index {}",
                resolve_key(&records[index]),
                index
            );
            records[index].merge_from(incoming);
        }
        None => {
            debug!("Prepending new record {}", resolve_key(&incoming));
            records.insert(0, incoming);
        }
    }

    dedupe(records)
}

/// Apply a real-time push envelope to `records`.
pub fn upsert_from_push(records: Vec<Record>, envelope: PushEnvelope) -> Vec<Record> {
    match envelope.into_record() {
        Some(record) => upsert(records, record),
        None => {
            debug!("Push envelope carries no record, ignoring");
            records
        }
    }
}
