//! Reconciliation of optimistic records with authoritative confirmations.

mod engine;
mod models;

pub use engine::{dedupe, resolve_key, upsert, upsert_from_push};
pub use models::{IdentityKey, PushEnvelope, Record};
