//! Per-device client id and per-action transaction ids.

use std::sync::{Arc, OnceLock};

use tracing::warn;
use uuid::Uuid;

use crate::persistence::StateStorage;

/// Storage key under which the device client id is memoized.
pub const CLIENT_ID_KEY: &str = "client_id";

/// Mints the identifiers attached to optimistic records.
pub struct ClientIdentity {
    storage: Arc<dyn StateStorage>,
    client_id: OnceLock<String>,
}

impl ClientIdentity {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self {
            storage,
            client_id: OnceLock::new(),
        }
    }

    /// The device client id, generated once and memoized in storage.
    ///
    /// If storage cannot be read or written the id lives in memory only, for
    /// the lifetime of this instance.
    pub fn client_id(&self) -> &str {
        self.client_id.get_or_init(|| {
            match self.storage.get(CLIENT_ID_KEY) {
                Ok(Some(existing)) if !existing.is_empty() => return existing,
                Ok(_) => {}
                Err(err) => warn!("Failed to read client id: {}", err),
            }
            let generated = Uuid::new_v4().to_string();
            if let Err(err) = self.storage.set(CLIENT_ID_KEY, &generated) {
                warn!("Failed to persist client id, using in-memory id: {}", err);
            }
            generated
        })
    }

    /// A fresh client transaction id.
    pub fn next_tx_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
