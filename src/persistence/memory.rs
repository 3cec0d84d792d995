//! In-process shared storage.
//!
//! A [`MemoryStorageHub`] plays the role of the device-local store; every
//! instance attaches its own [`MemoryStorage`] handle to it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use super::{StateStorage, StorageChange, StorageError, CHANGE_CHANNEL_CAPACITY};

#[derive(Default)]
struct HubInner {
    values: Mutex<HashMap<String, String>>,
    /// handle id -> change sender of that handle
    listeners: Mutex<HashMap<Uuid, broadcast::Sender<StorageChange>>>,
    /// Maximum total size in bytes of all keys and values.
    quota: Mutex<Option<usize>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|_| StorageError::Backend("memory storage lock poisoned".to_string()))
}

impl HubInner {
    fn notify_except(&self, origin: Option<Uuid>, key: &str) {
        let Ok(listeners) = self.listeners.lock() else {
            return;
        };
        for (id, sender) in listeners.iter() {
            if Some(*id) == origin {
                continue;
            }
            // No receivers is fine, the handle simply isn't listening.
            let _ = sender.send(StorageChange {
                key: key.to_string(),
            });
        }
    }

    fn write(&self, origin: Option<Uuid>, key: &str, value: &str) -> Result<(), StorageError> {
        {
            let mut values = lock(&self.values)?;
            if let Some(quota) = *lock(&self.quota)? {
                let needed: usize = values
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum::<usize>()
                    + key.len()
                    + value.len();
                if needed > quota {
                    return Err(StorageError::QuotaExceeded { needed, quota });
                }
            }
            values.insert(key.to_string(), value.to_string());
        }
        self.notify_except(origin, key);
        Ok(())
    }
}

/// The shared backing store. Cloning yields another reference to the same data.
#[derive(Clone, Default)]
pub struct MemoryStorageHub {
    inner: Arc<HubInner>,
}

impl MemoryStorageHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new instance handle.
    pub fn handle(&self) -> MemoryStorage {
        let id = Uuid::new_v4();
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.insert(id, sender.clone());
        }
        debug!("Attached memory storage handle {}", id);
        MemoryStorage {
            id,
            hub: self.inner.clone(),
            sender,
        }
    }

    /// Limit the total stored size, `None` removes the limit.
    pub fn set_quota(&self, quota: Option<usize>) {
        if let Ok(mut current) = self.inner.quota.lock() {
            *current = quota;
        }
    }

    /// Write a raw value as an outside party would (every handle is notified).
    pub fn write_external(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.write(None, key, value)
    }

    pub fn read_raw(&self, key: &str) -> Option<String> {
        self.inner
            .values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    pub fn handle_count(&self) -> usize {
        self.inner.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// One instance's view of a [`MemoryStorageHub`].
pub struct MemoryStorage {
    id: Uuid,
    hub: Arc<HubInner>,
    sender: broadcast::Sender<StorageChange>,
}

impl StateStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.hub.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.hub.write(Some(self.id), key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = lock(&self.hub.values)?.remove(key).is_some();
        if removed {
            self.hub.notify_except(Some(self.id), key);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.sender.subscribe()
    }
}

impl Drop for MemoryStorage {
    fn drop(&mut self) {
        if let Ok(mut listeners) = self.hub.listeners.lock() {
            listeners.remove(&self.id);
        }
    }
}
