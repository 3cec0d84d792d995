//! User notifications module

mod models;
mod store;

use std::sync::OnceLock;

use tracing::warn;

pub use models::{
    BadgeState, Notification, NotificationIcon, NotificationInput, NotificationSnapshot,
    NotificationType,
};
pub use store::{NotificationStore, NotificationStoreConfig};

static GLOBAL_STORE: OnceLock<NotificationStore> = OnceLock::new();

/// Install the process-wide notification store.
///
/// Only the first call installs its store; later calls keep the existing one
/// and return it.
pub fn init(store: NotificationStore) -> &'static NotificationStore {
    let mut installed = false;
    let global = GLOBAL_STORE.get_or_init(|| {
        installed = true;
        store
    });
    if !installed {
        warn!("Notification store already initialized, keeping the existing one");
    }
    global
}

/// The process-wide notification store, if [`init`] was called.
pub fn global() -> Option<&'static NotificationStore> {
    GLOBAL_STORE.get()
}
