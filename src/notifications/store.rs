//! Persisted, capped notification log with badge state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::models::{BadgeState, Notification, NotificationInput, NotificationSnapshot};
use crate::persistence::{StateStorage, StorageChange};

/// Configuration for the [`NotificationStore`].
#[derive(Debug, Clone)]
pub struct NotificationStoreConfig {
    /// Storage key holding the JSON array of notifications.
    pub storage_key: String,
    /// Maximum number of notifications kept, newest first.
    pub max_notifications: usize,
    /// How long after an arrival the badge shows a count instead of a dot.
    pub count_badge_window: Duration,
}

impl Default for NotificationStoreConfig {
    fn default() -> Self {
        Self {
            storage_key: "notifications".to_string(),
            max_notifications: 50,
            count_badge_window: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
struct StoreState {
    notifications: Vec<Notification>,
    badge_state: BadgeState,
    last_arrival: Option<Instant>,
    /// Bumped on every arrival; decay timers only act on their own generation.
    generation: u64,
    persistence_healthy: bool,
}

impl StoreState {
    fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Dot or nothing, ignoring any recent arrival.
    fn settled_badge(&self) -> BadgeState {
        if self.unread_count() > 0 {
            BadgeState::Dot
        } else {
            BadgeState::None
        }
    }

    /// Count while inside the arrival window, otherwise the settled badge.
    fn badge_at(&self, now: Instant, window: Duration) -> BadgeState {
        let recent = self
            .last_arrival
            .is_some_and(|arrival| now.duration_since(arrival) < window);
        if recent && self.unread_count() > 0 {
            BadgeState::Count
        } else {
            self.settled_badge()
        }
    }

    fn snapshot(&self) -> NotificationSnapshot {
        NotificationSnapshot {
            notifications: self.notifications.clone(),
            unread_count: self.unread_count(),
            badge_state: self.badge_state,
            persistence_healthy: self.persistence_healthy,
        }
    }
}

struct Inner {
    config: NotificationStoreConfig,
    storage: Arc<dyn StateStorage>,
    state: Mutex<StoreState>,
    snapshot_tx: watch::Sender<NotificationSnapshot>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the log from storage. Anything unreadable counts as an empty log.
    fn load(&self) -> Vec<Notification> {
        let raw = match self.storage.get(&self.config.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!("Failed to read notifications from storage: {}", err);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Notification>>(&raw) {
            Ok(mut notifications) => {
                notifications.truncate(self.config.max_notifications);
                notifications
            }
            Err(err) => {
                warn!("Discarding malformed persisted notifications: {}", err);
                Vec::new()
            }
        }
    }

    fn persist(&self, state: &mut StoreState) {
        let result = serde_json::to_string(&state.notifications)
            .map_err(|err| err.to_string())
            .and_then(|json| {
                self.storage
                    .set(&self.config.storage_key, &json)
                    .map_err(|err| err.to_string())
            });
        match result {
            Ok(()) => state.persistence_healthy = true,
            Err(err) => {
                error!("Failed to persist notifications, keeping in memory only: {}", err);
                state.persistence_healthy = false;
            }
        }
    }

    fn publish(&self, state: &StoreState) {
        self.snapshot_tx.send_replace(state.snapshot());
    }

    /// Apply `f` to the state, then persist and publish.
    fn mutate<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.persist(&mut state);
        self.publish(&state);
        result
    }

    fn decay(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Ignoring stale badge timer (generation {})", generation);
            return;
        }
        state.badge_state = state.settled_badge();
        self.publish(&state);
    }

    /// The read happens under the state lock so no local mutation can land
    /// between reading the log and replacing the in-memory copy.
    fn reload(&self) {
        let mut state = self.lock();
        state.notifications = self.load();
        state.badge_state = state.badge_at(Instant::now(), self.config.count_badge_window);
        debug!(
            "Reloaded {} notifications from storage",
            state.notifications.len()
        );
        self.publish(&state);
    }
}

/// The notification store.
///
/// Cloning gives another handle to the same store. All mutations run to
/// completion under one lock and are persisted before subscribers are told.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<Inner>,
}

impl NotificationStore {
    /// Create a store and rehydrate it from `storage`.
    ///
    /// When called inside a Tokio runtime this also starts listening for
    /// changes made by other instances sharing the storage.
    pub fn new(config: NotificationStoreConfig, storage: Arc<dyn StateStorage>) -> Self {
        let changes = storage.subscribe();
        let (snapshot_tx, _) = watch::channel(NotificationSnapshot::default());
        let inner = Arc::new(Inner {
            config,
            storage,
            state: Mutex::new(StoreState {
                notifications: Vec::new(),
                badge_state: BadgeState::None,
                last_arrival: None,
                generation: 0,
                persistence_healthy: true,
            }),
            snapshot_tx,
        });

        {
            let notifications = inner.load();
            let mut state = inner.lock();
            state.notifications = notifications;
            state.badge_state = state.settled_badge();
            info!(
                "Loaded {} notifications ({} unread)",
                state.notifications.len(),
                state.unread_count()
            );
            inner.publish(&state);
        }

        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(run_sync(Arc::downgrade(&inner), changes));
            }
            Err(_) => debug!("No async runtime, cross-instance sync disabled"),
        }

        Self { inner }
    }

    /// Add a notification and return its id.
    pub fn add(&self, input: NotificationInput) -> String {
        let now = Instant::now();
        let notification = input.into_notification(chrono::Utc::now().timestamp_millis());
        let id = notification.id.clone();
        let max = self.inner.config.max_notifications;

        let generation = self.inner.mutate(|state| {
            state.notifications.insert(0, notification);
            if state.notifications.len() > max {
                debug!(
                    "Evicting {} notifications over the cap",
                    state.notifications.len() - max
                );
                state.notifications.truncate(max);
            }
            state.last_arrival = Some(now);
            state.generation += 1;
            state.badge_state = if state.unread_count() > 0 {
                BadgeState::Count
            } else {
                state.settled_badge()
            };
            state.generation
        });

        self.schedule_decay(generation, now + self.inner.config.count_badge_window);
        debug!("Added notification {}", id);
        id
    }

    fn schedule_decay(&self, generation: u64, deadline: Instant) {
        let Ok(handle) = Handle::try_current() else {
            debug!("No async runtime, badge decay timer not scheduled");
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.decay(generation);
            }
        });
    }

    /// Mark one notification as read. Returns false if no such notification.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let mut state = self.inner.lock();
        let Some(notification) = state.notifications.iter_mut().find(|n| n.id == id) else {
            debug!("mark_as_read: unknown notification {}", id);
            return false;
        };
        notification.read = true;
        state.badge_state = state.settled_badge();
        self.inner.persist(&mut state);
        self.inner.publish(&state);
        true
    }

    pub fn mark_all_as_read(&self) {
        self.inner.mutate(|state| {
            for notification in state.notifications.iter_mut() {
                notification.read = true;
            }
            state.badge_state = BadgeState::None;
        });
    }

    /// Remove one notification. Returns false if no such notification.
    pub fn remove(&self, id: &str) -> bool {
        let window = self.inner.config.count_badge_window;
        let mut state = self.inner.lock();
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        if state.notifications.len() == before {
            debug!("remove: unknown notification {}", id);
            return false;
        }
        state.badge_state = state.badge_at(Instant::now(), window);
        self.inner.persist(&mut state);
        self.inner.publish(&state);
        true
    }

    pub fn clear_all(&self) {
        self.inner.mutate(|state| {
            state.notifications.clear();
            state.badge_state = BadgeState::None;
        });
    }

    /// Replace the in-memory log with what is currently persisted.
    pub fn reload_from_storage(&self) {
        self.inner.reload();
    }

    /// Subscribe to state changes. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.lock().unread_count()
    }

    pub fn badge_state(&self) -> BadgeState {
        self.inner.lock().badge_state
    }

    pub fn config(&self) -> &NotificationStoreConfig {
        &self.inner.config
    }
}

async fn run_sync(inner: Weak<Inner>, mut changes: broadcast::Receiver<StorageChange>) {
    loop {
        let should_reload = match changes.recv().await {
            Ok(change) => match inner.upgrade() {
                Some(inner) => change.key == inner.config.storage_key,
                None => break,
            },
            Err(RecvError::Lagged(skipped)) => {
                debug!("Missed {} storage changes, reloading", skipped);
                true
            }
            Err(RecvError::Closed) => break,
        };
        if !should_reload {
            continue;
        }
        match inner.upgrade() {
            Some(inner) => inner.reload(),
            None => break,
        }
    }
    debug!("Notification sync stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{NotificationIcon, NotificationType};
    use crate::persistence::MemoryStorageHub;
    use tokio::time::sleep;

    fn input(title: &str) -> NotificationInput {
        NotificationInput::new(NotificationType::System, title, "message")
    }

    fn store_on(hub: &MemoryStorageHub) -> NotificationStore {
        NotificationStore::new(NotificationStoreConfig::default(), Arc::new(hub.handle()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_prepends_and_persists() {
        let hub = MemoryStorageHub::new();
        let store = store_on(&hub);

        let first = store.add(input("first"));
        let second = store.add(input("second").urgent(true).icon(NotificationIcon::Warning));

        let notifications = store.notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].id, second);
        assert_eq!(notifications[1].id, first);
        assert!(notifications[0].urgent);
        assert!(!notifications[0].read);
        assert_eq!(store.unread_count(), 2);

        let persisted: Vec<Notification> =
            serde_json::from_str(&hub.read_raw("notifications").unwrap()).unwrap();
        assert_eq!(persisted, notifications);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_evicts_oldest() {
        let hub = MemoryStorageHub::new();
        let store = store_on(&hub);

        let ids: Vec<String> = (0..51)
            .map(|i| store.add(input(&format!("notification {}", i))))
            .collect();

        let notifications = store.notifications();
        assert_eq!(notifications.len(), 50);
        assert!(notifications.iter().all(|n| n.id != ids[0]));
        assert_eq!(notifications[0].id, ids[50]);
        assert_eq!(notifications[49].id, ids[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cap_ignores_read_state() {
        let hub = MemoryStorageHub::new();
        let config = NotificationStoreConfig {
            max_notifications: 2,
            ..Default::default()
        };
        let store = NotificationStore::new(config, Arc::new(hub.handle()));

        let oldest = store.add(input("a"));
        store.add(input("b"));
        store.mark_as_read(&store.notifications()[0].id.clone());
        store.add(input("c"));

        let titles: Vec<String> = store.notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["c", "b"]);
        assert!(store.notifications().iter().all(|n| n.id != oldest));
    }

    #[tokio::test(start_paused = true)]
    async fn test_badge_decays_from_count_to_dot() {
        let store = store_on(&MemoryStorageHub::new());

        store.add(input("a"));
        assert_eq!(store.badge_state(), BadgeState::Count);

        sleep(Duration::from_secs(9)).await;
        assert_eq!(store.badge_state(), BadgeState::Count);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(store.badge_state(), BadgeState::Dot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_demote_newer_arrival() {
        let store = store_on(&MemoryStorageHub::new());

        store.add(input("a"));
        sleep(Duration::from_secs(6)).await;
        store.add(input("b"));

        // First timer fires at 10s but a newer arrival reset the window
        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.badge_state(), BadgeState::Count);

        sleep(Duration::from_secs(6)).await;
        assert_eq!(store.badge_state(), BadgeState::Dot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_as_read_inside_window_shows_dot() {
        let store = store_on(&MemoryStorageHub::new());

        store.add(input("older"));
        let id = store.add(input("newer"));
        sleep(Duration::from_secs(1)).await;

        assert!(store.mark_as_read(&id));
        assert_eq!(store.badge_state(), BadgeState::Dot);
        assert_eq!(store.unread_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_last_unread_as_read_hides_badge() {
        let store = store_on(&MemoryStorageHub::new());
        let id = store.add(input("only"));

        assert!(store.mark_as_read(&id));
        assert_eq!(store.badge_state(), BadgeState::None);

        // The pending decay timer keeps it hidden
        sleep(Duration::from_secs(11)).await;
        assert_eq!(store.badge_state(), BadgeState::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_as_read_unknown_id() {
        let store = store_on(&MemoryStorageHub::new());
        store.add(input("a"));
        assert!(!store.mark_as_read("missing"));
        assert_eq!(store.badge_state(), BadgeState::Count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_all_as_read() {
        let store = store_on(&MemoryStorageHub::new());
        store.add(input("a"));
        store.add(input("b"));

        store.mark_all_as_read();

        assert_eq!(store.unread_count(), 0);
        assert_eq!(store.badge_state(), BadgeState::None);
        assert!(store.notifications().iter().all(|n| n.read));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_inside_window_keeps_count() {
        let store = store_on(&MemoryStorageHub::new());
        let first = store.add(input("a"));
        store.add(input("b"));
        sleep(Duration::from_secs(1)).await;

        assert!(store.remove(&first));
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.badge_state(), BadgeState::Count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_outside_window_shows_dot() {
        let store = store_on(&MemoryStorageHub::new());
        let first = store.add(input("a"));
        store.add(input("b"));
        sleep(Duration::from_secs(11)).await;

        assert!(store.remove(&first));
        assert_eq!(store.badge_state(), BadgeState::Dot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_last_unread_hides_badge() {
        let store = store_on(&MemoryStorageHub::new());
        let id = store.add(input("a"));

        assert!(store.remove(&id));
        assert_eq!(store.badge_state(), BadgeState::None);
        assert!(!store.remove(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all() {
        let hub = MemoryStorageHub::new();
        let store = store_on(&hub);
        store.add(input("a"));

        store.clear_all();

        assert!(store.notifications().is_empty());
        assert_eq!(store.badge_state(), BadgeState::None);
        assert_eq!(hub.read_raw("notifications"), Some("[]".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rehydrates_from_storage() {
        let hub = MemoryStorageHub::new();
        let id = {
            let store = store_on(&hub);
            store.add(input("persisted"))
        };

        let store = store_on(&hub);
        let notifications = store.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].id, id);
        // No arrival in this instance yet
        assert_eq!(store.badge_state(), BadgeState::Dot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_storage_loads_empty() {
        let hub = MemoryStorageHub::new();
        hub.write_external("notifications", "{not json").unwrap();

        let store = store_on(&hub);

        assert!(store.notifications().is_empty());
        assert_eq!(store.badge_state(), BadgeState::None);
        // The store keeps working and overwrites the corrupted value
        store.add(input("a"));
        assert!(hub.read_raw("notifications").unwrap().starts_with('['));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_keeps_in_memory_state() {
        let hub = MemoryStorageHub::new();
        hub.set_quota(Some(10));
        let store = store_on(&hub);

        let id = store.add(input("too big to persist"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.notifications[0].id, id);
        assert!(!snapshot.persistence_healthy);
        assert_eq!(hub.read_raw("notifications"), None);

        hub.set_quota(None);
        store.mark_as_read(&id);
        assert!(store.snapshot().persistence_healthy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_every_change() {
        let store = store_on(&MemoryStorageHub::new());
        let mut rx = store.subscribe();

        store.add(input("a"));
        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.unread_count, 1);
        assert_eq!(snapshot.badge_state, BadgeState::Count);

        sleep(Duration::from_secs(11)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().badge_state, BadgeState::Dot);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_instance_reloads_on_change() {
        let hub = MemoryStorageHub::new();
        let tab_a = store_on(&hub);
        let tab_b = store_on(&hub);

        let id = tab_a.add(input("from a"));
        sleep(Duration::from_millis(1)).await;

        let seen_by_b = tab_b.notifications();
        assert_eq!(seen_by_b.len(), 1);
        assert_eq!(seen_by_b[0].id, id);
        assert_eq!(tab_b.unread_count(), 1);
        assert_eq!(tab_b.badge_state(), BadgeState::Dot);

        tab_b.mark_all_as_read();
        sleep(Duration::from_millis(1)).await;
        assert_eq!(tab_a.unread_count(), 0);
        assert_eq!(tab_a.notifications()[0].id, id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupted_external_write_empties_other_instances() {
        let hub = MemoryStorageHub::new();
        let store = store_on(&hub);
        store.add(input("a"));

        hub.write_external("notifications", "garbage").unwrap();
        sleep(Duration::from_millis(1)).await;

        assert!(store.notifications().is_empty());
        assert_eq!(store.badge_state(), BadgeState::None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrelated_key_change_is_ignored() {
        let hub = MemoryStorageHub::new();
        let store = store_on(&hub);
        store.add(input("a"));
        let rx = store.subscribe();

        hub.write_external("client_id", "abc").unwrap();
        sleep(Duration::from_millis(1)).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(store.notifications().len(), 1);
    }

    #[test]
    fn test_works_without_runtime() {
        let store = store_on(&MemoryStorageHub::new());
        let id = store.add(input("a"));
        assert_eq!(store.badge_state(), BadgeState::Count);
        assert!(store.mark_as_read(&id));
        assert_eq!(store.badge_state(), BadgeState::None);
    }

    /// Storage that, once armed, lets another thread add a notification
    /// right after the store has read the log.
    struct AddAfterReadStorage {
        inner: crate::persistence::MemoryStorage,
        store: std::sync::OnceLock<NotificationStore>,
        armed: std::sync::atomic::AtomicBool,
        writer: Mutex<Option<std::thread::JoinHandle<String>>>,
    }

    impl StateStorage for AddAfterReadStorage {
        fn get(&self, key: &str) -> Result<Option<String>, crate::persistence::StorageError> {
            let value = self.inner.get(key);
            if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
                let store = self.store.get().unwrap().clone();
                let (done_tx, done_rx) = std::sync::mpsc::channel();
                let writer = std::thread::spawn(move || {
                    let id = store.add(input("concurrent"));
                    let _ = done_tx.send(());
                    id
                });
                // Blocks on the store lock unless the reader released it.
                let _ = done_rx.recv_timeout(Duration::from_millis(200));
                *self.writer.lock().unwrap() = Some(writer);
            }
            value
        }

        fn set(&self, key: &str, value: &str) -> Result<(), crate::persistence::StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), crate::persistence::StorageError> {
            self.inner.remove(key)
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
            self.inner.subscribe()
        }
    }

    #[test]
    fn test_add_during_reload_is_not_lost() {
        let hub = MemoryStorageHub::new();
        let storage = Arc::new(AddAfterReadStorage {
            inner: hub.handle(),
            store: std::sync::OnceLock::new(),
            armed: std::sync::atomic::AtomicBool::new(false),
            writer: Mutex::new(None),
        });
        let store = NotificationStore::new(NotificationStoreConfig::default(), storage.clone());
        let _ = storage.store.set(store.clone());
        let before = store.add(input("before"));

        storage.armed.store(true, std::sync::atomic::Ordering::SeqCst);
        store.reload_from_storage();
        let concurrent = storage
            .writer
            .lock()
            .unwrap()
            .take()
            .unwrap()
            .join()
            .unwrap();

        let ids: Vec<String> = store.notifications().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![concurrent.clone(), before.clone()]);

        store.add(input("later"));
        let persisted: Vec<Notification> =
            serde_json::from_str(&hub.read_raw("notifications").unwrap()).unwrap();
        assert_eq!(persisted.len(), 3);
        assert!(persisted.iter().any(|n| n.id == concurrent));
        assert!(persisted.iter().any(|n| n.id == before));
    }

    #[test]
    fn test_zero_cap_never_shows_count() {
        let hub = MemoryStorageHub::new();
        let config = NotificationStoreConfig {
            max_notifications: 0,
            ..Default::default()
        };
        let store = NotificationStore::new(config, Arc::new(hub.handle()));

        store.add(input("evicted at once"));

        assert!(store.notifications().is_empty());
        assert_eq!(store.unread_count(), 0);
        assert_eq!(store.badge_state(), BadgeState::None);
    }

    #[cfg(feature = "mock")]
    #[tokio::test(start_paused = true)]
    async fn test_backend_errors_keep_store_usable() {
        use crate::persistence::{MockStateStorage, StorageError};

        let mut storage = MockStateStorage::new();
        let (changes_tx, _) = broadcast::channel(1);
        storage
            .expect_subscribe()
            .returning(move || changes_tx.subscribe());
        storage
            .expect_get()
            .returning(|_| Err(StorageError::Backend("disk gone".to_string())));
        storage
            .expect_set()
            .times(1)
            .returning(|_, _| Err(StorageError::Backend("disk gone".to_string())));

        let store = NotificationStore::new(NotificationStoreConfig::default(), Arc::new(storage));
        assert!(store.notifications().is_empty());

        store.add(input("kept in memory"));
        assert_eq!(store.notifications().len(), 1);
        assert!(!store.snapshot().persistence_healthy);
    }
}
