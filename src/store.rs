//! The notification store: single writer over the ordered list of active toasts.
//!
//! Every mutation goes through [`ToastStore`]. The list lives in a
//! [`tokio::sync::watch`] channel so render surfaces read consistent snapshots
//! and are woken on change. Timers (auto-expiry and deferred capacity
//! eviction) are spawned on the tokio runtime and hold only a weak reference
//! to the store; a timer whose target is gone does nothing.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace, warn};

use crate::config::ProviderConfig;
use crate::toast::{Toast, ToastDraft, ToastId, ToastPatch};
use crate::types::Position;

/// Cloneable handle to one store. Clones share the same list.
#[derive(Clone)]
pub struct ToastStore {
    shared: Arc<Shared>,
}

struct Shared {
    config: ProviderConfig,
    toasts: watch::Sender<Vec<Toast>>,
    runtime: Option<Handle>,
}

#[derive(Debug)]
enum Timer {
    Expire { id: ToastId, epoch: u64 },
    Trim(Position),
}

impl ToastStore {
    /// Creates an empty store. Timers run on the runtime current at creation,
    /// or on the one current when they are scheduled.
    pub fn new(config: ProviderConfig) -> Self {
        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            debug!("toast store created outside a tokio runtime");
        }
        let (toasts, _) = watch::channel(Vec::new());
        Self {
            shared: Arc::new(Shared {
                config,
                toasts,
                runtime,
            }),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.shared.config
    }

    /// Inserts a toast and returns its id.
    ///
    /// Overflowing the position bucket schedules eviction of its oldest
    /// entries after `eviction_delay`, so the new toast is painted first.
    /// A positive duration without a progress bar schedules removal after
    /// exactly that duration.
    pub fn add(&self, draft: ToastDraft) -> ToastId {
        let toast = self.materialize(draft);
        let id = toast.id.clone();
        let position = toast.position;
        let expiry = toast.expires_on_timer().then_some(toast.duration);
        let max = self.shared.config.max_toasts;

        let mut overflow = false;
        self.shared.toasts.send_modify(|toasts| {
            overflow = bucket_len(toasts, position) >= max;
            toasts.push(toast);
        });
        debug!(toast_id = %id, %position, overflow, "toast added");

        if overflow {
            self.schedule(self.shared.config.eviction_delay, Timer::Trim(position));
        }
        if let Some(duration) = expiry {
            self.schedule(duration, Timer::Expire {
                id: id.clone(),
                epoch: 0,
            });
        }
        id
    }

    /// Removes a toast. Absent ids are ignored; a dismissal may race its timer.
    pub fn remove(&self, id: &ToastId) -> Option<Toast> {
        let mut removed = None;
        self.shared.toasts.send_if_modified(|toasts| {
            let Some(index) = toasts.iter().position(|t| &t.id == id) else {
                return false;
            };
            removed = Some(toasts.remove(index));
            true
        });
        match &removed {
            Some(_) => debug!(toast_id = %id, "toast removed"),
            None => trace!(toast_id = %id, "remove ignored, toast not present"),
        }
        removed
    }

    /// Merges `patch` into the toast with `id`. Returns `false` when absent.
    ///
    /// A patch that sets `duration` or `show_progress` restarts expiry from
    /// now: the previous timer is invalidated and, if the toast still expires
    /// on a timer, a new one is scheduled for the new duration.
    pub fn update(&self, id: &ToastId, patch: ToastPatch) -> bool {
        let reschedule = patch.touches_expiry();
        let max = self.shared.config.max_toasts;
        let mut outcome = None;

        self.shared.toasts.send_if_modified(|toasts| {
            let Some(toast) = toasts.iter_mut().find(|t| &t.id == id) else {
                return false;
            };
            let from = toast.position;
            patch.apply(toast);
            if reschedule {
                toast.timer_epoch += 1;
                toast.armed_at = Instant::now();
            }
            let position = toast.position;
            let epoch = toast.timer_epoch;
            let expiry = toast.expires_on_timer().then_some(toast.duration);
            let overflow = position != from && bucket_len(toasts, position) > max;
            outcome = Some((epoch, expiry, position, overflow));
            true
        });

        let Some((epoch, expiry, position, overflow)) = outcome else {
            trace!(toast_id = %id, "update ignored, toast not present");
            return false;
        };
        debug!(toast_id = %id, reschedule, "toast updated");

        if overflow {
            self.schedule(self.shared.config.eviction_delay, Timer::Trim(position));
        }
        if reschedule {
            if let Some(duration) = expiry {
                self.schedule(duration, Timer::Expire {
                    id: id.clone(),
                    epoch,
                });
            }
        }
        true
    }

    /// Empties the list. Pending timers find nothing to act on.
    pub fn clear(&self) {
        let mut cleared = 0;
        self.shared.toasts.send_if_modified(|toasts| {
            cleared = toasts.len();
            toasts.clear();
            cleared > 0
        });
        debug!(cleared, "toasts cleared");
    }

    pub fn get(&self, id: &ToastId) -> Option<Toast> {
        self.shared
            .toasts
            .borrow()
            .iter()
            .find(|t| &t.id == id)
            .cloned()
    }

    pub fn contains(&self, id: &ToastId) -> bool {
        self.shared.toasts.borrow().iter().any(|t| &t.id == id)
    }

    /// Copy of the list in insertion order.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.shared.toasts.borrow().clone()
    }

    /// Toasts of one bucket, in insertion order.
    pub fn bucket(&self, position: Position) -> Vec<Toast> {
        self.shared
            .toasts
            .borrow()
            .iter()
            .filter(|t| t.position == position)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shared.toasts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.toasts.borrow().is_empty()
    }

    /// Receiver woken on every change of the list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Toast>> {
        self.shared.toasts.subscribe()
    }

    /// Whether both handles refer to the same store.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn downgrade(&self) -> WeakStore {
        WeakStore(Arc::downgrade(&self.shared))
    }

    pub(crate) fn runtime(&self) -> Option<Handle> {
        self.shared
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok())
    }

    fn materialize(&self, draft: ToastDraft) -> Toast {
        let config = &self.shared.config;
        Toast {
            id: ToastId::generate(),
            message: draft.message,
            kind: draft.kind,
            duration: draft.duration,
            position: draft.position.unwrap_or(config.default_position),
            theme: draft.theme.or(config.default_theme),
            sound: draft.sound,
            dismissible: draft.dismissible.unwrap_or(true),
            swipeable: draft.swipeable.unwrap_or(true),
            show_progress: draft.show_progress.unwrap_or(false),
            actions: draft.actions,
            rich_content: draft.rich_content.unwrap_or(false),
            icon: draft.icon,
            class_name: draft.class_name,
            on_open: draft.on_open,
            on_close: draft.on_close,
            created_at: Utc::now(),
            timer_epoch: 0,
            armed_at: Instant::now(),
        }
    }

    fn schedule(&self, delay: Duration, timer: Timer) {
        let Some(runtime) = self.runtime() else {
            warn!(?timer, "no tokio runtime available, timer dropped");
            return;
        };
        let deadline = Instant::now() + delay;
        let store = self.downgrade();
        runtime.spawn(async move {
            sleep_until(deadline).await;
            match store.upgrade() {
                Some(store) => store.fire(timer),
                None => trace!(?timer, "timer fired after store teardown"),
            }
        });
    }

    fn fire(&self, timer: Timer) {
        match timer {
            Timer::Expire { id, epoch } => {
                let expired = self.shared.toasts.send_if_modified(|toasts| {
                    let Some(index) = toasts
                        .iter()
                        .position(|t| t.id == id && t.timer_epoch == epoch)
                    else {
                        return false;
                    };
                    toasts.remove(index);
                    true
                });
                if expired {
                    debug!(toast_id = %id, "toast expired");
                } else {
                    trace!(toast_id = %id, epoch, "stale expiry timer");
                }
            }
            Timer::Trim(position) => {
                let max = self.shared.config.max_toasts;
                let mut evicted = Vec::new();
                self.shared.toasts.send_if_modified(|toasts| {
                    let mut excess = bucket_len(toasts, position).saturating_sub(max);
                    if excess == 0 {
                        return false;
                    }
                    toasts.retain(|t| {
                        if excess > 0 && t.position == position {
                            excess -= 1;
                            evicted.push(t.id.clone());
                            false
                        } else {
                            true
                        }
                    });
                    true
                });
                for id in &evicted {
                    debug!(toast_id = %id, %position, "toast evicted, bucket over capacity");
                }
            }
        }
    }
}

impl fmt::Debug for ToastStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastStore")
            .field("config", &self.shared.config)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Non-owning store handle held by timers and progress trackers.
#[derive(Clone)]
pub(crate) struct WeakStore(Weak<Shared>);

impl WeakStore {
    pub(crate) fn upgrade(&self) -> Option<ToastStore> {
        self.0.upgrade().map(|shared| ToastStore { shared })
    }
}

fn bucket_len(toasts: &[Toast], position: Position) -> usize {
    toasts.iter().filter(|t| t.position == position).count()
}

#[cfg(test)]
mod tests {
    use super::ToastStore;
    use crate::config::ProviderConfig;
    use crate::toast::{ToastDraft, ToastId, ToastPatch};
    use crate::types::{Position, Theme, ToastKind};
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::time::sleep;

    fn draft(message: &str, millis: u64) -> ToastDraft {
        ToastDraft {
            message: message.to_string(),
            duration: Duration::from_millis(millis),
            ..ToastDraft::default()
        }
    }

    fn ids(store: &ToastStore) -> Vec<ToastId> {
        store.snapshot().into_iter().map(|t| t.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn add_issues_unique_ids() {
        let store = ToastStore::new(ProviderConfig::default().with_max_toasts(100));
        let issued: HashSet<ToastId> = (0..50).map(|i| store.add(draft(&i.to_string(), 0))).collect();
        assert_eq!(issued.len(), 50);
        assert!(issued.iter().all(|id| !id.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn add_applies_provider_defaults() {
        let config = ProviderConfig::default()
            .with_default_position(Position::BottomCenter)
            .with_default_theme(Some(Theme::Dark));
        let store = ToastStore::new(config);
        let id = store.add(draft("hello", 0));
        let toast = store.get(&id).unwrap();
        assert_eq!(toast.position, Position::BottomCenter);
        assert_eq!(toast.theme, Some(Theme::Dark));
        assert!(toast.dismissible);
        assert!(toast.swipeable);
        assert!(!toast.show_progress);
        assert!(!toast.rich_content);
        assert_eq!(toast.kind, ToastKind::Info);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_toast_never_expires() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(draft("sticky", 0));
        sleep(Duration::from_secs(3_600)).await;
        assert!(store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_toast_expires_after_duration() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(draft("brief", 1_000));
        sleep(Duration::from_millis(999)).await;
        assert!(store.contains(&id));
        sleep(Duration::from_millis(2)).await;
        assert!(!store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_toast_is_not_expired_by_the_store() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(ToastDraft {
            show_progress: Some(true),
            ..draft("bar", 1_000)
        });
        sleep(Duration::from_secs(5)).await;
        assert!(store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_evicts_oldest_of_same_bucket_after_delay() {
        let store = ToastStore::new(ProviderConfig::default().with_max_toasts(5));
        let other = store.add(ToastDraft {
            position: Some(Position::BottomLeft),
            ..draft("elsewhere", 0)
        });
        let inserted: Vec<ToastId> = (0..6).map(|i| store.add(draft(&i.to_string(), 0))).collect();

        assert_eq!(store.bucket(Position::TopRight).len(), 6);
        sleep(Duration::from_millis(60)).await;

        let survivors: Vec<ToastId> = store
            .bucket(Position::TopRight)
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(survivors, inserted[1..].to_vec());
        assert!(store.contains(&other));
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_skips_bucket_already_back_under_capacity() {
        let store = ToastStore::new(ProviderConfig::default().with_max_toasts(2));
        let a = store.add(draft("a", 0));
        let b = store.add(draft("b", 0));
        let c = store.add(draft("c", 0));
        store.remove(&c);
        sleep(Duration::from_millis(60)).await;
        assert_eq!(ids(&store), vec![a, b]);
    }

    #[tokio::test(start_paused = true)]
    async fn remove_twice_is_a_noop() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(draft("bye", 0));
        assert!(store.remove(&id).is_some());
        assert!(store.remove(&id).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_leaves_pending_timers_harmless() {
        let store = ToastStore::new(ProviderConfig::default().with_max_toasts(1));
        store.add(draft("one", 1_000));
        store.add(draft("two", 1_000));
        store.clear();
        assert!(store.is_empty());

        let later = store.add(draft("later", 0));
        sleep(Duration::from_secs(2)).await;
        assert_eq!(ids(&store), vec![later]);
    }

    #[tokio::test(start_paused = true)]
    async fn duration_update_reschedules_expiry() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(draft("working", 1_000));
        sleep(Duration::from_millis(500)).await;

        assert!(store.update(&id, ToastPatch {
            duration: Some(Duration::from_millis(5_000)),
            ..ToastPatch::default()
        }));

        sleep(Duration::from_millis(600)).await;
        assert!(store.contains(&id), "original timer must not fire");
        sleep(Duration::from_millis(4_401)).await;
        assert!(!store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn message_update_keeps_original_timer() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(draft("old", 1_000));
        sleep(Duration::from_millis(500)).await;
        assert!(store.update(&id, ToastPatch {
            message: Some("new".into()),
            ..ToastPatch::default()
        }));
        assert_eq!(store.get(&id).unwrap().message, "new");
        sleep(Duration::from_millis(501)).await;
        assert!(!store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn loading_toast_settles_and_then_expires() {
        let store = ToastStore::new(ProviderConfig::default());
        let id = store.add(ToastDraft {
            kind: ToastKind::Loading,
            ..draft("saving", 0)
        });
        sleep(Duration::from_secs(10)).await;
        store.update(
            &id,
            ToastPatch::settled(ToastKind::Success, "saved".into(), Duration::from_secs(4)),
        );
        let toast = store.get(&id).unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.duration, Duration::from_secs(4));
        sleep(Duration::from_millis(4_001)).await;
        assert!(!store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn update_of_absent_toast_is_ignored() {
        let store = ToastStore::new(ProviderConfig::default());
        assert!(!store.update(&ToastId::empty(), ToastPatch::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_changes() {
        let store = ToastStore::new(ProviderConfig::default());
        let mut rx = store.subscribe();
        let id = store.add(draft("watched", 0));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);
        store.remove(&id);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_inert_after_store_teardown() {
        let store = ToastStore::new(ProviderConfig::default());
        let mut rx = store.subscribe();
        store.add(draft("orphan", 100));
        rx.changed().await.unwrap();
        drop(store);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(rx.borrow().len(), 1);
    }
}
