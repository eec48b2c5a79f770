//! Headless render surface.
//!
//! A [`Toaster`] reads snapshots of one position bucket and turns them into a
//! [`ToasterFrame`] a host UI can paint. It never mutates the list itself:
//! clicks, close buttons, swipes, action buttons and finished progress bars
//! all go back through [`ToastStore`] operations.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::store::{ToastStore, WeakStore};
use crate::toast::{Toast, ToastId};
use crate::types::{Position, Theme};

const DEFAULT_GUTTER: u32 = 8;

/// Fields laid over every toast rendered by one toaster. Display only; the
/// stored record is untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToastOverlay {
    pub theme: Option<Theme>,
    pub dismissible: Option<bool>,
    pub swipeable: Option<bool>,
    pub rich_content: Option<bool>,
    pub icon: Option<String>,
    pub class_name: Option<String>,
}

impl ToastOverlay {
    fn apply(&self, toast: &mut Toast) {
        if let Some(theme) = self.theme {
            toast.theme = Some(theme);
        }
        if let Some(dismissible) = self.dismissible {
            toast.dismissible = dismissible;
        }
        if let Some(swipeable) = self.swipeable {
            toast.swipeable = swipeable;
        }
        if let Some(rich_content) = self.rich_content {
            toast.rich_content = rich_content;
        }
        if let Some(icon) = &self.icon {
            toast.icon = Some(icon.clone());
        }
        if let Some(class_name) = &self.class_name {
            toast.class_name = Some(class_name.clone());
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToasterConfig {
    pub position: Position,
    /// Newest first instead of insertion order.
    pub reverse_order: bool,
    /// Spacing between toasts, in pixels.
    pub gutter: u32,
    pub container_class: String,
    pub container_style: BTreeMap<String, String>,
    pub toast_options: ToastOverlay,
}

impl ToasterConfig {
    pub fn at(position: Position) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reverse_order = true;
        self
    }
}

impl Default for ToasterConfig {
    fn default() -> Self {
        Self {
            position: Position::default(),
            reverse_order: false,
            gutter: DEFAULT_GUTTER,
            container_class: String::new(),
            container_style: BTreeMap::new(),
            toast_options: ToastOverlay::default(),
        }
    }
}

/// One toast ready to paint.
#[derive(Clone, Debug, Serialize)]
pub struct ToastView {
    pub toast: Toast,
    /// Whether a close button is shown.
    pub closable: bool,
    /// Remaining share of the progress bar, from 1.0 down to 0.0.
    pub progress: Option<f32>,
}

/// Everything a host needs to paint one bucket.
#[derive(Clone, Debug, Serialize)]
pub struct ToasterFrame {
    pub position: Position,
    pub gutter: u32,
    pub container_class: String,
    pub container_style: BTreeMap<String, String>,
    pub items: Vec<ToastView>,
}

struct Mounted {
    /// Expiry epoch the tracker was started for.
    epoch: u64,
    progress: Option<JoinHandle<()>>,
}

/// Render surface for a single position bucket.
pub struct Toaster {
    store: ToastStore,
    config: ToasterConfig,
    updates: watch::Receiver<Vec<Toast>>,
    mounted: HashMap<ToastId, Mounted>,
}

impl Toaster {
    pub fn new(store: ToastStore, config: ToasterConfig) -> Self {
        let updates = store.subscribe();
        Self {
            store,
            config,
            updates,
            mounted: HashMap::new(),
        }
    }

    pub const fn config(&self) -> &ToasterConfig {
        &self.config
    }

    /// Waits until the list changes. Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.updates.changed().await.is_ok()
    }

    /// Builds the frame for the current snapshot.
    ///
    /// Toasts seen for the first time get their `on_open` hook called. A toast
    /// showing a progress bar gets a tracker that removes it once the bar runs
    /// out; the tracker is restarted whenever the store reschedules the
    /// toast's expiry, e.g. when a loading toast settles.
    pub fn layout(&mut self) -> ToasterFrame {
        let mut bucket: Vec<Toast> = self
            .updates
            .borrow_and_update()
            .iter()
            .filter(|t| t.position == self.config.position)
            .cloned()
            .collect();
        if self.config.reverse_order {
            bucket.reverse();
        }

        self.mounted.retain(|id, mounted| {
            let alive = bucket.iter().any(|t| &t.id == id);
            if !alive {
                if let Some(handle) = mounted.progress.take() {
                    handle.abort();
                }
            }
            alive
        });

        let now = Instant::now();
        let mut items = Vec::with_capacity(bucket.len());
        for mut toast in bucket {
            self.track(&toast);
            let progress = remaining_fraction(&toast, now.duration_since(toast.armed_at));
            self.config.toast_options.apply(&mut toast);
            items.push(ToastView {
                closable: toast.can_dismiss(),
                progress,
                toast,
            });
        }

        ToasterFrame {
            position: self.config.position,
            gutter: self.config.gutter,
            container_class: self.config.container_class.clone(),
            container_style: self.config.container_style.clone(),
            items,
        }
    }

    /// Click on the toast body. Loading and non-dismissible toasts ignore it.
    pub fn click(&self, id: &ToastId) -> bool {
        self.close(id)
    }

    /// Close button.
    pub fn close(&self, id: &ToastId) -> bool {
        match self.displayed(id) {
            Some(toast) if toast.can_dismiss() => self.dismiss(id),
            _ => false,
        }
    }

    /// Completed swipe gesture.
    pub fn swipe(&self, id: &ToastId) -> bool {
        match self.displayed(id) {
            Some(toast) if toast.swipeable && toast.can_dismiss() => self.dismiss(id),
            _ => false,
        }
    }

    /// Runs the callback of action `index`, then dismisses the toast.
    pub fn invoke_action(&self, id: &ToastId, index: usize) -> bool {
        let Some(action) = self
            .store
            .get(id)
            .and_then(|toast| toast.actions.get(index).cloned())
        else {
            return false;
        };
        debug!(toast_id = %id, label = %action.label, "toast action invoked");
        (action.on_click)();
        self.dismiss(id)
    }

    fn displayed(&self, id: &ToastId) -> Option<Toast> {
        let mut toast = self.store.get(id)?;
        self.config.toast_options.apply(&mut toast);
        Some(toast)
    }

    fn dismiss(&self, id: &ToastId) -> bool {
        let Some(toast) = self.store.remove(id) else {
            return false;
        };
        if let Some(on_close) = &toast.on_close {
            on_close();
        }
        true
    }

    /// Mounts a toast seen for the first time, or restarts its progress
    /// tracker when its expiry epoch moved since the last frame.
    fn track(&mut self, toast: &Toast) {
        match self.mounted.get_mut(&toast.id) {
            Some(mounted) if mounted.epoch == toast.timer_epoch => return,
            Some(mounted) => {
                if let Some(handle) = mounted.progress.take() {
                    handle.abort();
                }
                trace!(toast_id = %toast.id, epoch = toast.timer_epoch, "toast expiry rearmed");
            }
            None => {
                if let Some(on_open) = &toast.on_open {
                    on_open();
                }
            }
        }
        let progress = (toast.show_progress && !toast.is_persistent())
            .then(|| self.spawn_progress(toast.id.clone()))
            .flatten();
        self.mounted.insert(toast.id.clone(), Mounted {
            epoch: toast.timer_epoch,
            progress,
        });
    }

    fn spawn_progress(&self, id: ToastId) -> Option<JoinHandle<()>> {
        let runtime = self.store.runtime()?;
        let tick = self.store.config().progress_tick;
        let store = self.store.downgrade();
        Some(runtime.spawn(track_progress(store, id, tick)))
    }
}

impl Drop for Toaster {
    fn drop(&mut self) {
        for mounted in self.mounted.values_mut() {
            if let Some(handle) = mounted.progress.take() {
                handle.abort();
            }
        }
    }
}

fn remaining_fraction(toast: &Toast, elapsed: Duration) -> Option<f32> {
    if !toast.show_progress || toast.is_persistent() {
        return None;
    }
    let spent = elapsed.as_secs_f32() / toast.duration.as_secs_f32();
    Some((1.0 - spent).clamp(0.0, 1.0))
}

/// Ticks until the bar of `id` runs out, then removes the toast. The bar is
/// measured from the live record's expiry window. Stops early when the toast
/// is gone or no longer shows a progress bar.
async fn track_progress(store: WeakStore, id: ToastId, tick: Duration) {
    let mut ticker = interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(store) = store.upgrade() else {
            return;
        };
        let Some(toast) = store.get(&id) else {
            trace!(toast_id = %id, "progress tracker stopped, toast gone");
            return;
        };
        if !toast.show_progress || toast.is_persistent() {
            return;
        }
        if toast.armed_at.elapsed() >= toast.duration {
            debug!(toast_id = %id, "progress bar finished");
            store.remove(&id);
            return;
        }
    }
}
