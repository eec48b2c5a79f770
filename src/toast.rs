//! The notification record and the partial shapes used to create and patch it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::sound::SoundChoice;
use crate::types::{ActionStyle, Position, Theme, ToastKind};

/// Hook attached to a toast (action button, open/close callbacks).
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Opaque identifier of a toast. The empty id is returned by triggers that
/// could not reach a store.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToastId(String);

impl ToastId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub const fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Serialize)]
pub struct ToastAction {
    pub label: String,
    pub style: ActionStyle,
    #[serde(skip)]
    pub on_click: Callback,
}

impl ToastAction {
    pub fn new(label: impl Into<String>, on_click: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            style: ActionStyle::default(),
            on_click: Arc::new(on_click),
        }
    }

    #[must_use]
    pub const fn with_style(mut self, style: ActionStyle) -> Self {
        self.style = style;
        self
    }
}

impl fmt::Debug for ToastAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastAction")
            .field("label", &self.label)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

/// One active notification as held by the store.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub position: Position,
    pub theme: Option<Theme>,
    pub sound: Option<SoundChoice>,
    pub dismissible: bool,
    pub swipeable: bool,
    pub show_progress: bool,
    pub actions: Vec<ToastAction>,
    pub rich_content: bool,
    pub icon: Option<String>,
    pub class_name: Option<String>,
    #[serde(skip)]
    pub on_open: Option<Callback>,
    #[serde(skip)]
    pub on_close: Option<Callback>,
    pub created_at: DateTime<Utc>,
    /// Bumped whenever expiry is rescheduled; stale timers compare against it.
    #[serde(skip)]
    pub(crate) timer_epoch: u64,
    /// Start of the current expiry window; reset whenever expiry is rescheduled.
    #[serde(skip)]
    pub(crate) armed_at: Instant,
}

impl Toast {
    /// Zero duration means the toast stays until removed explicitly.
    pub fn is_persistent(&self) -> bool {
        self.duration.is_zero()
    }

    /// Whether the store owns expiry, as opposed to a progress bar.
    pub fn expires_on_timer(&self) -> bool {
        !self.is_persistent() && !self.show_progress
    }

    /// Manual close is allowed. Loading toasts never show a close affordance.
    pub fn can_dismiss(&self) -> bool {
        self.dismissible && self.kind != ToastKind::Loading
    }
}

impl fmt::Debug for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toast")
            .field("id", &self.id)
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("position", &self.position)
            .field("theme", &self.theme)
            .field("sound", &self.sound)
            .field("dismissible", &self.dismissible)
            .field("swipeable", &self.swipeable)
            .field("show_progress", &self.show_progress)
            .field("actions", &self.actions)
            .field("rich_content", &self.rich_content)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// A record without id and timestamp. Unset fields take the store defaults.
#[derive(Clone, Default)]
pub struct ToastDraft {
    pub message: String,
    pub kind: ToastKind,
    pub duration: Duration,
    pub position: Option<Position>,
    pub theme: Option<Theme>,
    pub sound: Option<SoundChoice>,
    pub dismissible: Option<bool>,
    pub swipeable: Option<bool>,
    pub show_progress: Option<bool>,
    pub actions: Vec<ToastAction>,
    pub rich_content: Option<bool>,
    pub icon: Option<String>,
    pub class_name: Option<String>,
    pub on_open: Option<Callback>,
    pub on_close: Option<Callback>,
}

impl fmt::Debug for ToastDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastDraft")
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("position", &self.position)
            .field("theme", &self.theme)
            .field("sound", &self.sound)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Fields to merge into an existing toast. `None` leaves the field untouched.
#[derive(Clone, Default)]
pub struct ToastPatch {
    pub message: Option<String>,
    pub kind: Option<ToastKind>,
    pub duration: Option<Duration>,
    pub position: Option<Position>,
    pub theme: Option<Option<Theme>>,
    pub sound: Option<Option<SoundChoice>>,
    pub dismissible: Option<bool>,
    pub swipeable: Option<bool>,
    pub show_progress: Option<bool>,
    pub actions: Option<Vec<ToastAction>>,
    pub rich_content: Option<bool>,
}

impl ToastPatch {
    /// Patch applied when an awaited operation settles.
    pub fn settled(kind: ToastKind, message: String, duration: Duration) -> Self {
        Self {
            message: Some(message),
            kind: Some(kind),
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Whether applying this patch changes how the toast expires.
    pub(crate) const fn touches_expiry(&self) -> bool {
        self.duration.is_some() || self.show_progress.is_some()
    }

    pub(crate) fn apply(self, toast: &mut Toast) {
        if let Some(message) = self.message {
            toast.message = message;
        }
        if let Some(kind) = self.kind {
            toast.kind = kind;
        }
        if let Some(duration) = self.duration {
            toast.duration = duration;
        }
        if let Some(position) = self.position {
            toast.position = position;
        }
        if let Some(theme) = self.theme {
            toast.theme = theme;
        }
        if let Some(sound) = self.sound {
            toast.sound = sound;
        }
        if let Some(dismissible) = self.dismissible {
            toast.dismissible = dismissible;
        }
        if let Some(swipeable) = self.swipeable {
            toast.swipeable = swipeable;
        }
        if let Some(show_progress) = self.show_progress {
            toast.show_progress = show_progress;
        }
        if let Some(actions) = self.actions {
            toast.actions = actions;
        }
        if let Some(rich_content) = self.rich_content {
            toast.rich_content = rich_content;
        }
    }
}

impl fmt::Debug for ToastPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastPatch")
            .field("message", &self.message)
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}
