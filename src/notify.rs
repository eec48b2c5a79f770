//! Dispatch facade: the trigger API hosts call to show toasts.
//!
//! A [`Notifier`] is usable before any store exists. Until a
//! [`ToastProvider`](crate::provider::ToastProvider) is mounted into it, every
//! trigger logs a warning and returns [`ToastId::empty`]. The process-wide
//! instance is reachable through [`toast()`].

use std::fmt;
use std::future::Future;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::sound::{SoundChoice, SoundPolicy};
use crate::store::ToastStore;
use crate::toast::{Callback, ToastAction, ToastDraft, ToastId, ToastPatch};
use crate::types::{Position, Theme, ToastKind};

static GLOBAL: Notifier = Notifier::new();

/// Process-wide notifier, bound by [`ToastProvider::mount_global`](crate::provider::ToastProvider::mount_global).
pub fn toast() -> &'static Notifier {
    &GLOBAL
}

/// Caller options for a trigger. Unset fields take their defaults when the
/// record is built.
#[derive(Clone, Default)]
pub struct ToastOptions {
    pub kind: Option<ToastKind>,
    pub duration: Option<Duration>,
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

impl ToastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn kind(mut self, kind: ToastKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub const fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub const fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn sound(mut self, sound: impl Into<SoundChoice>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    #[must_use]
    pub const fn dismissible(mut self, dismissible: bool) -> Self {
        self.dismissible = Some(dismissible);
        self
    }

    #[must_use]
    pub const fn swipeable(mut self, swipeable: bool) -> Self {
        self.swipeable = Some(swipeable);
        self
    }

    #[must_use]
    pub const fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = Some(show_progress);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ToastAction) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub const fn rich_content(mut self, rich_content: bool) -> Self {
        self.rich_content = Some(rich_content);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    #[must_use]
    pub fn on_open(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(std::sync::Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_close(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(std::sync::Arc::new(hook));
        self
    }
}

impl fmt::Debug for ToastOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastOptions")
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("position", &self.position)
            .field("theme", &self.theme)
            .field("sound", &self.sound)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Builds the record every trigger inserts. `kind` defaults to info and
/// `duration` to the provider's default duration; everything else is left to
/// the store defaults.
pub fn build_draft(message: String, options: ToastOptions, config: &ProviderConfig) -> ToastDraft {
    ToastDraft {
        message,
        kind: options.kind.unwrap_or_default(),
        duration: options.duration.unwrap_or(config.default_duration),
        position: options.position,
        theme: options.theme,
        sound: options.sound,
        dismissible: options.dismissible,
        swipeable: options.swipeable,
        show_progress: options.show_progress,
        actions: options.actions,
        rich_content: options.rich_content,
        icon: options.icon,
        class_name: options.class_name,
        on_open: options.on_open,
        on_close: options.on_close,
    }
}

/// Message shown when a tracked operation settles.
pub enum MessageSource<T> {
    Literal(String),
    Computed(Box<dyn FnOnce(&T) -> String + Send>),
}

impl<T> MessageSource<T> {
    pub fn computed(f: impl FnOnce(&T) -> String + Send + 'static) -> Self {
        Self::Computed(Box::new(f))
    }

    fn resolve(self, value: &T) -> String {
        match self {
            Self::Literal(text) => text,
            Self::Computed(f) => f(value),
        }
    }
}

impl<T> From<&str> for MessageSource<T> {
    fn from(text: &str) -> Self {
        Self::Literal(text.to_string())
    }
}

impl<T> From<String> for MessageSource<T> {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl<T> fmt::Debug for MessageSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug)]
pub struct PromiseMessages<T, E> {
    pub loading: String,
    pub success: MessageSource<T>,
    pub error: MessageSource<E>,
}

impl<T, E> PromiseMessages<T, E> {
    pub fn new(
        loading: impl Into<String>,
        success: impl Into<MessageSource<T>>,
        error: impl Into<MessageSource<E>>,
    ) -> Self {
        Self {
            loading: loading.into(),
            success: success.into(),
            error: error.into(),
        }
    }
}

#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) store: ToastStore,
    pub(crate) sounds: SoundPolicy,
}

/// Trigger API with an optional binding to a store.
pub struct Notifier {
    binding: RwLock<Option<Binding>>,
}

impl Notifier {
    pub const fn new() -> Self {
        Self {
            binding: RwLock::new(None),
        }
    }

    pub(crate) fn bind(&self, binding: Binding) {
        let mut slot = self.binding.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            warn!("notifier was already bound, replacing previous store");
        }
        *slot = Some(binding);
    }

    /// Clears the binding if it still points at `store`.
    pub(crate) fn unbind(&self, store: &ToastStore) {
        let mut slot = self.binding.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|b| b.store.same_as(store)) {
            *slot = None;
        }
    }

    pub fn is_ready(&self) -> bool {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Store currently bound, if any.
    pub fn store(&self) -> Option<ToastStore> {
        self.current().map(|b| b.store)
    }

    fn current(&self) -> Option<Binding> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shows a toast. Returns an empty id when no provider is mounted.
    pub fn notify(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        let Some(Binding { store, sounds }) = self.current() else {
            warn!("toast triggered before a provider was mounted");
            return ToastId::empty();
        };
        let draft = build_draft(message.into(), options, store.config());
        sounds.play_for(draft.sound, draft.kind);
        store.add(draft)
    }

    /// Full-control trigger; same as [`Notifier::notify`].
    pub fn custom(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options)
    }

    pub fn success(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.kind(ToastKind::Success))
    }

    pub fn error(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.kind(ToastKind::Error))
    }

    pub fn warning(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.kind(ToastKind::Warning))
    }

    pub fn info(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.kind(ToastKind::Info))
    }

    /// Loading toasts never expire on their own.
    pub fn loading(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(
            message,
            options.kind(ToastKind::Loading).duration(Duration::ZERO),
        )
    }

    pub fn glass(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.theme(Theme::Glass))
    }

    pub fn neon(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.theme(Theme::Neon))
    }

    pub fn minimal(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.theme(Theme::Minimal))
    }

    pub fn colorful(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.theme(Theme::Colorful))
    }

    pub fn silent(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.sound(SoundChoice::Off))
    }

    /// `message` is trusted markup and is rendered unescaped.
    pub fn rich(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.rich_content(true))
    }

    pub fn progress(&self, message: impl Into<String>, options: ToastOptions) -> ToastId {
        self.notify(message, options.show_progress(true))
    }

    pub fn action(
        &self,
        message: impl Into<String>,
        actions: Vec<ToastAction>,
        options: ToastOptions,
    ) -> ToastId {
        self.notify(message, ToastOptions { actions, ..options })
    }

    /// Tracks `future` with a loading toast, created before this returns.
    ///
    /// When the future settles the same toast becomes a success or error toast
    /// with the provider's settle duration. The future's output is returned
    /// unchanged, errors included.
    ///
    /// The returned future must be awaited or spawned; dropping it unpolled
    /// leaves the loading toast on screen until it is dismissed.
    pub fn promise<T, E, F>(
        &self,
        future: F,
        messages: PromiseMessages<T, E>,
        options: ToastOptions,
    ) -> impl Future<Output = Result<T, E>> + Send + 'static + use<T, E, F>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let PromiseMessages {
            loading,
            success,
            error,
        } = messages;
        let loading_id = self.loading(loading, options);
        let store = self.store();

        async move {
            let outcome = future.await;
            let (kind, message) = match &outcome {
                Ok(value) => (ToastKind::Success, success.resolve(value)),
                Err(err) => (ToastKind::Error, error.resolve(err)),
            };
            if let Some(store) = store {
                let settle = store.config().settle_duration;
                debug!(toast_id = %loading_id, %kind, "tracked operation settled");
                store.update(&loading_id, ToastPatch::settled(kind, message, settle));
            }
            outcome
        }
    }

    pub fn dismiss(&self, id: &ToastId) {
        if let Some(binding) = self.current() {
            binding.store.remove(id);
        }
    }

    pub fn dismiss_all(&self) {
        if let Some(binding) = self.current() {
            binding.store.clear();
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{MessageSource, Notifier, PromiseMessages, ToastOptions, build_draft};
    use crate::config::ProviderConfig;
    use crate::provider::ToastProvider;
    use crate::sound::{FixedMotionPreference, SoundChoice};
    use crate::toast::ToastAction;
    use crate::types::{Position, Theme, ToastKind};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn provider() -> ToastProvider {
        ToastProvider::new(ProviderConfig::default())
            .with_motion_preference(Arc::new(FixedMotionPreference(false)))
    }

    #[test]
    fn build_draft_fills_facade_defaults() {
        let draft = build_draft("hi".into(), ToastOptions::new(), &ProviderConfig::default());
        assert_eq!(draft.kind, ToastKind::Info);
        assert_eq!(draft.duration, Duration::from_millis(4_000));
        assert_eq!(draft.position, None);
        assert_eq!(draft.dismissible, None);
    }

    #[test]
    fn unbound_notifier_degrades_to_empty_id() {
        let notifier = Notifier::new();
        assert!(!notifier.is_ready());
        assert!(notifier.success("nobody listens", ToastOptions::new()).is_empty());
        notifier.dismiss(&crate::toast::ToastId::empty());
        notifier.dismiss_all();
    }

    #[tokio::test(start_paused = true)]
    async fn kind_sugar_fixes_kind() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);
        let store = provider.store();

        let cases = [
            (notifier.success("s", ToastOptions::new()), ToastKind::Success),
            (notifier.error("e", ToastOptions::new()), ToastKind::Error),
            (notifier.warning("w", ToastOptions::new()), ToastKind::Warning),
            (notifier.info("i", ToastOptions::new().kind(ToastKind::Error)), ToastKind::Info),
        ];
        for (id, kind) in cases {
            assert_eq!(store.get(&id).unwrap().kind, kind);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loading_forces_persistent_duration() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);

        let id = notifier.loading(
            "busy",
            ToastOptions::new().duration(Duration::from_secs(1)),
        );
        tokio::time::sleep(Duration::from_secs(60)).await;
        let toast = provider.store().get(&id).unwrap();
        assert_eq!(toast.kind, ToastKind::Loading);
        assert!(toast.is_persistent());
    }

    #[tokio::test(start_paused = true)]
    async fn variant_sugar_fixes_one_field() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);
        let store = provider.store();

        let glass = store.get(&notifier.glass("g", ToastOptions::new())).unwrap();
        assert_eq!(glass.theme, Some(Theme::Glass));
        let neon = store.get(&notifier.neon("n", ToastOptions::new())).unwrap();
        assert_eq!(neon.theme, Some(Theme::Neon));
        let silent = store.get(&notifier.silent("s", ToastOptions::new())).unwrap();
        assert_eq!(silent.sound, Some(SoundChoice::Off));
        let rich = store.get(&notifier.rich("<b>r</b>", ToastOptions::new())).unwrap();
        assert!(rich.rich_content);
        let progress = store.get(&notifier.progress("p", ToastOptions::new())).unwrap();
        assert!(progress.show_progress);

        let actions = vec![ToastAction::new("Undo", || {}), ToastAction::new("Open", || {})];
        let with_actions = store
            .get(&notifier.action("a", actions, ToastOptions::new().kind(ToastKind::Success)))
            .unwrap();
        assert_eq!(with_actions.actions.len(), 2);
        assert_eq!(with_actions.kind, ToastKind::Success);
        assert_eq!(with_actions.position, Position::TopRight);
    }

    #[tokio::test(start_paused = true)]
    async fn promise_success_morphs_loading_toast() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);
        let store = provider.store().clone();

        let (tx, rx) = oneshot::channel::<String>();
        let tracked = notifier.promise(
            async move { rx.await.map_err(|_| "sender dropped") },
            PromiseMessages::new(
                "Loading...",
                MessageSource::computed(|data: &String| format!("Success: {data}")),
                "Error occurred",
            ),
            ToastOptions::new(),
        );

        let pending = store.snapshot();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, ToastKind::Loading);
        assert_eq!(pending[0].message, "Loading...");
        let id = pending[0].id.clone();

        tx.send("X".to_string()).unwrap();
        assert_eq!(tracked.await, Ok("X".to_string()));

        let settled = store.get(&id).unwrap();
        assert_eq!(settled.kind, ToastKind::Success);
        assert_eq!(settled.message, "Success: X");
        assert_eq!(settled.duration, Duration::from_millis(4_000));
    }

    #[tokio::test(start_paused = true)]
    async fn promise_failure_is_reported_and_propagated() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);
        let store = provider.store().clone();

        let tracked = notifier.promise(
            async { Err::<u32, _>("disk full".to_string()) },
            PromiseMessages::new(
                "Saving...",
                "Saved",
                MessageSource::computed(|err: &String| format!("Failed: {err}")),
            ),
            ToastOptions::new().position(Position::BottomRight),
        );
        assert_eq!(tracked.await, Err("disk full".to_string()));

        let toast = store.bucket(Position::BottomRight).pop().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Failed: disk full");
    }

    #[tokio::test(start_paused = true)]
    async fn promise_without_provider_still_yields_result() {
        let notifier = Notifier::new();
        let tracked = notifier.promise(
            async { Ok::<_, ()>(7) },
            PromiseMessages::new("...", "done", "failed"),
            ToastOptions::new(),
        );
        assert_eq!(tracked.await, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn unpolled_promise_leaves_loading_toast() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);

        let tracked = notifier.promise(
            async { Ok::<_, ()>(1) },
            PromiseMessages::new("Pending", "done", "failed"),
            ToastOptions::new(),
        );
        drop(tracked);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let toast = provider.store().snapshot().pop().unwrap();
        assert_eq!(toast.kind, ToastKind::Loading);
        assert_eq!(toast.message, "Pending");
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_forwards_to_store() {
        let notifier = Notifier::new();
        let provider = provider();
        let _guard = provider.mount(&notifier);

        let id = notifier.info("x", ToastOptions::new());
        notifier.info("y", ToastOptions::new());
        notifier.dismiss(&id);
        notifier.dismiss(&id);
        assert_eq!(provider.store().len(), 1);
        notifier.dismiss_all();
        assert!(provider.store().is_empty());
    }

    #[test]
    fn literal_message_ignores_value() {
        let source: MessageSource<u8> = "fixed".into();
        assert_eq!(source.resolve(&1), "fixed");
    }
}
