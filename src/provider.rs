use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::Result;
use crate::config::ProviderConfig;
use crate::notify::{Binding, Notifier, toast};
use crate::sound::{MotionPreference, SoundPlayer, SoundPolicy};
use crate::store::ToastStore;
use crate::surface::{Toaster, ToasterConfig};

/// Owns the store and the sound policy, and binds them into a [`Notifier`].
#[derive(Debug)]
pub struct ToastProvider {
    store: ToastStore,
    sounds: SoundPolicy,
}

impl ToastProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let sounds = SoundPolicy::new(config.enable_sounds);
        Self {
            store: ToastStore::new(config),
            sounds,
        }
    }

    /// # Errors
    ///
    /// Returns an error when the configuration cannot be loaded or validated.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        ProviderConfig::from_env_and_file(path).map(Self::new)
    }

    #[must_use]
    pub fn with_motion_preference(mut self, motion: Arc<dyn MotionPreference>) -> Self {
        self.sounds = self.sounds.with_motion_preference(motion);
        self
    }

    #[must_use]
    pub fn with_sound_player(mut self, player: Arc<dyn SoundPlayer>) -> Self {
        self.sounds = self.sounds.with_player(player);
        self
    }

    pub const fn store(&self) -> &ToastStore {
        &self.store
    }

    pub const fn sounds(&self) -> &SoundPolicy {
        &self.sounds
    }

    /// Binds this provider into `notifier` until the guard is dropped.
    pub fn mount<'n>(&self, notifier: &'n Notifier) -> MountGuard<'n> {
        notifier.bind(Binding {
            store: self.store.clone(),
            sounds: self.sounds.clone(),
        });
        debug!(max_toasts = self.store.config().max_toasts, "toast provider mounted");
        MountGuard {
            notifier,
            store: self.store.clone(),
        }
    }

    /// Binds into the process-wide notifier returned by [`toast()`].
    pub fn mount_global(&self) -> MountGuard<'static> {
        self.mount(toast())
    }

    /// Render surface for one position bucket of this provider's store.
    pub fn toaster(&self, config: ToasterConfig) -> Toaster {
        Toaster::new(self.store.clone(), config)
    }
}

impl Default for ToastProvider {
    fn default() -> Self {
        Self::new(ProviderConfig::default())
    }
}

/// Keeps a provider bound; dropping it unbinds the notifier.
#[must_use = "the provider is unbound as soon as the guard is dropped"]
pub struct MountGuard<'n> {
    notifier: &'n Notifier,
    store: ToastStore,
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        self.notifier.unbind(&self.store);
        debug!("toast provider unmounted");
    }
}
