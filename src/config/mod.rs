use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::Error as ToastError;
use crate::types::{Position, Theme};

mod defaults;
mod duration;
mod env;
mod raw;

pub(crate) use duration::HumantimeDuration;

const MAX_TOASTS_BOUNDS: RangeInclusive<usize> = 1..=100;

/// Provider-level settings shared by the store, the facade and the surface.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    pub default_position: Position,
    /// Capacity of each position bucket.
    pub max_toasts: usize,
    pub default_theme: Option<Theme>,
    pub enable_sounds: bool,
    #[serde_as(as = "HumantimeDuration")]
    pub default_duration: Duration,
    /// Duration given to a promise toast once it settles.
    #[serde_as(as = "HumantimeDuration")]
    pub settle_duration: Duration,
    #[serde_as(as = "HumantimeDuration")]
    pub eviction_delay: Duration,
    #[serde_as(as = "HumantimeDuration")]
    pub progress_tick: Duration,
}

impl ProviderConfig {
    /// Load configuration from a file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be parsed, when
    /// environment overrides are invalid, or when the resulting values fail
    /// validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(ToastError::from)?;
        raw.apply_env_overrides(&env::EnvOverrides::process())
            .map_err(ToastError::from)?;
        raw.validate_and_build()
    }

    /// Sets the bucket capacity, clamped to the range accepted from files.
    #[must_use]
    pub fn with_max_toasts(mut self, max_toasts: usize) -> Self {
        self.max_toasts = max_toasts.clamp(*MAX_TOASTS_BOUNDS.start(), *MAX_TOASTS_BOUNDS.end());
        self
    }

    #[must_use]
    pub const fn with_default_position(mut self, position: Position) -> Self {
        self.default_position = position;
        self
    }

    #[must_use]
    pub const fn with_default_theme(mut self, theme: Option<Theme>) -> Self {
        self.default_theme = theme;
        self
    }

    #[must_use]
    pub const fn with_sounds(mut self, enable_sounds: bool) -> Self {
        self.enable_sounds = enable_sounds;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            default_position: Position::default(),
            max_toasts: defaults::default_max_toasts(),
            default_theme: None,
            enable_sounds: defaults::default_enable_sounds(),
            default_duration: defaults::default_duration(),
            settle_duration: defaults::default_settle_duration(),
            eviction_delay: defaults::default_eviction_delay(),
            progress_tick: defaults::default_progress_tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProviderConfig;
    use std::io::Write;

    #[test]
    fn default_config_snapshot() {
        insta::assert_json_snapshot!(ProviderConfig::default(), @r###"
        {
          "default_position": "top-right",
          "max_toasts": 5,
          "default_theme": null,
          "enable_sounds": true,
          "default_duration": "4s",
          "settle_duration": "4s",
          "eviction_delay": "50ms",
          "progress_tick": "100ms"
        }
        "###);
    }

    #[test]
    fn builder_clamps_max_toasts() {
        assert_eq!(ProviderConfig::default().with_max_toasts(0).max_toasts, 1);
        assert_eq!(ProviderConfig::default().with_max_toasts(500).max_toasts, 100);
        assert_eq!(ProviderConfig::default().with_max_toasts(3).max_toasts, 3);
    }

    #[test]
    fn loads_provider_table_from_toml() {
        let dir = std::env::temp_dir().join(format!("toastline-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("toasts.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[provider]\nmax_toasts = 3\ndefault_theme = \"neon\"\nsettle_duration = \"2s\""
        )
        .unwrap();

        let config = ProviderConfig::from_env_and_file(&path).unwrap();
        assert_eq!(config.max_toasts, 3);
        assert_eq!(config.default_theme, Some(crate::types::Theme::Neon));
        assert_eq!(config.settle_duration, std::time::Duration::from_secs(2));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ProviderConfig::from_env_and_file("/nonexistent/toastline.toml").unwrap();
        assert_eq!(config.max_toasts, ProviderConfig::default().max_toasts);
    }
}
