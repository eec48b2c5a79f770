use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;

use crate::Result;
use crate::error::ConfigError;
use crate::types::{Position, Theme};

use super::defaults::{
    default_duration, default_enable_sounds, default_eviction_delay, default_max_toasts,
    default_position, default_progress_tick, default_settle_duration,
};
use super::env::EnvOverrides;
use super::{HumantimeDuration, MAX_TOASTS_BOUNDS, ProviderConfig};

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let mut builder = ::config::Config::builder();
    let path = path.as_ref();
    builder = builder.add_source(::config::File::from(path).required(false));
    builder = builder.add_source(
        ::config::Environment::with_prefix("TOASTLINE")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) provider: RawProvider,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawProvider {
    #[serde(default = "default_position")]
    pub(super) default_position: String,
    #[serde(default = "default_max_toasts")]
    pub(super) max_toasts: usize,
    #[serde(default)]
    pub(super) default_theme: Option<String>,
    #[serde(default = "default_enable_sounds")]
    pub(super) enable_sounds: bool,
    #[serde(default = "default_duration")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) default_duration: Duration,
    #[serde(default = "default_settle_duration")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) settle_duration: Duration,
    #[serde(default = "default_eviction_delay")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) eviction_delay: Duration,
    #[serde(default = "default_progress_tick")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) progress_tick: Duration,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(
        &mut self,
        env: &EnvOverrides,
    ) -> std::result::Result<(), ConfigError> {
        let provider = &mut self.provider;
        if let Some(position) = env.string("TOAST_POSITION")? {
            provider.default_position = position;
        }
        if let Some(max) = env.parse::<usize>("TOAST_MAX")? {
            provider.max_toasts = max;
        }
        if let Some(theme) = env.string("TOAST_THEME")? {
            provider.default_theme = Some(theme);
        }
        if let Some(sounds) = env.parse::<bool>("TOAST_SOUNDS")? {
            provider.enable_sounds = sounds;
        }
        if let Some(duration) = env.duration("TOAST_DURATION")? {
            provider.default_duration = duration;
        }
        if let Some(settle) = env.duration("TOAST_SETTLE_DURATION")? {
            provider.settle_duration = settle;
        }
        if let Some(delay) = env.duration("TOAST_EVICTION_DELAY")? {
            provider.eviction_delay = delay;
        }
        if let Some(tick) = env.duration("TOAST_PROGRESS_TICK")? {
            provider.progress_tick = tick;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<ProviderConfig> {
        let raw = self.provider;

        let default_position = Position::from_str(&raw.default_position).map_err(|err| {
            ConfigError::InvalidField {
                field: "provider.default_position",
                message: err,
            }
        })?;

        let default_theme = raw
            .default_theme
            .as_deref()
            .filter(|theme| !theme.trim().is_empty())
            .map(Theme::from_str)
            .transpose()
            .map_err(|err| ConfigError::InvalidField {
                field: "provider.default_theme",
                message: err,
            })?;

        if !MAX_TOASTS_BOUNDS.contains(&raw.max_toasts) {
            return Err(ConfigError::InvalidField {
                field: "provider.max_toasts",
                message: format!(
                    "expected between {} and {}, got {}",
                    MAX_TOASTS_BOUNDS.start(),
                    MAX_TOASTS_BOUNDS.end(),
                    raw.max_toasts
                ),
            }
            .into());
        }
        if raw.progress_tick.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "provider.progress_tick",
                message: "tick interval must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(ProviderConfig {
            default_position,
            max_toasts: raw.max_toasts,
            default_theme,
            enable_sounds: raw.enable_sounds,
            default_duration: raw.default_duration,
            settle_duration: raw.settle_duration,
            eviction_delay: raw.eviction_delay,
            progress_tick: raw.progress_tick,
        })
    }
}

impl Default for RawProvider {
    fn default() -> Self {
        Self {
            default_position: default_position(),
            max_toasts: default_max_toasts(),
            default_theme: None,
            enable_sounds: default_enable_sounds(),
            default_duration: default_duration(),
            settle_duration: default_settle_duration(),
            eviction_delay: default_eviction_delay(),
            progress_tick: default_progress_tick(),
        }
    }
}
