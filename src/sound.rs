//! Sound selection for toasts.
//!
//! Deciding whether a toast makes a sound is a pure function of the global
//! flag, the per-call override and the reduced-motion accessibility signal.
//! Actual audio output sits behind [`SoundPlayer`].

use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SoundError;
use crate::types::ToastKind;

const REDUCED_MOTION_ENV: &str = "TOASTLINE_REDUCED_MOTION";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundKind {
    Success,
    Error,
    Warning,
    Info,
    Loading,
    Notification,
}

impl SoundKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Loading => "loading",
            Self::Notification => "notification",
        }
    }

    /// Note sequence in Hz, played roughly 100ms apart.
    pub const fn frequencies(self) -> &'static [f32] {
        match self {
            Self::Success => &[523.25, 659.25, 783.99],
            Self::Error => &[220.0, 174.61],
            Self::Warning => &[440.0, 554.37],
            Self::Info => &[523.25, 698.46],
            Self::Loading => &[523.25, 659.25],
            Self::Notification => &[659.25, 523.25],
        }
    }
}

impl From<ToastKind> for SoundKind {
    fn from(kind: ToastKind) -> Self {
        match kind {
            ToastKind::Success => Self::Success,
            ToastKind::Error => Self::Error,
            ToastKind::Warning => Self::Warning,
            ToastKind::Info => Self::Info,
            ToastKind::Loading => Self::Loading,
        }
    }
}

impl Display for SoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call sound override. An unset override behaves like `Auto`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundChoice {
    /// `false` or `"none"`: never play, whatever the global flag says.
    Off,
    /// `true`: play the sound named after the toast kind.
    Auto,
    Named(SoundKind),
}

impl From<bool> for SoundChoice {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Auto } else { Self::Off }
    }
}

impl From<SoundKind> for SoundChoice {
    fn from(kind: SoundKind) -> Self {
        Self::Named(kind)
    }
}

impl FromStr for SoundChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" | "false" => Ok(Self::Off),
            "auto" | "on" | "true" => Ok(Self::Auto),
            "success" => Ok(Self::Named(SoundKind::Success)),
            "error" => Ok(Self::Named(SoundKind::Error)),
            "warning" => Ok(Self::Named(SoundKind::Warning)),
            "info" => Ok(Self::Named(SoundKind::Info)),
            "loading" => Ok(Self::Named(SoundKind::Loading)),
            "notification" => Ok(Self::Named(SoundKind::Notification)),
            other => Err(format!("unknown sound: {other}")),
        }
    }
}

/// Decides which sound, if any, accompanies a toast.
///
/// `reduced_motion` is `None` when the preference could not be read; that
/// case allows sound.
pub fn decide(
    enabled: bool,
    reduced_motion: Option<bool>,
    choice: Option<SoundChoice>,
    kind: ToastKind,
) -> Option<SoundKind> {
    match choice {
        Some(SoundChoice::Off) => None,
        _ if !enabled || reduced_motion == Some(true) => None,
        Some(SoundChoice::Named(sound)) => Some(sound),
        Some(SoundChoice::Auto) | None => Some(SoundKind::from(kind)),
    }
}

/// Source of the reduced-motion accessibility preference.
pub trait MotionPreference: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SoundError::PreferenceUnavailable`] when the platform cannot
    /// answer the query.
    fn prefers_reduced_motion(&self) -> Result<bool, SoundError>;
}

/// Reads the preference from `TOASTLINE_REDUCED_MOTION`. Unset means no preference.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvMotionPreference;

impl MotionPreference for EnvMotionPreference {
    fn prefers_reduced_motion(&self) -> Result<bool, SoundError> {
        match std::env::var(REDUCED_MOTION_ENV) {
            Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" | "no-preference" => Ok(false),
                "1" | "true" | "yes" | "reduce" => Ok(true),
                other => Err(SoundError::PreferenceUnavailable(format!(
                    "{REDUCED_MOTION_ENV}={other}"
                ))),
            },
            Err(std::env::VarError::NotPresent) => Ok(false),
            Err(err) => Err(SoundError::PreferenceUnavailable(err.to_string())),
        }
    }
}

/// Fixed answer, for hosts that know the preference up front.
#[derive(Clone, Copy, Debug)]
pub struct FixedMotionPreference(pub bool);

impl MotionPreference for FixedMotionPreference {
    fn prefers_reduced_motion(&self) -> Result<bool, SoundError> {
        Ok(self.0)
    }
}

/// Audio output.
pub trait SoundPlayer: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SoundError::Playback`] when the sound cannot be produced.
    fn play(&self, sound: SoundKind) -> Result<(), SoundError>;
}

/// Default player: records the tone sequence in the log and stays quiet.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPlayer;

impl SoundPlayer for LogPlayer {
    fn play(&self, sound: SoundKind) -> Result<(), SoundError> {
        debug!(%sound, tones = ?sound.frequencies(), "toast sound");
        Ok(())
    }
}

/// Global sound flag plus the environment it consults.
#[derive(Clone)]
pub struct SoundPolicy {
    enabled: bool,
    motion: Arc<dyn MotionPreference>,
    player: Arc<dyn SoundPlayer>,
}

impl SoundPolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            motion: Arc::new(EnvMotionPreference),
            player: Arc::new(LogPlayer),
        }
    }

    #[must_use]
    pub fn with_motion_preference(mut self, motion: Arc<dyn MotionPreference>) -> Self {
        self.motion = motion;
        self
    }

    #[must_use]
    pub fn with_player(mut self, player: Arc<dyn SoundPlayer>) -> Self {
        self.player = player;
        self
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn resolve(&self, choice: Option<SoundChoice>, kind: ToastKind) -> Option<SoundKind> {
        // An explicit opt-out never needs the environment.
        if matches!(choice, Some(SoundChoice::Off)) || !self.enabled {
            return None;
        }
        let reduced_motion = match self.motion.prefers_reduced_motion() {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "reduced-motion preference unavailable, allowing sound");
                None
            }
        };
        decide(self.enabled, reduced_motion, choice, kind)
    }

    /// Resolves and plays. Playback failures are logged, never returned.
    pub fn play_for(&self, choice: Option<SoundChoice>, kind: ToastKind) -> Option<SoundKind> {
        let sound = self.resolve(choice, kind)?;
        if let Err(err) = self.player.play(sound) {
            warn!(error = %err, %sound, "toast sound unavailable");
        }
        Some(sound)
    }
}

impl fmt::Debug for SoundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundPolicy")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
