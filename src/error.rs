use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sound(#[from] SoundError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("missing required configuration field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid configuration for {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("configuration error: {0}")]
    Other(String),
}

/// Failures of the environment around sound playback. These never reach the
/// caller of a trigger function; they are logged and the toast shows silently.
#[derive(Debug, Error)]
pub enum SoundError {
    #[error("accessibility preference unavailable: {0}")]
    PreferenceUnavailable(String),
    #[error("sound playback failed: {0}")]
    Playback(String),
}

impl Error {
    /// Whether the failure only disables an optional capability.
    pub const fn is_degradable(&self) -> bool {
        matches!(self, Self::Sound(_))
    }
}
