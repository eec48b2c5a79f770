use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const FALLBACK_FILTER: &str = "warn,toastline=info";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogFormat {
    #[default]
    Text,
    /// Requires the `json-logs` feature.
    Json,
}

/// Picks the first valid filter among the explicit one, `RUST_LOG`, and the
/// crate fallback.
fn resolve_filter(explicit_filter: Option<&str>, env_filter: Option<String>) -> Result<EnvFilter> {
    explicit_filter
        .map(str::to_string)
        .into_iter()
        .chain(env_filter)
        .chain(std::iter::once(FALLBACK_FILTER.to_string()))
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))
}

/// Installs the global tracing subscriber for a host application.
///
/// # Errors
///
/// Returns an error if no filter candidate is valid, if JSON output is
/// requested without the `json-logs` feature, or if a global subscriber is
/// already installed.
pub fn init_tracing(explicit_filter: Option<&str>, format: LogFormat) -> Result<()> {
    let filter = resolve_filter(explicit_filter, std::env::var("RUST_LOG").ok())?;

    match format {
        #[cfg(feature = "json-logs")]
        LogFormat::Json => {
            let subscriber = Registry::default().with(filter).with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .json()
                    .flatten_event(true),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| Error::Telemetry(err.to_string()))
        }
        #[cfg(not(feature = "json-logs"))]
        LogFormat::Json => Err(Error::Telemetry(
            "crate was built without the `json-logs` feature".to_string(),
        )),
        LogFormat::Text => {
            let subscriber = Registry::default().with(filter).with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            );
            tracing::subscriber::set_global_default(subscriber)
                .map_err(|err| Error::Telemetry(err.to_string()))
        }
    }
}
