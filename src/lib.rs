#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod sound;
pub mod store;
pub mod surface;
pub mod telemetry;
pub mod toast;
pub mod types;

pub use config::ProviderConfig;
pub use notify::{MessageSource, Notifier, PromiseMessages, ToastOptions, toast};
pub use provider::{MountGuard, ToastProvider};
pub use store::ToastStore;
pub use surface::{Toaster, ToasterConfig};
pub use toast::{Toast, ToastAction, ToastId};
pub use types::{Position, Theme, ToastKind};

pub type Result<T> = std::result::Result<T, error::Error>;
