//! Global `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::{AppError, AppResult};

/// Level used when neither an explicit level nor `RUST_LOG` is given.
pub const DEFAULT_LEVEL: &str = "info";

/// Install the fmt subscriber once at startup.
///
/// An explicit `level` (any `EnvFilter` directive string) wins over
/// `RUST_LOG`; without either the filter is [`DEFAULT_LEVEL`]. A second call
/// fails with [`AppError::Logging`].
pub fn init(level: Option<&str>) -> AppResult<()> {
    let filter = match level {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_LEVEL)),
    }
    .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))
}
