//! Error types for the fdm-app service layer.

/// Application error type wrapping the engine and configuration errors so the
/// CLI reports every failure through one interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Engine error: {0}")]
    Fdm(#[from] fdm_core::FdmError),

    #[error("Configuration error: {0}")]
    Config(#[from] fdm_config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Simulation worker panicked")]
    WorkerPanicked,

    #[error("Cannot install log subscriber: {0}")]
    Logging(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for fdm-app operations.
pub type AppResult<T> = Result<T, AppError>;
