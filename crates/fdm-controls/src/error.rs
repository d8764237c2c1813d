//! Error types for control-element construction.

use fdm_core::FdmError;
use thiserror::Error;

/// Result type for control-element construction.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors raised while building elements from a description.
///
/// Updating an element never fails; these only appear at construction time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Coefficients whose discretization divides by zero at the given step.
    #[error("Degenerate {element} discretization at dt = {dt}")]
    Degenerate { element: &'static str, dt: f64 },
}

impl From<ControlError> for FdmError {
    fn from(err: ControlError) -> Self {
        FdmError::invalid_arg(err.to_string())
    }
}
