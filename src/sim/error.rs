//! Error types for operator-facing simulation settings.

use thiserror::Error;

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised when an operator setting is rejected.
///
/// The physics, schedule, and actuator functions are total; only the
/// setters that feed them can fail.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A setter received a value outside its domain.
    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting {
        field: &'static str,
        reason: &'static str,
    },
}

impl SimError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::InvalidSetting { field, reason }
    }
}

/// Checks that a setter value is finite.
pub(crate) fn ensure_finite(field: &'static str, value: f64) -> SimResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::invalid(field, "must be a finite number"))
    }
}
