//! Model Error Types
//!
//! Error types for parameter validation, noise synthesis, and orchestration
//! using `thiserror`.

use thiserror::Error;

/// Errors raised by the simulation pipeline.
///
/// Every variant is raised before the simulation engine is invoked, so a
/// failed call never leaves partially filled engine buffers behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A parameter is out of range or names an unrecognized option
    #[error("Invalid parameter {parameter}: {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: &'static str,
        /// Reason
        reason: String,
    },

    /// A numerical invariant of the noise synthesizer was violated
    #[error("Internal consistency failure: {reason}")]
    InternalConsistency {
        /// Reason
        reason: String,
    },
}

impl ModelError {
    /// Shorthand for [`ModelError::InvalidParameter`]
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { parameter, reason: reason.into() }
    }

    /// Whether this error came from parameter validation
    #[must_use]
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

/// Result type for pipeline operations
pub type ModelResult<T> = Result<T, ModelError>;
