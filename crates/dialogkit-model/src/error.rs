//! Builder errors.

use dialogkit_core::LocationError;
use thiserror::Error;

/// Errors returned by `build()` when a record is misconfigured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// A required field was never set.
    #[error("{record} requires `{field}` to be set")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    /// A field was set to a value the client would reject.
    #[error("invalid `{field}` for {record}: {reason}")]
    Invalid {
        record: &'static str,
        field: &'static str,
        reason: String,
    },

    /// An identifier failed to parse.
    #[error(transparent)]
    Location(#[from] LocationError),
}

impl BuildError {
    /// Creates a missing-field error.
    pub fn missing(record: &'static str, field: &'static str) -> Self {
        Self::MissingField { record, field }
    }

    /// Creates an invalid-value error.
    pub fn invalid(record: &'static str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            record,
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for builders.
pub type BuildResult<T> = Result<T, BuildError>;
