//! Runtime error types.

use dialogkit_core::{InterceptError, ListenerError};
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A lifecycle listener could not be registered or removed.
    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    /// A sniffer could not be installed.
    #[error("Interception error: {0}")]
    Intercept(#[from] InterceptError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
