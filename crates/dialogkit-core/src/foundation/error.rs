//! Unified error types for the dialogkit core.
//!
//! Decode errors are mostly swallowed by the lenient payload decoder and only
//! surface through [`decode_compound`](crate::foundation::codec::decode_compound).
//! Interception and listener errors are returned to the host glue.

use thiserror::Error;

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors produced while reading a tagged binary payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The input ended before a value was complete.
    #[error("unexpected end of payload while reading {context}")]
    Truncated {
        /// What was being read when the input ran out.
        context: &'static str,
    },

    /// A type code outside `1..=12` was found.
    #[error("unknown tag type {type_id}")]
    UnknownTag {
        /// The offending type code.
        type_id: u8,
    },

    /// The root tag is not a compound.
    #[error("root tag must be a compound, found type {type_id}")]
    NotACompound {
        /// The type code found at the root.
        type_id: u8,
    },

    /// A string was not valid modified UTF-8.
    #[error("invalid modified UTF-8 in string tag")]
    InvalidString,

    /// A length prefix was negative.
    #[error("negative length {length} for {context}")]
    NegativeLength {
        /// The decoded length.
        length: i32,
        /// What the length prefixed.
        context: &'static str,
    },

    /// Nesting exceeded the supported depth.
    #[error("nesting depth exceeds {max}")]
    TooDeep {
        /// The maximum allowed depth.
        max: usize,
    },
}

// =============================================================================
// Interception Errors
// =============================================================================

/// Errors raised by the host pipeline when adding or removing stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The anchor stage does not exist.
    #[error("no pipeline stage named '{0}'")]
    NoSuchStage(String),

    /// A stage with the same name is already installed.
    #[error("duplicate pipeline stage '{0}'")]
    Duplicate(String),

    /// The underlying channel has been closed.
    #[error("channel is closed")]
    Closed,
}

/// Errors returned by [`PacketInterceptor`](crate::integration::interceptor::PacketInterceptor).
#[derive(Debug, Clone, Error)]
pub enum InterceptError {
    /// The player has no live connection known to the host.
    #[error("no connection found for player {0}")]
    ConnectionNotFound(String),

    /// The host pipeline rejected the operation.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

// =============================================================================
// Listener Errors
// =============================================================================

/// Errors raised by a [`ListenerRegistrar`](crate::integration::host::ListenerRegistrar).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// The listener id is not (or no longer) registered.
    #[error("listener {0} is not registered")]
    Unknown(u64),

    /// The listener declares no event kinds.
    #[error("listener declares no capabilities")]
    NoCapabilities,
}

// =============================================================================
// Identifier Errors
// =============================================================================

/// Errors raised when parsing a [`ResourceLocation`](crate::foundation::location::ResourceLocation).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The namespace contains a character outside `[a-z0-9_.-]`.
    #[error("invalid character in namespace '{0}'")]
    InvalidNamespace(String),

    /// The path contains a character outside `[a-z0-9_./-]`.
    #[error("invalid character in path '{0}'")]
    InvalidPath(String),

    /// The path is empty.
    #[error("resource location path is empty")]
    EmptyPath,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for payload decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for interception operations.
pub type InterceptResult<T> = Result<T, InterceptError>;

/// Result type for listener registration.
pub type ListenerResult<T> = Result<T, ListenerError>;
