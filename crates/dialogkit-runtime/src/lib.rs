//! # dialogkit Runtime
//!
//! Lifecycle, configuration and logging around `dialogkit-core`.
//!
//! This crate provides:
//! - Runtime wiring and the main-thread tick loop ([`DialogRuntime`])
//! - Layered configuration with `figment` ([`config`])
//! - Subscriber setup with `tracing-subscriber` ([`logging`])
//! - The join/quit and reload listeners that keep sniffers in place
//!   ([`listeners`])
//!
//! ```rust,ignore
//! use dialogkit_runtime::DialogRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = DialogRuntime::builder().build()?;
//!     runtime.register_binding("dialogkit:confirm", confirm_binding());
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod listeners;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, DialogkitConfig, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use listeners::{ConnectionStatusListener, ServerStatusListener};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{DialogRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for plugin code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, span, trace, warn};
}
