//! Configuration for the dialogkit runtime.
//!
//! Settings are layered with `figment` (see [`loader`]) into a
//! [`DialogkitConfig`] and checked by [`validate_config`] before the runtime
//! is built.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    DialogkitConfig, InterceptorConfig, ListenersConfig, LogFormat, LogOutput, LogRotation,
    LoggingConfig, PluginConfig, SchedulerConfig, SpanEventConfig, parse_level,
};
pub use validation::validate_config;
