//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dialogkit_core::DEFAULT_ANCHOR;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DialogkitConfig {
    /// Identity of the plugin that owns the runtime.
    #[serde(default)]
    pub plugin: PluginConfig,

    /// Pipeline placement of the packet sniffer.
    #[serde(default)]
    pub interceptor: InterceptorConfig,

    /// Main-thread tick loop.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Defaults for listeners registered by actions.
    #[serde(default)]
    pub listeners: ListenersConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Plugin identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginConfig {
    /// Plugin name; the sniffer's pipeline stage name is derived from it.
    #[serde(default = "default_plugin_name")]
    pub name: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            name: default_plugin_name(),
        }
    }
}

fn default_plugin_name() -> String {
    "DialogAPI".to_string()
}

/// Sniffer placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterceptorConfig {
    /// Stage the sniffer is inserted before.
    #[serde(default = "default_anchor")]
    pub anchor: String,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            anchor: default_anchor(),
        }
    }
}

fn default_anchor() -> String {
    DEFAULT_ANCHOR.to_string()
}

/// Tick loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Wall-clock length of one tick in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

fn default_tick_millis() -> u64 {
    50
}

/// Listener defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListenersConfig {
    /// Ticks after which an action's listener is stopped when the action
    /// does not choose its own timeout.
    #[serde(default = "default_timeout_ticks")]
    pub default_timeout_ticks: u64,
}

impl Default for ListenersConfig {
    fn default() -> Self {
        Self {
            default_timeout_ticks: default_timeout_ticks(),
        }
    }
}

fn default_timeout_ticks() -> u64 {
    200
}

// =============================================================================
// Logging
// =============================================================================

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` without it.
    Json,
}

/// Destination of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// How often the log file is rolled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Global level (`trace`, `debug`, `info`, `warn`, `error`).
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of the call site.
    #[serde(default)]
    pub file_location: bool,

    /// Log file when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-target levels, e.g. `dialogkit_core = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            rotation: LogRotation::default(),
            filters: BTreeMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Parses a case-insensitive level name.
pub fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DialogkitConfig::default();
        assert_eq!(config.plugin.name, "DialogAPI");
        assert_eq!(config.interceptor.anchor, "packet_handler");
        assert_eq!(config.scheduler.tick_millis, 50);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_level("warning"), Some(tracing::Level::WARN));
        assert_eq!(parse_level("loud"), None);
    }
}
