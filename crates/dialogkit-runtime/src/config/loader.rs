//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config`: enables TOML configuration files (`dialogkit.toml`)
//!
//! Without it, only defaults, environment variables and programmatic values
//! are used.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults, replaced wholesale by [`ConfigLoader::merge`]
//! 2. Profile-specific config file (`dialogkit.{profile}.toml`)
//! 3. Main config file (`dialogkit.toml`)
//! 4. Environment variables (`DIALOGKIT_*`)
//! 5. Single values from [`ConfigLoader::set`]
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `DIALOGKIT_` prefix with `__` as separator:
//!
//! - `DIALOGKIT_PLUGIN__NAME=MyPlugin` → `plugin.name = "MyPlugin"`
//! - `DIALOGKIT_SCHEDULER__TICK_MILLIS=20` → `scheduler.tick_millis = 20`
//! - `DIALOGKIT_LOGGING__FILTERS__DIALOGKIT_CORE=debug` → `logging.filters.dialogkit_core = "debug"`
//!
//! `DIALOGKIT_PROFILE` selects the profile.
//!
//! # Example
//!
//! ```rust,ignore
//! use dialogkit_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .set("plugin.name", "MyPlugin")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::DialogkitConfig;

const ENV_PREFIX: &str = "DIALOGKIT_";
const PROFILE_VAR: &str = "DIALOGKIT_PROFILE";
const FILE_STEM: &str = "dialogkit";
const FILE_EXT: &str = "toml";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name, accepting `dev` and `prod` shorthands.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `DIALOGKIT_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    base: Option<DialogkitConfig>,
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that reads the profile and variables from the
    /// environment and searches the default locations.
    pub fn new() -> Self {
        Self {
            base: None,
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for `dialogkit.toml`.
    ///
    /// Once any path is added, the default locations are no longer searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds `<user config dir>/dialogkit` to search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join(FILE_STEM)),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Uses `config` in place of the built-in defaults.
    ///
    /// Files and environment variables still override it.
    pub fn merge(mut self, config: DialogkitConfig) -> Self {
        self.base = Some(config);
        self
    }

    /// Overrides a single value by its dotted path, above every other source.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<DialogkitConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: DialogkitConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("Failed to extract configuration: {e}")))?;

        debug!(
            profile = %profile,
            plugin = %config.plugin.name,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let base = self.base.take().unwrap_or_default();
        let mut figment = Figment::from(Serialized::defaults(base));

        if let Some(path) = self.config_file.clone() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            FILE_EXT => Ok(figment.merge(Toml::file(path))),
            _ => {
                let _ = figment;
                Err(ConfigError::ParseError(format!(
                    "Unsupported or disabled configuration file format: .{ext}"
                )))
            }
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(FILE_STEM));
        }
        paths
    }

    /// Merges the profile file and then the main file from the first search
    /// path that has a main file.
    fn load_config_files(&self, figment: Figment) -> Figment {
        #[cfg(feature = "toml-config")]
        {
            let mut figment = figment;
            let main_name = format!("{FILE_STEM}.{FILE_EXT}");
            let profile_name = format!("{FILE_STEM}.{}.{FILE_EXT}", self.profile.as_str());
            for dir in self.resolve_search_paths() {
                let profile_path = dir.join(&profile_name);
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = figment.merge(Toml::file(&profile_path));
                }
                let main_path = dir.join(&main_name);
                if main_path.exists() {
                    info!(path = %main_path.display(), "Loading configuration file");
                    return figment.merge(Toml::file(&main_path));
                }
            }
            warn!("No configuration file found, using defaults");
            figment
        }

        #[cfg(not(feature = "toml-config"))]
        {
            debug!(
                paths = self.resolve_search_paths().len(),
                "TOML support disabled, skipping configuration files"
            );
            figment
        }
    }
}

/// Loads configuration from the current directory and environment.
pub fn load_config() -> ConfigResult<DialogkitConfig> {
    ConfigLoader::new().with_current_dir().load()
}

/// Loads configuration from `path` plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<DialogkitConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated() -> (tempfile::TempDir, ConfigLoader) {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new()
            .without_env()
            .profile("development")
            .search_path(dir.path());
        (dir, loader)
    }

    #[test]
    fn test_default_config() {
        let (_dir, loader) = isolated();
        let config = loader.load().unwrap();
        assert_eq!(config, DialogkitConfig::default());
    }

    #[test]
    fn test_set_overrides_merge() {
        let (_dir, loader) = isolated();
        let mut base = DialogkitConfig::default();
        base.plugin.name = "Base".to_string();
        base.scheduler.tick_millis = 10;

        let config = loader
            .merge(base)
            .set("plugin.name", "Override")
            .load()
            .unwrap();
        assert_eq!(config.plugin.name, "Override");
        assert_eq!(config.scheduler.tick_millis, 10);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/dialogkit.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("DEV"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_layering() {
        let (dir, loader) = isolated();
        std::fs::write(
            dir.path().join("dialogkit.development.toml"),
            "[plugin]\nname = \"FromProfile\"\n[scheduler]\ntick_millis = 25\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("dialogkit.toml"),
            "[plugin]\nname = \"FromMain\"\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.plugin.name, "FromMain");
        assert_eq!(config.scheduler.tick_millis, 25);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.interceptor.anchor, "packet_handler");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_malformed_file_is_parse_error() {
        let (dir, loader) = isolated();
        std::fs::write(dir.path().join("dialogkit.toml"), "[scheduler]\ntick_millis = \"fast\"\n")
            .unwrap();
        assert!(matches!(loader.load(), Err(ConfigError::ParseError(_))));
    }
}
