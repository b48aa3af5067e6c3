//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DialogkitConfig, LogOutput, LoggingConfig, parse_level};

/// Validates the entire configuration.
pub fn validate_config(config: &DialogkitConfig) -> ConfigResult<()> {
    validate_plugin_name(&config.plugin.name)?;

    if config.interceptor.anchor.trim().is_empty() {
        return Err(ConfigError::missing_field("interceptor.anchor"));
    }

    if config.scheduler.tick_millis == 0 {
        return Err(ConfigError::validation(
            "scheduler.tick_millis must be greater than 0",
        ));
    }

    validate_logging_config(&config.logging)?;

    Ok(())
}

fn validate_plugin_name(name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::missing_field("plugin.name"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "plugin.name '{name}' cannot contain whitespace"
        )));
    }
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if parse_level(&logging.level).is_none() {
        return Err(ConfigError::unknown_level("logging.level", &logging.level));
    }

    for (target, level) in &logging.filters {
        if target.is_empty() {
            return Err(ConfigError::validation("logging.filters has an empty target"));
        }
        if parse_level(level).is_none() {
            return Err(ConfigError::unknown_level(
                format!("logging.filters.{target}"),
                level,
            ));
        }
    }

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&DialogkitConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_plugin_name() {
        let mut config = DialogkitConfig::default();
        config.plugin.name = "   ".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.plugin.name = "Dialog API".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_anchor_and_tick() {
        let mut config = DialogkitConfig::default();
        config.interceptor.anchor = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = DialogkitConfig::default();
        config.scheduler.tick_millis = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_log_levels() {
        let mut config = DialogkitConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::UnknownLogLevel { .. })
        ));

        let mut config = DialogkitConfig::default();
        config
            .logging
            .filters
            .insert("dialogkit_core".to_string(), "verbose".to_string());
        let err = validate_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown log level 'verbose' in logging.filters.dialogkit_core"
        );
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = DialogkitConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());
    }
}
