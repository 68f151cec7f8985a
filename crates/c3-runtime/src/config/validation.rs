//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{C3Config, CommandsConfig, DisplayConfig, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &C3Config) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_commands_config(&config.commands)?;
    validate_display_config(&config.display)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Log filter module name cannot be empty: {module:?}"
        )));
    }
    Ok(())
}

fn validate_commands_config(commands: &CommandsConfig) -> ConfigResult<()> {
    if commands.extensions.is_empty() {
        return Err(ConfigError::validation(
            "At least one declaration file extension is required",
        ));
    }

    if commands
        .extensions
        .iter()
        .any(|ext| ext.is_empty() || ext.starts_with('.'))
    {
        return Err(ConfigError::validation(
            "Declaration extensions must be non-empty and written without a leading '.'",
        ));
    }

    Ok(())
}

fn validate_display_config(display: &DisplayConfig) -> ConfigResult<()> {
    if display.width == 0 {
        return Err(ConfigError::validation(
            "Display width must be greater than 0",
        ));
    }
    Ok(())
}
