//! Configuration validation utilities.

use std::collections::HashSet;

use yoai_core::BotCommand;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ApiConfig, LogOutput, LoggingConfig, PollingConfig, YoaiConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &YoaiConfig) -> ConfigResult<()> {
    validate_api_config(&config.api)?;
    validate_polling_config(&config.polling)?;
    validate_logging_config(&config.logging)?;
    validate_commands(&config.commands)?;
    Ok(())
}

fn validate_api_config(api: &ApiConfig) -> ConfigResult<()> {
    if api.api_key.trim().is_empty() {
        return Err(ConfigError::missing_field("api.api_key"));
    }

    validate_url(&api.base_url)?;

    if api.timeout_ms == 0 {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }

    Ok(())
}

fn validate_polling_config(polling: &PollingConfig) -> ConfigResult<()> {
    if polling.interval_secs == 0 {
        return Err(ConfigError::validation(
            "Polling interval must be greater than 0",
        ));
    }

    if polling.cooldown_secs == 0 {
        return Err(ConfigError::validation(
            "Polling cooldown must be greater than 0",
        ));
    }

    if polling.cooldown_secs <= polling.interval_secs {
        return Err(ConfigError::validation(
            "Polling cooldown must be longer than the polling interval",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module cannot be empty"));
    }

    Ok(())
}

fn validate_commands(commands: &[BotCommand]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for command in commands {
        let name = command.command.as_str();
        if name.is_empty() {
            return Err(ConfigError::missing_field("commands.command"));
        }
        if name.starts_with('/') {
            return Err(ConfigError::validation(format!(
                "Command '{name}' must be given without the leading '/'"
            )));
        }
        if name.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Command '{name}' cannot contain whitespace"
            )));
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateCommand(name.to_string()));
        }
    }

    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("api.base_url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}
