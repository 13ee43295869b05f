//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    BotConfig, ExtensionsConfig, KeepAliveConfig, LogOutput, LoggingConfig, WardenConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &WardenConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_extensions_config(&config.extensions)?;
    validate_logging_config(&config.logging)?;
    validate_keep_alive_config(&config.keep_alive)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.default_prefix.is_empty() {
        return Err(ConfigError::validation("Default prefix cannot be empty"));
    }

    if bot.prefix_lookup_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Prefix lookup timeout must be greater than 0",
        ));
    }

    if bot.color > 0xFF_FF_FF {
        return Err(ConfigError::validation(format!(
            "Colour {:#x} is not a 24-bit RGB value",
            bot.color
        )));
    }

    if let Some(name) = bot
        .restricted_allow_list
        .iter()
        .find(|name| name.is_empty() || name.contains(char::is_whitespace))
    {
        return Err(ConfigError::validation(format!(
            "Invalid command name in restricted allow-list: {name:?}"
        )));
    }

    Ok(())
}

fn validate_extensions_config(extensions: &ExtensionsConfig) -> ConfigResult<()> {
    if extensions.folder.is_empty() {
        return Err(ConfigError::validation("Extension folder cannot be empty"));
    }

    if extensions.file_extension.is_empty() || extensions.file_extension.starts_with('.') {
        return Err(ConfigError::validation(
            "Extension file extension must be non-empty and given without the dot",
        ));
    }

    let denied: HashSet<&str> = extensions.denylist.iter().map(String::as_str).collect();
    if let Some(id) = extensions
        .preloaded
        .iter()
        .find(|id| denied.contains(id.as_str()))
    {
        return Err(ConfigError::validation(format!(
            "Extension {id} is both preloaded and denied"
        )));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "File log output requires logging.file_path",
        ));
    }

    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation("Log filter module cannot be empty"));
    }

    Ok(())
}

fn validate_keep_alive_config(keep_alive: &KeepAliveConfig) -> ConfigResult<()> {
    if !keep_alive.enabled {
        return Ok(());
    }

    if keep_alive.port == 0 {
        return Err(ConfigError::validation(
            "Keep-alive port must be greater than 0",
        ));
    }

    if keep_alive.host.is_empty() {
        return Err(ConfigError::validation("Keep-alive host cannot be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::schema::LogLevel;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&WardenConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = WardenConfig::default();
        config.bot.prefix_lookup_timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = WardenConfig::default();
        config.bot.default_prefix.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_colour_range() {
        let mut config = WardenConfig::default();
        config.bot.color = 0x1_00_00_00;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_preloaded_and_denied() {
        let mut config = WardenConfig::default();
        config.extensions.preloaded.push("cogs.db_handler".to_string());
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("cogs.db_handler"));
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = WardenConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some(PathBuf::from("discord.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_filter_module() {
        let mut config = WardenConfig::default();
        config.logging.filters.insert(" ".to_string(), LogLevel::Debug);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_keep_alive_port_only_when_enabled() {
        let mut config = WardenConfig::default();
        config.keep_alive.port = 0;
        assert!(validate_config(&config).is_ok());

        config.keep_alive.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
