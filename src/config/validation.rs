//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use stickyd_proto::parse_hex_color;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bot.token is required (set it in the file or via STICKYD_TOKEN)")]
    MissingToken,
    #[error("bot.prefix must not be empty or contain whitespace")]
    InvalidPrefix,
    #[error("bot.confirm_timeout_secs must be greater than zero")]
    ZeroConfirmTimeout,
    #[error("theme.{field} is not a valid hex color: '{value}'")]
    InvalidColor { field: &'static str, value: String },
    #[error("store.path parent directory does not exist: {0}")]
    StorePathInvalid(String),
    #[error("gateway.reconnect_min_ms must be > 0 and <= reconnect_max_ms")]
    InvalidBackoff,
    #[error("api.timeout_secs must be greater than zero")]
    ZeroApiTimeout,
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bot.token.trim().is_empty() {
        errors.push(ValidationError::MissingToken);
    }
    if config.bot.prefix.is_empty() || config.bot.prefix.chars().any(char::is_whitespace) {
        errors.push(ValidationError::InvalidPrefix);
    }
    if config.bot.confirm_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConfirmTimeout);
    }

    for (field, value) in [
        ("primary", &config.theme.primary),
        ("error", &config.theme.error),
    ] {
        if parse_hex_color(value).is_err() {
            errors.push(ValidationError::InvalidColor {
                field,
                value: value.clone(),
            });
        }
    }

    let store_path = Path::new(&config.store.path);
    if let Some(parent) = store_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::StorePathInvalid(config.store.path.clone()));
    }

    if config.gateway.reconnect_min_ms == 0
        || config.gateway.reconnect_min_ms > config.gateway.reconnect_max_ms
    {
        errors.push(ValidationError::InvalidBackoff);
    }
    if config.api.timeout_secs == 0 {
        errors.push(ValidationError::ZeroApiTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[bot]
token = "test-token"
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_token_fails() {
        let config: Config = toml::from_str("").unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingToken)));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let toml = r##"
[bot]
token = ""
prefix = ""
confirm_timeout_secs = 0

[theme]
primary = "#zzzzzz"
error = "red"

[store]
path = "/nonexistent/dir/stickies.json"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingToken)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidPrefix)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroConfirmTimeout)));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidColor { field: "primary", .. }
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ValidationError::InvalidColor { field: "error", .. }
        )));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::StorePathInvalid(_))));
    }

    #[test]
    fn test_inverted_backoff_fails() {
        let toml = r#"
[bot]
token = "t"

[gateway]
reconnect_min_ms = 5000
reconnect_max_ms = 100
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidBackoff)));
    }
}
