//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use stickyd_proto::{RoleId, UserId};
use thiserror::Error;

use super::defaults::{
    default_confirm_timeout, default_metrics_port, default_prefix, default_store_path,
};
use super::gateway::{ApiConfig, GatewayConfig};
use super::theme::ThemeConfig;

/// Environment variable that overrides `bot.token`.
pub const TOKEN_ENV: &str = "STICKYD_TOKEN";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and command settings.
    #[serde(default)]
    pub bot: BotConfig,
    /// Sticky document location.
    #[serde(default)]
    pub store: StoreConfig,
    /// Embed colors.
    #[serde(default)]
    pub theme: ThemeConfig,
    /// Gateway session settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            store: StoreConfig::default(),
            theme: ThemeConfig::default(),
            gateway: GatewayConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.with_token_override(std::env::var(TOKEN_ENV).ok()))
    }

    /// Replace the bot token when an override is present and non-empty.
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.bot.token = token;
        }
        self
    }
}

/// Bot identity and command surface.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Bot token. Usually supplied through `STICKYD_TOKEN`.
    #[serde(default)]
    pub token: String,
    /// Prefix for text commands (`^sticky ...`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Users allowed to manage sticky messages.
    #[serde(default)]
    pub admin_users: Vec<UserId>,
    /// Roles whose members may manage sticky messages.
    #[serde(default)]
    pub admin_roles: Vec<RoleId>,
    /// Seconds to wait for a delete confirmation.
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: default_prefix(),
            admin_users: Vec::new(),
            admin_roles: Vec::new(),
            confirm_timeout_secs: default_confirm_timeout(),
        }
    }
}

impl BotConfig {
    /// Whether an author with these roles may run administrative commands.
    pub fn is_admin(&self, user: &UserId, roles: &[RoleId]) -> bool {
        self.admin_users.contains(user) || roles.iter().any(|r| self.admin_roles.contains(r))
    }
}

/// Sticky document location.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON document.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Log output settings. Filtering is controlled by `RUST_LOG`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}
