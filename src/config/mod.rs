//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Top-level [`Config`], bot identity and store settings
//! - [`gateway`]: Gateway session and REST API endpoints
//! - [`theme`]: Embed colors
//! - [`validation`]: Startup checks that collect every problem at once

mod defaults;
mod gateway;
mod theme;
mod types;
mod validation;

pub use gateway::{ApiConfig, GatewayConfig};
pub use theme::{Theme, ThemeConfig};
pub use types::{BotConfig, Config, ConfigError, LogFormat, LoggingConfig, StoreConfig};
pub use validation::{ValidationError, validate};
