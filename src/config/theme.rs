//! Embed color theme.

use serde::Deserialize;
use stickyd_proto::{ColorError, parse_hex_color};

use super::defaults::{default_error_color, default_primary_color};

/// Theme colors as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    /// Color of sticky message embeds.
    #[serde(default = "default_primary_color")]
    pub primary: String,
    /// Color of confirmation prompts for destructive commands.
    #[serde(default = "default_error_color")]
    pub error: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_color(),
            error: default_error_color(),
        }
    }
}

impl ThemeConfig {
    /// Parse both colors.
    pub fn resolve(&self) -> Result<Theme, ColorError> {
        Ok(Theme {
            primary: parse_hex_color(&self.primary)?,
            error: parse_hex_color(&self.error)?,
        })
    }
}

/// Parsed theme, ready to put on embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: u32,
    pub error: u32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: 0x0099ff,
            error: 0xff0000,
        }
    }
}
