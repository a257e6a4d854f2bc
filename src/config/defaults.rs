//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

use stickyd_proto::intents;

// =============================================================================
// Bot Defaults
// =============================================================================

/// Command prefix used by the original bot deployment.
pub fn default_prefix() -> String {
    "^".to_string()
}

/// Seconds to wait for a yes/no answer on destructive commands.
pub fn default_confirm_timeout() -> u64 {
    60
}

pub fn default_metrics_port() -> u16 {
    9090
}

// =============================================================================
// Store Defaults
// =============================================================================

pub fn default_store_path() -> String {
    "stickyMessages.json".to_string()
}

// =============================================================================
// Theme Defaults
// =============================================================================

pub fn default_primary_color() -> String {
    "#0099ff".to_string()
}

pub fn default_error_color() -> String {
    "#ff0000".to_string()
}

// =============================================================================
// Gateway / API Defaults
// =============================================================================

pub fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}

pub fn default_intents() -> u64 {
    intents::DEFAULT
}

pub fn default_reconnect_min_ms() -> u64 {
    1_000
}

pub fn default_reconnect_max_ms() -> u64 {
    60_000
}

pub fn default_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

pub fn default_api_timeout() -> u64 {
    10
}
