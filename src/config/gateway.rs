//! Gateway session and REST API configuration.

use serde::Deserialize;
use std::time::Duration;

use super::defaults::{
    default_api_base_url, default_api_timeout, default_gateway_url, default_intents,
    default_reconnect_max_ms, default_reconnect_min_ms,
};

/// Gateway websocket settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Websocket URL including version and encoding query.
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Intent bitfield sent on identify.
    #[serde(default = "default_intents")]
    pub intents: u64,
    /// First reconnect delay in milliseconds; doubles per failure.
    #[serde(default = "default_reconnect_min_ms")]
    pub reconnect_min_ms: u64,
    /// Upper bound for the reconnect delay.
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            intents: default_intents(),
            reconnect_min_ms: default_reconnect_min_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }
}

impl GatewayConfig {
    /// Reconnect delay after `failures` consecutive failed sessions (without jitter).
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 1u64.checked_shl(failures.min(16)).unwrap_or(u64::MAX);
        let ms = self
            .reconnect_min_ms
            .saturating_mul(factor)
            .min(self.reconnect_max_ms);
        Duration::from_millis(ms)
    }
}

/// REST API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the API version.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}
