//! Network module.
//!
//! Contains the gateway websocket session that feeds inbound messages to the
//! event handler.

mod gateway;

pub use gateway::{GatewayClient, SessionEnd};

use thiserror::Error;

/// Failures of a gateway session.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("no HELLO within {0:?}")]
    HelloTimeout(std::time::Duration),

    #[error("gateway refused the session ({code}): {reason}")]
    Fatal { code: u16, reason: String },
}

impl GatewayError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::WebSocket(_) => "websocket",
            Self::Json(_) => "json",
            Self::Protocol(_) => "protocol",
            Self::HelloTimeout(_) => "hello_timeout",
            Self::Fatal { .. } => "fatal",
        }
    }

    /// Whether reconnecting can't help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}
