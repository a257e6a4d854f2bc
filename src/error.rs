//! Unified error handling for stickyd.
//!
//! This module provides the error hierarchy shared by the sticky service and
//! the command layer, with static codes for metric labels and the text shown
//! back to whoever issued a command.

use stickyd_proto::ChannelId;
use thiserror::Error;

// ============================================================================
// Platform Errors (REST capability)
// ============================================================================

/// Failures of a platform call. Every call is best-effort; callers decide
/// whether a failure aborts their operation.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("not found")]
    NotFound,

    #[error("missing permissions")]
    Forbidden,

    #[error("rate limited, retry after {retry_after:.1}s")]
    RateLimited { retry_after: f64 },

    #[error("unexpected status {code}")]
    Status { code: u16 },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("platform error: {0}")]
    Other(String),
}

impl PlatformError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::RateLimited { .. } => "rate_limited",
            Self::Status { .. } => "status",
            Self::Http(_) => "http",
            Self::Other(_) => "other",
        }
    }
}

// ============================================================================
// Administration Errors (create / delete)
// ============================================================================

/// Errors reported to the actor of an administrative operation.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("no sticky named {0}")]
    NotFound(String),

    #[error("no sticky configured in channel {0}")]
    NoStickyInChannel(ChannelId),

    #[error("name {name} is already used in channel {channel}")]
    NameTaken { name: String, channel: ChannelId },

    #[error("channel {0} is not part of this guild")]
    ForeignChannel(ChannelId),

    #[error("failed to look up channel: {0}")]
    ChannelLookup(#[source] PlatformError),

    #[error("failed to send sticky message: {0}")]
    Send(#[source] PlatformError),
}

impl AdminError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::NoStickyInChannel(_) => "no_sticky",
            Self::NameTaken { .. } => "name_taken",
            Self::ForeignChannel(_) => "foreign_channel",
            Self::ChannelLookup(_) => "channel_lookup",
            Self::Send(_) => "send_failed",
        }
    }

    /// Render the reply shown to the command author.
    pub fn to_reply(&self) -> String {
        match self {
            Self::NotFound(name) => format!("No sticky message named **{name}** was found."),
            Self::NoStickyInChannel(channel) => {
                format!("There is no sticky message in {}.", channel.mention())
            }
            Self::NameTaken { name, channel } => format!(
                "The name **{name}** is already used by the sticky message in {}.",
                channel.mention()
            ),
            Self::ForeignChannel(channel) => {
                format!("{} is not a channel of this server.", channel.mention())
            }
            Self::ChannelLookup(PlatformError::Forbidden) => {
                "I can't see that channel.".to_string()
            }
            Self::ChannelLookup(e) => format!("Could not look up that channel: {e}"),
            Self::Send(PlatformError::Forbidden) => {
                "I don't have permission to send messages in that channel.".to_string()
            }
            Self::Send(e) => format!("Could not post the sticky message: {e}"),
        }
    }
}

// ============================================================================
// Command Errors (text command parsing)
// ============================================================================

/// Errors parsing a `sticky` text command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("missing subcommand")]
    MissingSubcommand,

    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("not enough parameters for {0}")]
    NeedMoreParams(&'static str),

    #[error("not a channel: {0}")]
    InvalidChannel(String),
}

impl CommandError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingSubcommand => "missing_subcommand",
            Self::UnknownSubcommand(_) => "unknown_subcommand",
            Self::NeedMoreParams(_) => "need_more_params",
            Self::InvalidChannel(_) => "invalid_channel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_error_codes() {
        assert_eq!(AdminError::NotFound("rules".into()).error_code(), "not_found");
        assert_eq!(
            AdminError::Send(PlatformError::Forbidden).error_code(),
            "send_failed"
        );
    }

    #[test]
    fn test_admin_error_replies_mention_channel() {
        let err = AdminError::NameTaken {
            name: "rules".into(),
            channel: ChannelId::new("10"),
        };
        assert!(err.to_reply().contains("<#10>"));
        assert!(err.to_reply().contains("**rules**"));
    }

    #[test]
    fn test_forbidden_send_has_permission_reply() {
        let reply = AdminError::Send(PlatformError::Forbidden).to_reply();
        assert!(reply.contains("permission"));
    }

    #[test]
    fn test_foreign_channel_reply() {
        let err = AdminError::ForeignChannel(ChannelId::new("999"));
        assert_eq!(err.error_code(), "foreign_channel");
        assert_eq!(err.to_reply(), "<#999> is not a channel of this server.");
        assert!(
            AdminError::ChannelLookup(PlatformError::Forbidden)
                .to_reply()
                .contains("can't see")
        );
    }

    #[test]
    fn test_platform_error_codes() {
        assert_eq!(PlatformError::NotFound.error_code(), "not_found");
        assert_eq!(
            PlatformError::RateLimited { retry_after: 1.5 }.error_code(),
            "rate_limited"
        );
        assert_eq!(PlatformError::Status { code: 500 }.error_code(), "status");
    }
}
