//! Error types for the protocol crate.

use thiserror::Error;

/// Errors from parsing a theme color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ColorError {
    /// The value did not contain exactly six hex digits.
    #[error("expected 6 hex digits, got {0} characters")]
    Length(usize),

    /// A character outside `[0-9a-fA-F]` was found.
    #[error("invalid hex digit in color: {0:?}")]
    InvalidDigit(String),
}
