//! # stickyd-proto
//!
//! Wire types for the subset of the Discord API that stickyd speaks:
//! gateway frames, the `MESSAGE_CREATE` dispatch, REST message bodies,
//! and the string-backed snowflake identifiers that tie them together.
//!
//! Nothing in this crate performs I/O.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod color;
pub mod error;
pub mod gateway;
pub mod id;
pub mod rest;

pub use color::parse_hex_color;
pub use error::ColorError;
pub use gateway::{GatewayPayload, Hello, Identify, MessageCreate, intents, opcode};
pub use id::{ChannelId, GuildId, MessageId, RoleId, UserId, parse_channel_mention};
pub use rest::{Channel, CreateMessage, Embed, Message};
