//! Platform client capability.
//!
//! The sticky service never talks to the network directly; it calls these
//! operations, each of which may fail independently. Whether a
//! failure matters is decided by the caller.

use crate::error::PlatformError;
use async_trait::async_trait;
use stickyd_proto::{Channel, ChannelId, CreateMessage, Message, MessageId};

pub mod discord;
#[cfg(test)]
pub mod mock;

pub use discord::DiscordRest;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Post a message, returning the created message.
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: &CreateMessage,
    ) -> Result<Message, PlatformError>;

    /// Look up a message. A message that no longer exists is `Ok(None)`.
    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<Option<Message>, PlatformError>;

    /// Look up a channel. A channel that doesn't exist or is out of reach
    /// is `Ok(None)`.
    async fn fetch_channel(&self, channel: &ChannelId) -> Result<Option<Channel>, PlatformError>;

    /// Delete a message.
    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), PlatformError>;
}
