//! REST message bodies.

use crate::id::{ChannelId, GuildId, MessageId};
use serde::{Deserialize, Serialize};

/// A rich embed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Bold heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sidebar color as `0xRRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
}

impl Embed {
    /// An embed with only a description and color.
    pub fn described(description: impl Into<String>, color: u32) -> Self {
        Self {
            title: None,
            description: Some(description.into()),
            color: Some(color),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Body of `POST /channels/{channel}/messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateMessage {
    /// Plain text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Attached embeds.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl CreateMessage {
    /// A plain text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    /// A message consisting of a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

/// The subset of a message object stickyd reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Channel the message lives in.
    pub channel_id: ChannelId,
}

/// The subset of a channel object stickyd reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel id.
    pub id: ChannelId,
    /// Owning guild, absent for direct message channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
}

impl Channel {
    /// Whether this channel belongs to `guild`.
    pub fn is_in(&self, guild: &GuildId) -> bool {
        self.guild_id.as_ref() == Some(guild)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_message_omits_empty_fields() {
        let body = CreateMessage::embed(Embed::described("Read the rules!", 0x0099ff));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"embeds": [{"description": "Read the rules!", "color": 0x0099ff}]})
        );
    }

    #[test]
    fn text_message_has_no_embeds_key() {
        let json = serde_json::to_value(CreateMessage::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"content": "hi"}));
    }

    #[test]
    fn message_ignores_unknown_fields() {
        let raw = r#"{"id":"200","channel_id":"10","content":"x","author":{"id":"1"}}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id, MessageId::new("200"));
    }

    #[test]
    fn channel_reports_its_guild() {
        let raw = r#"{"id":"10","type":0,"guild_id":"100","name":"general"}"#;
        let channel: Channel = serde_json::from_str(raw).unwrap();
        assert!(channel.is_in(&GuildId::new("100")));
        assert!(!channel.is_in(&GuildId::new("200")));

        let dm: Channel = serde_json::from_str(r#"{"id":"11","type":1}"#).unwrap();
        assert!(!dm.is_in(&GuildId::new("100")));
    }
}
