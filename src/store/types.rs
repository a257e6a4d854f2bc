//! Type definitions for the sticky document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use stickyd_proto::{ChannelId, GuildId, MessageId};

/// One channel's sticky configuration.
///
/// Serialized with the field names the document has always used
/// (`name`, `content`, `lastMessageId`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyRecord {
    /// Handle used to delete the sticky; unique within a guild.
    pub name: String,
    /// Body re-posted on every refresh.
    pub content: String,
    /// Most recent copy posted by stickyd, if any send has succeeded.
    #[serde(default)]
    pub last_message_id: Option<MessageId>,
}

impl StickyRecord {
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        last_message_id: Option<MessageId>,
    ) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            last_message_id,
        }
    }
}

/// Records of one guild, ordered by channel id.
pub type GuildStickies = BTreeMap<ChannelId, StickyRecord>;

/// The whole persisted document: guild → channel → record.
pub type Document = BTreeMap<GuildId, GuildStickies>;
