//! Gateway frames.
//!
//! Every gateway frame is a JSON object `{ op, d, s, t }`. Only the opcodes
//! and dispatch events stickyd reacts to are modelled; everything else stays
//! as a raw [`serde_json::Value`] in `d`.

use crate::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway opcodes.
pub mod opcode {
    /// An event was dispatched.
    pub const DISPATCH: u8 = 0;
    /// Keepalive, sent by either side.
    pub const HEARTBEAT: u8 = 1;
    /// Start a new session.
    pub const IDENTIFY: u8 = 2;
    /// The server asks the client to reconnect.
    pub const RECONNECT: u8 = 7;
    /// The session was invalidated.
    pub const INVALID_SESSION: u8 = 9;
    /// First frame after connecting; carries the heartbeat interval.
    pub const HELLO: u8 = 10;
    /// Acknowledges a heartbeat.
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Gateway intent bits.
pub mod intents {
    /// Guild create/update/delete and channel events.
    pub const GUILDS: u64 = 1 << 0;
    /// Messages posted in guild channels.
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    /// Access to message content (privileged).
    pub const MESSAGE_CONTENT: u64 = 1 << 15;
    /// Everything stickyd needs.
    pub const DEFAULT: u64 = GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT;
}

/// A raw gateway frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    /// Opcode (see [`opcode`]).
    pub op: u8,
    /// Event data.
    #[serde(default)]
    pub d: Option<Value>,
    /// Sequence number, only on dispatches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    /// Event name, only on dispatches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    /// Build a heartbeat carrying the last seen sequence number.
    pub fn heartbeat(last_seq: Option<u64>) -> Self {
        Self {
            op: opcode::HEARTBEAT,
            d: Some(last_seq.map(Value::from).unwrap_or(Value::Null)),
            s: None,
            t: None,
        }
    }

    /// Build an identify frame.
    pub fn identify(identify: &Identify) -> Self {
        Self {
            op: opcode::IDENTIFY,
            d: serde_json::to_value(identify).ok(),
            s: None,
            t: None,
        }
    }

    /// Whether this frame is a dispatch of the named event.
    pub fn is_dispatch(&self, event: &str) -> bool {
        self.op == opcode::DISPATCH && self.t.as_deref() == Some(event)
    }

    /// Decode `d` into a typed body.
    pub fn data<T: for<'de> Deserialize<'de>>(&self) -> Option<T> {
        self.d
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }
}

/// Body of the HELLO frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Hello {
    /// Milliseconds between heartbeats.
    pub heartbeat_interval: u64,
}

/// Body of the IDENTIFY frame.
#[derive(Debug, Clone, Serialize)]
pub struct Identify {
    /// Bot token (without the `Bot ` prefix).
    pub token: String,
    /// Intent bitfield.
    pub intents: u64,
    /// Client properties.
    pub properties: IdentifyProperties,
}

impl Identify {
    /// Identify with the given token and intents.
    pub fn new(token: impl Into<String>, intents: u64) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: IdentifyProperties::default(),
        }
    }
}

/// Connection properties reported on identify.
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyProperties {
    /// Operating system.
    pub os: String,
    /// Library name.
    pub browser: String,
    /// Library name.
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "stickyd".to_string(),
            device: "stickyd".to_string(),
        }
    }
}

/// Message author.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Author {
    /// User id.
    pub id: UserId,
    /// Set for bot accounts.
    #[serde(default)]
    pub bot: Option<bool>,
}

/// Guild member attached to guild messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Member {
    /// Role ids held by the author.
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// The `MESSAGE_CREATE` dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageCreate {
    /// Message id.
    pub id: MessageId,
    /// Channel it was posted in.
    pub channel_id: ChannelId,
    /// Guild, absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// Who posted it.
    pub author: Author,
    /// Text content (empty without the MESSAGE_CONTENT intent).
    #[serde(default)]
    pub content: String,
    /// Member data, present for guild messages.
    #[serde(default)]
    pub member: Option<Member>,
}

impl MessageCreate {
    /// Whether a bot account (including stickyd itself) posted this.
    pub fn is_from_bot(&self) -> bool {
        self.author.bot.unwrap_or(false)
    }

    /// Roles of the author, empty outside guilds.
    pub fn roles(&self) -> &[RoleId] {
        self.member.as_ref().map(|m| m.roles.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_message_create_dispatch() {
        let raw = r#"{
            "op": 0, "s": 42, "t": "MESSAGE_CREATE",
            "d": {
                "id": "200", "channel_id": "10", "guild_id": "1",
                "author": {"id": "7", "username": "alice"},
                "content": "hello",
                "member": {"roles": ["99"]}
            }
        }"#;
        let frame: GatewayPayload = serde_json::from_str(raw).unwrap();
        assert!(frame.is_dispatch("MESSAGE_CREATE"));
        assert_eq!(frame.s, Some(42));

        let msg: MessageCreate = frame.data().unwrap();
        assert_eq!(msg.channel_id, ChannelId::new("10"));
        assert_eq!(msg.guild_id, Some(GuildId::new("1")));
        assert!(!msg.is_from_bot());
        assert_eq!(msg.roles(), &[RoleId::new("99")]);
    }

    #[test]
    fn bot_flag_is_respected() {
        let raw = r#"{"id":"1","channel_id":"2","author":{"id":"3","bot":true}}"#;
        let msg: MessageCreate = serde_json::from_str(raw).unwrap();
        assert!(msg.is_from_bot());
        assert!(msg.guild_id.is_none());
        assert!(msg.roles().is_empty());
    }

    #[test]
    fn hello_body_decodes() {
        let frame: GatewayPayload =
            serde_json::from_str(r#"{"op":10,"d":{"heartbeat_interval":41250}}"#).unwrap();
        assert_eq!(frame.op, opcode::HELLO);
        let hello: Hello = frame.data().unwrap();
        assert_eq!(hello.heartbeat_interval, 41250);
    }

    #[test]
    fn heartbeat_carries_sequence_or_null() {
        let json = serde_json::to_value(GatewayPayload::heartbeat(Some(5))).unwrap();
        assert_eq!(json, serde_json::json!({"op": 1, "d": 5}));

        let json = serde_json::to_value(GatewayPayload::heartbeat(None)).unwrap();
        assert_eq!(json, serde_json::json!({"op": 1, "d": null}));
    }

    #[test]
    fn identify_frame_shape() {
        let frame = GatewayPayload::identify(&Identify::new("tok", intents::DEFAULT));
        assert_eq!(frame.op, opcode::IDENTIFY);
        let d = frame.d.unwrap();
        assert_eq!(d["token"], "tok");
        assert_eq!(d["intents"], intents::DEFAULT);
        assert_eq!(d["properties"]["browser"], "stickyd");
    }
}
