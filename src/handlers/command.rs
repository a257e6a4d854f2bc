//! `sticky` text command parsing.
//!
//! ```text
//! <prefix>sticky create <name> <#channel> <content...>
//! <prefix>sticky delete <name | #channel>
//! <prefix>sticky list
//! ```
//!
//! Content keeps its original spacing and line breaks.

use crate::error::CommandError;
use stickyd_proto::{ChannelId, parse_channel_mention};

/// A parsed `sticky` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StickyCommand {
    Create {
        name: String,
        channel: ChannelId,
        content: String,
    },
    Delete(DeleteTarget),
    List,
}

impl StickyCommand {
    /// Subcommand name, for metrics and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Delete(_) => "delete",
            Self::List => "list",
        }
    }
}

/// What a delete addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Name(String),
    /// Only the `<#id>` mention form; a bare number is treated as a name.
    Channel(ChannelId),
}

/// Parse `text` if it is a `sticky` command.
///
/// Returns `None` for ordinary messages, `Some(Err(_))` for malformed commands.
pub fn parse(prefix: &str, text: &str) -> Option<Result<StickyCommand, CommandError>> {
    let rest = text.trim_start().strip_prefix(prefix)?;
    let (word, rest) = next_token(rest)?;
    if !word.eq_ignore_ascii_case("sticky") {
        return None;
    }
    Some(parse_subcommand(rest))
}

fn parse_subcommand(input: &str) -> Result<StickyCommand, CommandError> {
    let (sub, rest) = next_token(input).ok_or(CommandError::MissingSubcommand)?;

    match sub.to_ascii_lowercase().as_str() {
        "create" => {
            let (name, rest) = next_token(rest).ok_or(CommandError::NeedMoreParams("create"))?;
            let (channel, rest) = next_token(rest).ok_or(CommandError::NeedMoreParams("create"))?;
            let channel = parse_channel_mention(channel)
                .ok_or_else(|| CommandError::InvalidChannel(channel.to_string()))?;
            let content = rest.trim();
            if content.is_empty() {
                return Err(CommandError::NeedMoreParams("create"));
            }
            Ok(StickyCommand::Create {
                name: name.to_string(),
                channel,
                content: content.to_string(),
            })
        }
        "delete" | "remove" => {
            let (target, _) = next_token(rest).ok_or(CommandError::NeedMoreParams("delete"))?;
            let target = if target.starts_with("<#") {
                DeleteTarget::Channel(
                    parse_channel_mention(target)
                        .ok_or_else(|| CommandError::InvalidChannel(target.to_string()))?,
                )
            } else {
                DeleteTarget::Name(target.to_string())
            };
            Ok(StickyCommand::Delete(target))
        }
        "list" => Ok(StickyCommand::List),
        other => Err(CommandError::UnknownSubcommand(other.to_string())),
    }
}

/// Split off the first whitespace-delimited token, leaving the remainder untrimmed.
fn next_token(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], &input[end..])),
        None => Some((input, "")),
    }
}

/// Usage text shown after a malformed command.
pub fn usage(prefix: &str) -> String {
    format!(
        "Usage:\n\
         `{prefix}sticky create <name> <#channel> <message>`\n\
         `{prefix}sticky delete <name | #channel>`\n\
         `{prefix}sticky list`"
    )
}
