//! Inbound message handling.
//!
//! Every guild message from a human goes through [`EventHandler::handle`]:
//!
//! 1. an answer to a pending delete prompt is consumed,
//! 2. otherwise a `sticky` command is parsed and run for authorized actors,
//! 3. and finally the message counts as traffic for its channel's sticky.

mod command;
mod confirm;

pub use command::{DeleteTarget, StickyCommand, parse, usage};
pub use confirm::{Confirmations, Decision, PendingConfirmation};

use crate::config::{BotConfig, Theme};
use crate::error::{AdminError, CommandError};
use crate::metrics;
use crate::platform::Platform;
use crate::sticky::StickyService;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use stickyd_proto::{ChannelId, CreateMessage, Embed, GuildId, MessageCreate};
use tracing::{debug, info, warn};

pub struct EventHandler {
    service: Arc<StickyService>,
    platform: Arc<dyn Platform>,
    confirmations: Confirmations,
    bot: BotConfig,
    theme: Theme,
}

/// The command author and where they spoke.
struct Invocation {
    guild: GuildId,
    channel: ChannelId,
    message: MessageCreate,
}

impl EventHandler {
    pub fn new(
        service: Arc<StickyService>,
        platform: Arc<dyn Platform>,
        bot: BotConfig,
        theme: Theme,
    ) -> Self {
        Self {
            service,
            platform,
            confirmations: Confirmations::new(),
            bot,
            theme,
        }
    }

    /// Handle one `MESSAGE_CREATE` dispatch.
    pub async fn handle(self: &Arc<Self>, message: MessageCreate) {
        if message.is_from_bot() {
            return;
        }
        let Some(guild) = message.guild_id.clone() else {
            return;
        };
        let channel = message.channel_id.clone();

        let answered = self
            .confirmations
            .resolve(&channel, &message.author.id, &message.content);

        let mut posted_here = false;
        if !answered
            && let Some(parsed) = parse(&self.bot.prefix, &message.content)
        {
            let invocation = Invocation {
                guild: guild.clone(),
                channel: channel.clone(),
                message,
            };
            posted_here = self.run_command(invocation, parsed).await;
        }

        // A create in this channel has just posted the freshest copy.
        if !posted_here {
            self.service.on_inbound_message(&guild, &channel).await;
        }
    }

    /// Run a command, returning whether it posted a sticky copy into the
    /// channel it was typed in.
    async fn run_command(
        self: &Arc<Self>,
        invocation: Invocation,
        parsed: Result<StickyCommand, CommandError>,
    ) -> bool {
        let author = &invocation.message.author.id;
        if !self.bot.is_admin(author, invocation.message.roles()) {
            debug!(user = %author, channel = %invocation.channel, "Refusing sticky command from non-admin");
            metrics::record_command("any", "denied");
            self.reply(
                &invocation.channel,
                "You don't have permission to manage sticky messages.",
            )
            .await;
            return false;
        }

        let command = match parsed {
            Ok(command) => command,
            Err(e) => {
                metrics::record_command("invalid", e.error_code());
                let text = format!("{e}.\n{}", usage(&self.bot.prefix));
                self.reply(&invocation.channel, &text).await;
                return false;
            }
        };

        info!(
            user = %author,
            guild = %invocation.guild,
            command = command.name(),
            "Running sticky command"
        );

        match command {
            StickyCommand::Create {
                name,
                channel,
                content,
            } => {
                let created = self.create(&invocation, &name, &channel, &content).await;
                created && channel == invocation.channel
            }
            StickyCommand::Delete(target) => {
                self.prompt_delete(invocation, target).await;
                false
            }
            StickyCommand::List => {
                self.list(&invocation).await;
                false
            }
        }
    }

    /// Returns whether the sticky was created.
    async fn create(
        &self,
        invocation: &Invocation,
        name: &str,
        channel: &ChannelId,
        content: &str,
    ) -> bool {
        match self
            .service
            .create(&invocation.guild, channel, name, content)
            .await
        {
            Ok(_) => {
                metrics::record_command("create", "ok");
                let text = format!(
                    "Sticky message **{name}** created in {}.",
                    channel.mention()
                );
                self.reply(&invocation.channel, &text).await;
                true
            }
            Err(e) => {
                metrics::record_command("create", e.error_code());
                self.reply(&invocation.channel, &e.to_reply()).await;
                false
            }
        }
    }

    async fn list(&self, invocation: &Invocation) {
        metrics::record_command("list", "ok");
        let stickies = self.service.list(&invocation.guild);
        if stickies.is_empty() {
            self.reply(&invocation.channel, "No sticky messages are configured.")
                .await;
            return;
        }

        let mut text = String::from("**Sticky messages**\n");
        for (channel, record) in &stickies {
            let _ = writeln!(text, "**{}** in {}", record.name, channel.mention());
        }
        self.reply(&invocation.channel, text.trim_end()).await;
    }

    /// Ask for confirmation, then delete on a separate task.
    ///
    /// The prompt waits independently of the message that opened it, so the
    /// command message still counts as channel traffic right away.
    async fn prompt_delete(self: &Arc<Self>, invocation: Invocation, target: DeleteTarget) {
        let described = match &target {
            DeleteTarget::Name(name) => match self.service.find_by_name(&invocation.guild, name) {
                Some((channel, _)) => format!("**{name}** in {}", channel.mention()),
                None => {
                    let e = AdminError::NotFound(name.clone());
                    metrics::record_command("delete", e.error_code());
                    self.reply(&invocation.channel, &e.to_reply()).await;
                    return;
                }
            },
            DeleteTarget::Channel(channel) => {
                match self.service.store().get(&invocation.guild, channel) {
                    Some(record) => format!("**{}** in {}", record.name, channel.mention()),
                    None => {
                        let e = AdminError::NoStickyInChannel(channel.clone());
                        metrics::record_command("delete", e.error_code());
                        self.reply(&invocation.channel, &e.to_reply()).await;
                        return;
                    }
                }
            }
        };

        let pending = self.confirmations.register(
            invocation.channel.clone(),
            invocation.message.author.id.clone(),
        );
        let prompt = format!(
            "Delete the sticky message {described}? Reply `yes` to confirm or `no` to cancel."
        );
        self.prompt(&invocation.channel, &prompt).await;

        let handler = Arc::clone(self);
        let timeout = Duration::from_secs(self.bot.confirm_timeout_secs);
        tokio::spawn(async move {
            let decision = handler.confirmations.wait(pending, timeout).await;
            handler.finish_delete(&invocation, target, decision).await;
        });
    }

    async fn finish_delete(&self, invocation: &Invocation, target: DeleteTarget, decision: Decision) {
        match decision {
            Decision::Confirmed => {}
            Decision::Cancelled => {
                metrics::record_command("delete", "cancelled");
                self.reply(&invocation.channel, "Deletion cancelled.").await;
                return;
            }
            Decision::TimedOut => {
                metrics::record_command("delete", "timed_out");
                self.reply(&invocation.channel, "Deletion timed out.").await;
                return;
            }
        }

        let result = match &target {
            DeleteTarget::Name(name) => self
                .service
                .delete_by_name(&invocation.guild, name)
                .await
                .map(|_| name.clone()),
            DeleteTarget::Channel(channel) => self
                .service
                .delete_by_channel(&invocation.guild, channel)
                .await
                .map(|record| record.name),
        };

        match result {
            Ok(name) => {
                metrics::record_command("delete", "ok");
                let text = format!("Sticky message **{name}** deleted.");
                self.reply(&invocation.channel, &text).await;
            }
            Err(e) => {
                metrics::record_command("delete", e.error_code());
                self.reply(&invocation.channel, &e.to_reply()).await;
            }
        }
    }

    async fn reply(&self, channel: &ChannelId, text: &str) {
        self.send(channel, CreateMessage::text(text)).await;
    }

    /// The delete prompt: one embed in the error color.
    async fn prompt(&self, channel: &ChannelId, text: &str) {
        let embed = Embed::described(text, self.theme.error).with_title("Confirm deletion");
        self.send(channel, CreateMessage::embed(embed)).await;
    }

    async fn send(&self, channel: &ChannelId, message: CreateMessage) {
        if let Err(e) = self.platform.send_message(channel, &message).await {
            metrics::record_platform_error("reply", e.error_code());
            warn!(channel = %channel, error = %e, "Failed to send command reply");
        }
    }
}
