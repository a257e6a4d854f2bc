//! Refresh workflow.
//!
//! State per channel is `Idle -> Refreshing -> Idle`. A trigger for a channel
//! that is already refreshing is dropped, not queued: the next message after
//! the cycle ends starts a new one, so the sticky still converges without a
//! burst of delete/resend pairs under heavy traffic.

use super::StickyService;
use std::time::Instant;
use stickyd_proto::{ChannelId, GuildId, MessageId};
use tracing::{debug, warn};

/// Result of one inbound-message trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The channel has no sticky record.
    NoSticky,
    /// Another cycle holds the channel; the trigger was discarded.
    Dropped,
    /// A fresh copy was posted and recorded.
    Refreshed(MessageId),
    /// Posting failed; the stored id is left stale for the next cycle to clean up.
    SendFailed,
}

impl RefreshOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoSticky => "no_sticky",
            Self::Dropped => "dropped",
            Self::Refreshed(_) => "refreshed",
            Self::SendFailed => "send_failed",
        }
    }
}

impl StickyService {
    /// React to a user message in `channel`.
    pub async fn on_inbound_message(&self, guild: &GuildId, channel: &ChannelId) -> RefreshOutcome {
        if self.store.get(guild, channel).is_none() {
            return RefreshOutcome::NoSticky;
        }

        let Some(_guard) = self.locks.try_acquire(channel) else {
            debug!(guild = %guild, channel = %channel, "Refresh in flight, dropping trigger");
            crate::metrics::record_trigger_dropped();
            return RefreshOutcome::Dropped;
        };

        let started = Instant::now();
        let outcome = self.refresh(guild, channel).await;
        crate::metrics::record_refresh(outcome.label(), Some(started.elapsed().as_secs_f64()));
        outcome
    }

    /// One delete-old / send-new / persist cycle. Caller holds the channel.
    async fn refresh(&self, guild: &GuildId, channel: &ChannelId) -> RefreshOutcome {
        // An administrative delete may have won the channel before us.
        let Some(record) = self.store.get(guild, channel) else {
            return RefreshOutcome::NoSticky;
        };

        if let Some(old) = &record.last_message_id {
            self.delete_live(channel, old).await;
        }

        let sent = match self
            .platform
            .send_message(channel, &self.sticky_message(&record.content))
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                crate::metrics::record_platform_error("send", e.error_code());
                warn!(guild = %guild, channel = %channel, sticky = %record.name, error = %e, "Failed to post sticky copy");
                return RefreshOutcome::SendFailed;
            }
        };

        self.store
            .update_last_message_id(guild, channel, sent.id.clone())
            .await;
        debug!(guild = %guild, channel = %channel, message = %sent.id, "Sticky refreshed");
        RefreshOutcome::Refreshed(sent.id)
    }
}
