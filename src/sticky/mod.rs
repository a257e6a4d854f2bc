//! Sticky message service.
//!
//! Keeps one designated message at the bottom of a channel by deleting the
//! previous copy and posting a fresh one whenever user traffic arrives.
//!
//! - [`refresh`]: the per-channel `Idle -> Refreshing -> Idle` cycle
//! - [`admin`]: create / delete / list, serialized with refreshes through
//!   the same per-channel critical section
//!
//! All platform calls are best-effort except the send; see each operation.

mod admin;
mod refresh;

pub use refresh::RefreshOutcome;

use crate::config::Theme;
use crate::platform::Platform;
use crate::state::ChannelLocks;
use crate::store::StickyStore;
use std::sync::Arc;
use stickyd_proto::{ChannelId, CreateMessage, Embed, MessageId};
use tracing::{debug, warn};

pub struct StickyService {
    store: Arc<StickyStore>,
    locks: ChannelLocks,
    platform: Arc<dyn Platform>,
    theme: Theme,
}

impl StickyService {
    pub fn new(store: Arc<StickyStore>, platform: Arc<dyn Platform>, theme: Theme) -> Self {
        Self {
            store,
            locks: ChannelLocks::new(),
            platform,
            theme,
        }
    }

    pub fn store(&self) -> &StickyStore {
        &self.store
    }

    /// Whether a refresh or administrative operation currently holds `channel`.
    pub fn is_locked(&self, channel: &ChannelId) -> bool {
        self.locks.is_locked(channel)
    }

    /// The message posted for a sticky: one embed in the primary theme color.
    fn sticky_message(&self, content: &str) -> CreateMessage {
        CreateMessage::embed(Embed::described(content, self.theme.primary))
    }

    /// Remove a previously posted copy, tolerating every failure.
    ///
    /// The copy may already be gone (deleted by a moderator), and the delete
    /// itself may be refused; neither stops the caller.
    async fn delete_live(&self, channel: &ChannelId, message: &MessageId) {
        match self.platform.fetch_message(channel, message).await {
            Ok(Some(found)) => {
                if let Err(e) = self.platform.delete_message(channel, &found.id).await {
                    crate::metrics::record_platform_error("delete", e.error_code());
                    warn!(channel = %channel, message = %message, error = %e, "Failed to delete old sticky copy");
                }
            }
            Ok(None) => {
                debug!(channel = %channel, message = %message, "Old sticky copy already gone");
            }
            Err(e) => {
                crate::metrics::record_platform_error("fetch", e.error_code());
                debug!(channel = %channel, message = %message, error = %e, "Could not fetch old sticky copy");
            }
        }
    }
}
