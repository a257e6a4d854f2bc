//! Administrative operations.
//!
//! Every mutating operation takes the same per-channel critical section as
//! the refresh workflow, but waits for it instead of being dropped. A create
//! or delete therefore never interleaves with a refresh of the same channel.

use super::StickyService;
use crate::error::AdminError;
use crate::store::{GuildStickies, StickyRecord};
use stickyd_proto::{ChannelId, GuildId, MessageId};
use tracing::{info, warn};

impl StickyService {
    /// Create or replace the sticky of `channel` and post its first copy.
    ///
    /// `channel` must belong to `guild`; anything else is refused before
    /// anything is posted. Names are unique per guild; reusing a name held by
    /// another channel is refused the same way.
    pub async fn create(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        name: &str,
        content: &str,
    ) -> Result<MessageId, AdminError> {
        let result = self.create_locked(guild, channel, name, content).await;
        record_outcome("create", &result);
        result
    }

    async fn create_locked(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        name: &str,
        content: &str,
    ) -> Result<MessageId, AdminError> {
        self.check_channel_in_guild(guild, channel).await?;

        let _guard = self.locks.acquire(channel).await;

        if let Some(owner) = self.name_owner(guild, name, channel) {
            return Err(AdminError::NameTaken {
                name: name.to_string(),
                channel: owner,
            });
        }

        if let Some(old) = self
            .store
            .get(guild, channel)
            .and_then(|existing| existing.last_message_id)
        {
            self.delete_live(channel, &old).await;
        }

        let sent = self
            .platform
            .send_message(channel, &self.sticky_message(content))
            .await
            .map_err(|e| {
                crate::metrics::record_platform_error("send", e.error_code());
                AdminError::Send(e)
            })?;

        let record = StickyRecord::new(name, content, Some(sent.id.clone()));
        if let Err(owner) = self.store.insert_unique(guild, channel, record).await {
            // Another channel claimed the name while we were posting.
            self.delete_live(channel, &sent.id).await;
            return Err(AdminError::NameTaken {
                name: name.to_string(),
                channel: owner,
            });
        }

        info!(guild = %guild, channel = %channel, sticky = %name, message = %sent.id, "Sticky created");
        Ok(sent.id)
    }

    /// Refresh triggers are keyed by the guild a message arrives in, so a
    /// record stored under any other guild would never be refreshed.
    async fn check_channel_in_guild(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<(), AdminError> {
        match self.platform.fetch_channel(channel).await {
            Ok(Some(found)) if found.is_in(guild) => Ok(()),
            Ok(_) => {
                warn!(guild = %guild, channel = %channel, "Refusing sticky outside the invoking guild");
                Err(AdminError::ForeignChannel(channel.clone()))
            }
            Err(e) => {
                crate::metrics::record_platform_error("fetch_channel", e.error_code());
                Err(AdminError::ChannelLookup(e))
            }
        }
    }

    /// Look up a sticky by name without touching anything.
    pub fn find_by_name(&self, guild: &GuildId, name: &str) -> Option<(ChannelId, StickyRecord)> {
        self.store.find_by_name(guild, name)
    }

    /// All stickies of a guild, ordered by channel id.
    pub fn list(&self, guild: &GuildId) -> GuildStickies {
        self.store.get_all(guild)
    }

    /// Delete the sticky named `name`, returning the channel it lived in.
    ///
    /// An unknown name fails without any platform call or store write. Once
    /// matched, the record is removed even if its live copy can't be deleted.
    pub async fn delete_by_name(&self, guild: &GuildId, name: &str) -> Result<ChannelId, AdminError> {
        let result = self.delete_by_name_locked(guild, name).await;
        record_outcome("delete", &result);
        result
    }

    async fn delete_by_name_locked(
        &self,
        guild: &GuildId,
        name: &str,
    ) -> Result<ChannelId, AdminError> {
        let not_found = || AdminError::NotFound(name.to_string());

        let (channel, _) = self.store.find_by_name(guild, name).ok_or_else(not_found)?;
        let _guard = self.locks.acquire(&channel).await;

        // The record may have been replaced or removed while we waited.
        let record = match self.store.find_by_name(guild, name) {
            Some((current, record)) if current == channel => record,
            _ => return Err(not_found()),
        };

        if let Some(old) = &record.last_message_id {
            self.delete_live(&channel, old).await;
        }
        self.store.remove_by_name(guild, name).await;

        info!(guild = %guild, channel = %channel, sticky = %name, "Sticky deleted");
        Ok(channel)
    }

    /// Delete whatever sticky `channel` has.
    pub async fn delete_by_channel(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<StickyRecord, AdminError> {
        let result = self.delete_by_channel_locked(guild, channel).await;
        record_outcome("delete", &result);
        result
    }

    async fn delete_by_channel_locked(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Result<StickyRecord, AdminError> {
        let _guard = self.locks.acquire(channel).await;

        let record = self
            .store
            .get(guild, channel)
            .ok_or_else(|| AdminError::NoStickyInChannel(channel.clone()))?;

        if let Some(old) = &record.last_message_id {
            self.delete_live(channel, old).await;
        }
        self.store.remove_by_channel(guild, channel).await;

        info!(guild = %guild, channel = %channel, sticky = %record.name, "Sticky deleted");
        Ok(record)
    }

    fn name_owner(&self, guild: &GuildId, name: &str, channel: &ChannelId) -> Option<ChannelId> {
        self.store
            .get_all(guild)
            .into_iter()
            .find(|(c, r)| r.name == name && c != channel)
            .map(|(c, _)| c)
    }
}

fn record_outcome<T>(op: &str, result: &Result<T, AdminError>) {
    let label = match result {
        Ok(_) => "ok",
        Err(e) => e.error_code(),
    };
    crate::metrics::record_admin(op, label);
}
