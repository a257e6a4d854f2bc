//! Persistent sticky store.
//!
//! The document lives in memory for the lifetime of the process and is the
//! single source of truth. Every mutation is flushed eagerly: the whole
//! document is written to `<path>.tmp` and renamed over `<path>`, so a crash
//! mid-write never leaves a truncated file behind.
//!
//! Reads never fail. An absent, unreadable, or malformed file is treated as
//! "no stickies configured". Flush failures are logged and swallowed.

mod types;

pub use types::{Document, GuildStickies, StickyRecord};

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use stickyd_proto::{ChannelId, GuildId, MessageId};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub struct StickyStore {
    /// Backing file; `None` keeps everything in memory.
    path: Option<PathBuf>,
    data: RwLock<Document>,
    /// Serializes flushes so the last writer always carries the latest state.
    flush_gate: tokio::sync::Mutex<()>,
}

impl StickyStore {
    /// Open the document at `path`, starting empty if it can't be read.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = load_document(&path);
        info!(
            path = %path.display(),
            guilds = data.len(),
            stickies = data.values().map(|g| g.len()).sum::<usize>(),
            "Sticky store loaded"
        );
        Self {
            path: Some(path),
            data: RwLock::new(data),
            flush_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// A store without a backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(Document::new()),
            flush_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn get(&self, guild: &GuildId, channel: &ChannelId) -> Option<StickyRecord> {
        self.data.read().get(guild)?.get(channel).cloned()
    }

    /// All records of a guild, ordered by channel id.
    pub fn get_all(&self, guild: &GuildId) -> GuildStickies {
        self.data.read().get(guild).cloned().unwrap_or_default()
    }

    /// First record in `guild` named `name`, scanning channels in ascending id order.
    pub fn find_by_name(&self, guild: &GuildId, name: &str) -> Option<(ChannelId, StickyRecord)> {
        let data = self.data.read();
        data.get(guild)?
            .iter()
            .find(|(_, record)| record.name == name)
            .map(|(channel, record)| (channel.clone(), record.clone()))
    }

    /// Total number of records across all guilds.
    pub fn len(&self) -> usize {
        self.data.read().values().map(|g| g.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace the record of a channel.
    pub async fn set(&self, guild: &GuildId, channel: &ChannelId, record: StickyRecord) {
        self.data
            .write()
            .entry(guild.clone())
            .or_default()
            .insert(channel.clone(), record);
        self.flush().await;
    }

    /// Insert or replace the record of `channel` unless another channel in
    /// the guild already uses `record.name`.
    ///
    /// The check and the insert happen under one write lock, so two channels
    /// can never both claim a name. Returns the conflicting channel on refusal.
    pub async fn insert_unique(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        record: StickyRecord,
    ) -> Result<(), ChannelId> {
        {
            let mut data = self.data.write();
            let stickies = data.entry(guild.clone()).or_default();
            if let Some(owner) = stickies
                .iter()
                .find(|(c, r)| r.name == record.name && *c != channel)
                .map(|(c, _)| c.clone())
            {
                prune_guild(&mut data, guild);
                return Err(owner);
            }
            stickies.insert(channel.clone(), record);
        }
        self.flush().await;
        Ok(())
    }

    /// Remove the record of a channel, returning it if there was one.
    pub async fn remove_by_channel(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
    ) -> Option<StickyRecord> {
        let removed = {
            let mut data = self.data.write();
            let removed = data.get_mut(guild).and_then(|g| g.remove(channel));
            prune_guild(&mut data, guild);
            removed
        };
        if removed.is_some() {
            self.flush().await;
        }
        removed
    }

    /// Remove the first record in `guild` named `name`. Returns whether one was found.
    pub async fn remove_by_name(&self, guild: &GuildId, name: &str) -> bool {
        let removed = {
            let mut data = self.data.write();
            let channel = data.get(guild).and_then(|g| {
                g.iter()
                    .find(|(_, record)| record.name == name)
                    .map(|(channel, _)| channel.clone())
            });
            let removed = match channel {
                Some(channel) => data.get_mut(guild).and_then(|g| g.remove(&channel)),
                None => None,
            };
            prune_guild(&mut data, guild);
            removed.is_some()
        };
        if removed {
            self.flush().await;
        }
        removed
    }

    /// Record the id of the copy just posted. No-op when the channel has no record.
    pub async fn update_last_message_id(
        &self,
        guild: &GuildId,
        channel: &ChannelId,
        message: MessageId,
    ) -> bool {
        let updated = {
            let mut data = self.data.write();
            match data.get_mut(guild).and_then(|g| g.get_mut(channel)) {
                Some(record) => {
                    record.last_message_id = Some(message);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.flush().await;
        } else {
            debug!(guild = %guild, channel = %channel, "No sticky to update, skipping");
        }
        updated
    }

    async fn flush(&self) {
        crate::metrics::set_stickies_configured(self.len());

        let Some(path) = &self.path else {
            return;
        };
        let _gate = self.flush_gate.lock().await;
        if let Err(e) = self.write_snapshot(path).await {
            error!(path = %path.display(), error = %e, "Failed to write sticky store");
            crate::metrics::record_store_write_failure();
        }
    }

    async fn write_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = {
            let data = self.data.read();
            serde_json::to_vec_pretty(&*data)?
        };
        let tmp = tmp_path(path);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn load_document(path: &Path) -> Document {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Document::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Sticky store unreadable, starting empty");
            return Document::new();
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Sticky store malformed, starting empty");
            Document::new()
        }
    }
}

fn prune_guild(data: &mut Document, guild: &GuildId) {
    if data.get(guild).is_some_and(|g| g.is_empty()) {
        data.remove(guild);
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guild() -> GuildId {
        GuildId::new("1")
    }

    fn rules() -> StickyRecord {
        StickyRecord::new("rules", "Read the rules!", Some(MessageId::new("100")))
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let store = StickyStore::open(dir.path().join("absent.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stickies.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = StickyStore::open(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn loads_integer_message_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stickies.json");
        std::fs::write(
            &path,
            r#"{"1": {"10": {"name": "rules", "content": "Read the rules!", "lastMessageId": 100}}}"#,
        )
        .unwrap();
        let store = StickyStore::open(&path);
        let record = store.get(&guild(), &ChannelId::new("10")).unwrap();
        assert_eq!(record.last_message_id, Some(MessageId::new("100")));
    }

    #[tokio::test]
    async fn set_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stickies.json");

        let store = StickyStore::open(&path);
        store.set(&guild(), &ChannelId::new("10"), rules()).await;
        drop(store);

        let reopened = StickyStore::open(&path);
        assert_eq!(reopened.get(&guild(), &ChannelId::new("10")), Some(rules()));
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn document_layout_matches_expected_shape() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stickies.json");
        let store = StickyStore::open(&path);
        store.set(&guild(), &ChannelId::new("10"), rules()).await;

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "1": {"10": {"name": "rules", "content": "Read the rules!", "lastMessageId": "100"}}
            })
        );
    }

    #[tokio::test]
    async fn set_replaces_existing_record() {
        let store = StickyStore::in_memory();
        let channel = ChannelId::new("10");
        store.set(&guild(), &channel, rules()).await;
        store
            .set(&guild(), &channel, StickyRecord::new("faq", "See the FAQ", None))
            .await;

        let all = store.get_all(&guild());
        assert_eq!(all.len(), 1);
        assert_eq!(all[&channel].name, "faq");
    }

    #[tokio::test]
    async fn insert_unique_refuses_name_owned_elsewhere() {
        let store = StickyStore::in_memory();
        store.set(&guild(), &ChannelId::new("10"), rules()).await;

        let refused = store
            .insert_unique(&guild(), &ChannelId::new("20"), rules())
            .await;
        assert_eq!(refused, Err(ChannelId::new("10")));
        assert!(store.get(&guild(), &ChannelId::new("20")).is_none());

        let same_channel = store
            .insert_unique(&guild(), &ChannelId::new("10"), StickyRecord::new("rules", "v2", None))
            .await;
        assert_eq!(same_channel, Ok(()));
        assert_eq!(store.get(&guild(), &ChannelId::new("10")).unwrap().content, "v2");
    }

    #[tokio::test]
    async fn remove_by_name_takes_lowest_channel_first() {
        let store = StickyStore::in_memory();
        store
            .set(&guild(), &ChannelId::new("30"), StickyRecord::new("dup", "b", None))
            .await;
        store
            .set(&guild(), &ChannelId::new("20"), StickyRecord::new("dup", "a", None))
            .await;

        assert!(store.remove_by_name(&guild(), "dup").await);
        assert!(store.get(&guild(), &ChannelId::new("20")).is_none());
        assert!(store.get(&guild(), &ChannelId::new("30")).is_some());
    }

    #[tokio::test]
    async fn first_match_uses_numeric_channel_order() {
        let store = StickyStore::in_memory();
        store
            .set(&guild(), &ChannelId::new("10"), StickyRecord::new("dup", "b", None))
            .await;
        store
            .set(&guild(), &ChannelId::new("9"), StickyRecord::new("dup", "a", None))
            .await;

        let (channel, record) = store.find_by_name(&guild(), "dup").unwrap();
        assert_eq!(channel, ChannelId::new("9"));
        assert_eq!(record.content, "a");

        assert!(store.remove_by_name(&guild(), "dup").await);
        assert!(store.get(&guild(), &ChannelId::new("9")).is_none());
        assert!(store.get(&guild(), &ChannelId::new("10")).is_some());
    }

    #[tokio::test]
    async fn remove_by_name_missing_is_false_and_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stickies.json");
        let store = StickyStore::open(&path);

        assert!(!store.remove_by_name(&guild(), "nope").await);
        assert!(!path.exists(), "no mutation means no write");
    }

    #[tokio::test]
    async fn remove_by_channel_prunes_empty_guild() {
        let store = StickyStore::in_memory();
        let channel = ChannelId::new("10");
        store.set(&guild(), &channel, rules()).await;

        assert_eq!(store.remove_by_channel(&guild(), &channel).await, Some(rules()));
        assert!(store.data.read().is_empty());
        assert_eq!(store.remove_by_channel(&guild(), &channel).await, None);
    }

    #[tokio::test]
    async fn update_last_message_id_is_noop_without_record() {
        let store = StickyStore::in_memory();
        let updated = store
            .update_last_message_id(&guild(), &ChannelId::new("10"), MessageId::new("5"))
            .await;
        assert!(!updated);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_last_message_id_changes_only_the_id() {
        let store = StickyStore::in_memory();
        let channel = ChannelId::new("10");
        store.set(&guild(), &channel, rules()).await;

        assert!(
            store
                .update_last_message_id(&guild(), &channel, MessageId::new("200"))
                .await
        );
        assert_eq!(
            store.get(&guild(), &channel),
            Some(StickyRecord::new("rules", "Read the rules!", Some(MessageId::new("200"))))
        );
    }

    #[tokio::test]
    async fn write_failure_keeps_memory_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("stickies.json");
        let store = StickyStore::open(&path);

        store.set(&guild(), &ChannelId::new("10"), rules()).await;
        assert_eq!(store.get(&guild(), &ChannelId::new("10")), Some(rules()));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn guilds_are_independent() {
        let store = StickyStore::in_memory();
        let channel = ChannelId::new("10");
        store.set(&GuildId::new("1"), &channel, rules()).await;
        store.set(&GuildId::new("2"), &channel, rules()).await;

        assert!(store.remove_by_name(&GuildId::new("1"), "rules").await);
        assert!(store.get(&GuildId::new("2"), &channel).is_some());
    }
}
