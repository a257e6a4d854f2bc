//! In-process [`Platform`] for tests.
//!
//! Message ids are handed out sequentially starting at 200. Failures can be
//! switched on per operation, and sends can be held behind a semaphore to
//! park a refresh cycle at its send suspension point. Channels are unknown
//! until registered with [`MockPlatform::add_channel`].

use super::Platform;
use crate::error::PlatformError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use stickyd_proto::{Channel, ChannelId, CreateMessage, GuildId, Message, MessageId};
use tokio::sync::Semaphore;

pub struct MockPlatform {
    next_id: AtomicU64,
    live: Mutex<HashSet<MessageId>>,
    channels: Mutex<HashMap<ChannelId, GuildId>>,
    pub sent: Mutex<Vec<(ChannelId, CreateMessage, MessageId)>>,
    pub deleted: Mutex<Vec<(ChannelId, MessageId)>>,
    calls: AtomicUsize,
    pub fail_send: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_delete: AtomicBool,
    pub panic_on_send: AtomicBool,
    send_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(200),
            live: Mutex::new(HashSet::new()),
            channels: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            fail_send: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            panic_on_send: AtomicBool::new(false),
            send_gate: Mutex::new(None),
        }
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend `channel` exists in `guild`. Unregistered channels are unknown.
    pub fn add_channel(&self, guild: &GuildId, channel: &ChannelId) {
        self.channels.lock().insert(channel.clone(), guild.clone());
    }

    /// Pretend `message` exists on the platform.
    pub fn insert_live(&self, message: &MessageId) {
        self.live.lock().insert(message.clone());
    }

    pub fn is_live(&self, message: &MessageId) -> bool {
        self.live.lock().contains(message)
    }

    /// Hold every send until a permit is added to the returned semaphore.
    pub fn gate_sends(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.send_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn sent_to(&self, channel: &ChannelId) -> Vec<CreateMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(c, _, _)| c == channel)
            .map(|(_, m, _)| m.clone())
            .collect()
    }

    pub fn delete_count(&self) -> usize {
        self.deleted.lock().len()
    }

    /// Number of platform calls of any kind, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send_message(
        &self,
        channel: &ChannelId,
        message: &CreateMessage,
    ) -> Result<Message, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.send_gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| PlatformError::Other(e.to_string()))?
                .forget();
        }
        if self.panic_on_send.load(Ordering::SeqCst) {
            panic!("mock platform send panicked");
        }
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(PlatformError::Forbidden);
        }

        let id = MessageId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.live.lock().insert(id.clone());
        self.sent
            .lock()
            .push((channel.clone(), message.clone(), id.clone()));
        Ok(Message {
            id,
            channel_id: channel.clone(),
        })
    }

    async fn fetch_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<Option<Message>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(PlatformError::Status { code: 500 });
        }
        Ok(self.is_live(message).then(|| Message {
            id: message.clone(),
            channel_id: channel.clone(),
        }))
    }

    async fn fetch_channel(&self, channel: &ChannelId) -> Result<Option<Channel>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.channels.lock().get(channel).map(|guild| Channel {
            id: channel.clone(),
            guild_id: Some(guild.clone()),
        }))
    }

    async fn delete_message(
        &self,
        channel: &ChannelId,
        message: &MessageId,
    ) -> Result<(), PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(PlatformError::Forbidden);
        }
        if !self.live.lock().remove(message) {
            return Err(PlatformError::NotFound);
        }
        self.deleted.lock().push((channel.clone(), message.clone()));
        Ok(())
    }
}
