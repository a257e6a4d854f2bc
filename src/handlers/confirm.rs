//! Pending delete confirmations.
//!
//! A destructive command asks its author to answer `yes` or `no` in the same
//! channel. At most one prompt is pending per (channel, author); a newer
//! prompt supersedes the older one, which then resolves as cancelled.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use stickyd_proto::{ChannelId, UserId};
use tokio::sync::oneshot;

type Key = (ChannelId, UserId);

/// How a prompt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirmed,
    Cancelled,
    TimedOut,
}

/// A registered prompt, waiting for its answer.
#[must_use = "a pending confirmation does nothing unless waited on"]
pub struct PendingConfirmation {
    key: Key,
    token: u64,
    rx: oneshot::Receiver<bool>,
}

#[derive(Default)]
pub struct Confirmations {
    pending: DashMap<Key, (u64, oneshot::Sender<bool>)>,
    next_token: AtomicU64,
}

impl Confirmations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a prompt for `user` in `channel`, superseding any older one.
    pub fn register(&self, channel: ChannelId, user: UserId) -> PendingConfirmation {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let key = (channel, user);
        // Dropping the replaced sender wakes the older waiter as cancelled.
        self.pending.insert(key.clone(), (token, tx));
        PendingConfirmation { key, token, rx }
    }

    /// Feed a message to the prompt of its author, if any.
    ///
    /// Returns `true` when the message answered a prompt and should not be
    /// treated as anything else.
    pub fn resolve(&self, channel: &ChannelId, user: &UserId, text: &str) -> bool {
        let Some(answer) = parse_answer(text) else {
            return false;
        };
        let key = (channel.clone(), user.clone());
        match self.pending.remove(&key) {
            Some((_, (_, tx))) => {
                let _ = tx.send(answer);
                true
            }
            None => false,
        }
    }

    /// Wait for the answer to `pending`, for at most `timeout`.
    pub async fn wait(&self, pending: PendingConfirmation, timeout: Duration) -> Decision {
        let PendingConfirmation { key, token, rx } = pending;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(true)) => Decision::Confirmed,
            Ok(Ok(false)) | Ok(Err(_)) => Decision::Cancelled,
            Err(_) => {
                self.pending.remove_if(&key, |_, (t, _)| *t == token);
                Decision::TimedOut
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn parse_answer(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "confirm" => Some(true),
        "no" | "n" | "cancel" => Some(false),
        _ => None,
    }
}
