//! Per-channel critical sections.
//!
//! A channel is either held or free; there is no owner token, re-entrancy
//! count, or queue. Refresh triggers use [`ChannelLocks::try_acquire`] and
//! are dropped when the channel is held. Administrative operations use
//! [`ChannelLocks::acquire`] and wait their turn instead.
//!
//! Membership is released by [`ChannelGuard`]'s `Drop`, so every exit path
//! (early return, `?`, panic unwinding) frees the channel.

use dashmap::DashSet;
use stickyd_proto::ChannelId;
use tokio::sync::Notify;

#[derive(Default)]
pub struct ChannelLocks {
    held: DashSet<ChannelId>,
    released: Notify,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_locked(&self, channel: &ChannelId) -> bool {
        self.held.contains(channel)
    }

    /// Atomically mark `channel` as held, or return `None` if it already is.
    pub fn try_acquire(&self, channel: &ChannelId) -> Option<ChannelGuard<'_>> {
        if self.held.insert(channel.clone()) {
            Some(ChannelGuard {
                locks: self,
                channel: channel.clone(),
            })
        } else {
            None
        }
    }

    /// Wait until `channel` is free, then hold it.
    ///
    /// No timeout: a refresh stuck on a hung platform call keeps waiters
    /// blocked until that call resolves.
    pub async fn acquire(&self, channel: &ChannelId) -> ChannelGuard<'_> {
        loop {
            // Register interest before testing so a release between the
            // test and the await still wakes us.
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(guard) = self.try_acquire(channel) {
                return guard;
            }
            notified.await;
        }
    }

    /// Number of channels currently held.
    pub fn held(&self) -> usize {
        self.held.len()
    }
}

/// Scoped membership in [`ChannelLocks`].
#[must_use = "the channel is released as soon as the guard is dropped"]
pub struct ChannelGuard<'a> {
    locks: &'a ChannelLocks,
    channel: ChannelId,
}

impl ChannelGuard<'_> {
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }
}

impl Drop for ChannelGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.remove(&self.channel);
        self.locks.released.notify_waiters();
    }
}
