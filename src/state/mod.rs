//! In-process coordination state.
//!
//! Nothing here is persisted; it lives and dies with the process.

mod locks;

pub use locks::{ChannelGuard, ChannelLocks};
