// crates/launchpad-catalog/src/locks.rs
//
// One async mutex per channel. Held across a whole load-compute-replace
// cycle, so two mutations of the same channel never interleave while
// mutations of different channels proceed independently.

use tokio::sync::{Mutex, MutexGuard};

use launchpad_core::Channel;

#[derive(Debug, Default)]
pub struct ChannelLocks {
    game: Mutex<()>,
    launcher: Mutex<()>,
}

impl ChannelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `channel`'s catalog.
    pub async fn lock(&self, channel: Channel) -> MutexGuard<'_, ()> {
        match channel {
            Channel::Game => self.game.lock().await,
            Channel::Launcher => self.launcher.lock().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn channels_do_not_block_each_other() {
        let locks = ChannelLocks::new();
        let _game = locks.lock(Channel::Game).await;

        let launcher = tokio::time::timeout(Duration::from_secs(1), locks.lock(Channel::Launcher)).await;
        assert!(launcher.is_ok());
    }

    #[tokio::test]
    async fn same_channel_is_exclusive() {
        let locks = ChannelLocks::new();
        let _game = locks.lock(Channel::Game).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(Channel::Game)).await;
        assert!(second.is_err());
    }
}
