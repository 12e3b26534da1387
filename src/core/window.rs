//! Latest-block window fetched on every cycle.

use super::resolve::fetch_blocks;
use super::scheduler::FetchScheduler;
use crate::config::{FeedConfig, Pacing};
use crate::sources::ChainAccess;
use crate::types::BlockSummary;

pub struct WindowSnapshotBuilder {
    window_size: u64,
    pacing: Pacing,
    include_bodies: bool,
}

impl WindowSnapshotBuilder {
    #[must_use]
    pub fn new(window_size: u64, pacing: Pacing, include_bodies: bool) -> Self {
        Self {
            window_size,
            pacing,
            include_bodies,
        }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(
            config.window_size,
            config.window_pacing,
            config.full_transactions,
        )
    }

    #[must_use]
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// `head, head-1, …` down to the window size, stopping at genesis.
    #[must_use]
    pub fn heights(&self, head: u64) -> Vec<u64> {
        (0..self.window_size)
            .map_while(|offset| head.checked_sub(offset))
            .collect()
    }

    /// Fetches the window below `head`. Blocks that fail or are missing are
    /// left out, so the result may be shorter than the window and have gaps.
    pub async fn build(
        &self,
        head: u64,
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> Vec<BlockSummary> {
        let heights = self.heights(head);
        let expected = heights.len();
        let blocks = fetch_blocks(heights, self.pacing, self.include_bodies, port, scheduler).await;
        if blocks.len() < expected {
            log::debug!(
                "window at #{head}: {} of {expected} blocks available",
                blocks.len()
            );
        }
        blocks
    }
}
