//! One feed's state across poll cycles.

use super::aggregator::TransactionAggregator;
use super::resolve::TransactionResolver;
use super::scheduler::FetchScheduler;
use super::walker::HistoryWalker;
use super::window::WindowSnapshotBuilder;
use crate::common::error::Result;
use crate::config::FeedConfig;
use crate::sources::ChainAccess;
use crate::types::{FeeData, FeedSnapshot, FeedStatus};

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub head: u64,
    pub blocks: usize,
    /// Transactions resolved from the live window.
    pub live: usize,
    /// Transactions found by the history walker, if it ran.
    pub backfilled: Option<usize>,
    /// New transactions admitted to the feed.
    pub admitted: usize,
    pub status: FeedStatus,
}

/// Drives the window builder, history walker and aggregator for one feed.
///
/// A failed cycle leaves the feed, the walker cursor and the seen set exactly
/// as they were; only the snapshot status changes.
pub struct FeedSession {
    window: WindowSnapshotBuilder,
    resolver: TransactionResolver,
    walker: HistoryWalker,
    aggregator: TransactionAggregator,
    scheduler: FetchScheduler,
    network_id: Option<u64>,
    snapshot: FeedSnapshot,
    cycles: u64,
}

impl FeedSession {
    #[must_use]
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_scheduler(config, FetchScheduler::from_config(config))
    }

    #[must_use]
    pub fn with_scheduler(config: &FeedConfig, scheduler: FetchScheduler) -> Self {
        Self {
            window: WindowSnapshotBuilder::from_config(config),
            resolver: TransactionResolver::from_config(config),
            walker: HistoryWalker::from_config(config),
            aggregator: TransactionAggregator::new(config.feed_cap),
            scheduler,
            network_id: None,
            snapshot: FeedSnapshot::default(),
            cycles: 0,
        }
    }

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> &FeedSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn aggregator(&self) -> &TransactionAggregator {
        &self.aggregator
    }

    #[must_use]
    pub fn walker(&self) -> &HistoryWalker {
        &self.walker
    }

    #[must_use]
    pub fn scheduler(&self) -> &FetchScheduler {
        &self.scheduler
    }

    /// Completed cycles, failed ones included.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    async fn chain_state(&self, port: &dyn ChainAccess) -> Result<(u64, FeeData, u64)> {
        let sched = &self.scheduler;
        let network = async {
            match self.network_id {
                Some(id) => Ok(id),
                None => sched.fetch("eth_chainId", port.network_id()).await,
            }
        };
        tokio::try_join!(
            sched.fetch("eth_blockNumber", port.head_height()),
            sched.fetch("eth_gasPrice", port.fee_data()),
            network,
        )
    }

    /// Runs one poll cycle.
    ///
    /// Live-window transactions are merged before backfilled ones, so they win
    /// any contention for the last slots under the cap.
    ///
    /// # Errors
    ///
    /// Fails when the head height, gas price or network id cannot be read.
    /// The snapshot status is then [`FeedStatus::Error`] and nothing else
    /// changes.
    pub async fn cycle(&mut self, port: &dyn ChainAccess) -> Result<CycleReport> {
        self.cycles += 1;
        let (head, fee, network_id) = match self.chain_state(port).await {
            Ok(state) => state,
            Err(e) => {
                self.snapshot.status = FeedStatus::Error;
                return Err(e);
            }
        };
        self.network_id = Some(network_id);

        let blocks = self.window.build(head, port, &self.scheduler).await;
        let live = self
            .resolver
            .resolve_blocks(&blocks, port, &self.scheduler)
            .await;
        let live_count = live.len();

        let backfill = if self.walker.should_activate(self.aggregator.len(), live_count) {
            self.walker.walk(head, port, &self.scheduler).await
        } else {
            None
        };

        let mut admitted = self.aggregator.merge(live);
        let backfilled = backfill.map(|report| {
            let found = report.transactions.len();
            admitted += self.aggregator.merge(report.transactions);
            found
        });

        let status = if backfilled.is_some() {
            FeedStatus::Syncing
        } else {
            FeedStatus::Live
        };
        let block_count = blocks.len();
        self.snapshot = FeedSnapshot {
            head_height: head,
            fee_price: fee.gas_price,
            network_id,
            blocks,
            transactions: self.aggregator.feed().to_vec(),
            status,
        };

        Ok(CycleReport {
            head,
            blocks: block_count,
            live: live_count,
            backfilled,
            admitted,
            status,
        })
    }
}
