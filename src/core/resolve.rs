//! Turns block transaction references into full records.

use super::scheduler::{FetchScheduler, successes};
use crate::config::{FeedConfig, Pacing};
use crate::sources::ChainAccess;
use crate::types::{BlockSummary, TransactionRecord, TxRef};

/// Resolves [`TxRef`]s: inline bodies are used as-is, bare hashes are fetched
/// one by one with a delay between requests.
#[derive(Debug, Clone)]
pub struct TransactionResolver {
    max_per_block: usize,
    pacing: Pacing,
}

impl TransactionResolver {
    #[must_use]
    pub fn new(max_per_block: usize, pacing: Pacing) -> Self {
        Self {
            max_per_block,
            pacing,
        }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.max_txs_per_block, config.tx_fetch_pacing())
    }

    /// Resolves the first `max_per_block` transactions of `block`.
    ///
    /// Missing or failed lookups are dropped. Every returned record carries the
    /// height of `block`, whatever the endpoint reported.
    pub async fn resolve_block(
        &self,
        block: &BlockSummary,
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> Vec<TransactionRecord> {
        let refs = block.transactions.iter().take(self.max_per_block);

        let mut slots: Vec<Option<TransactionRecord>> = Vec::new();
        let mut pending = Vec::new();
        for tx_ref in refs {
            match tx_ref {
                TxRef::Body(record) => slots.push(Some((**record).clone())),
                TxRef::Hash(hash) => {
                    pending.push((slots.len(), *hash));
                    slots.push(None);
                }
            }
        }

        if !pending.is_empty() {
            let fetched = scheduler
                .run_batch(
                    "eth_getTransactionByHash",
                    self.pacing,
                    pending.iter().map(|(_, hash)| *hash).collect(),
                    |hash| port.transaction(hash),
                )
                .await;
            for ((slot, hash), found) in pending.iter().zip(fetched) {
                match found.into_option().flatten() {
                    Some(record) => slots[*slot] = Some(record),
                    None => log::debug!("transaction {hash} unavailable, dropped"),
                }
            }
        }

        slots
            .into_iter()
            .flatten()
            .map(|mut record| {
                record.block_number = block.height;
                record
            })
            .collect()
    }

    /// Resolves every non-empty block in order.
    pub async fn resolve_blocks(
        &self,
        blocks: &[BlockSummary],
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> Vec<TransactionRecord> {
        let mut out = Vec::new();
        for block in blocks.iter().filter(|b| b.has_transactions()) {
            out.extend(self.resolve_block(block, port, scheduler).await);
        }
        out
    }
}

/// Fetches blocks as a bounded-parallel best-effort batch, dropping the ones
/// that failed or do not exist.
pub(crate) async fn fetch_blocks(
    heights: Vec<u64>,
    pacing: Pacing,
    include_bodies: bool,
    port: &dyn ChainAccess,
    scheduler: &FetchScheduler,
) -> Vec<BlockSummary> {
    let fetched = scheduler
        .run_batch("eth_getBlockByNumber", pacing, heights, |height| {
            port.block(height, include_bodies)
        })
        .await;
    successes(fetched).into_iter().flatten().collect()
}
