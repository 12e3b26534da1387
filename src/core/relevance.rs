//! Transfer logs relevant to one address.

use super::scheduler::FetchScheduler;
use crate::common::logging;
use crate::config::FeedConfig;
use crate::sources::ChainAccess;
use crate::types::{LogEvent, TRANSFER_TOPIC};
use alloy_primitives::Address;

/// Result of scanning the log window for one address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevanceScan {
    pub from_block: u64,
    pub to_block: u64,
    /// Every matching log, newest first.
    pub relevant: Vec<LogEvent>,
}

/// Scans a fixed window of `Transfer` logs for a single address.
pub struct AddressRelevanceScanner {
    log_depth: u64,
    cap: usize,
}

impl AddressRelevanceScanner {
    #[must_use]
    pub fn new(log_depth: u64, cap: usize) -> Self {
        Self { log_depth, cap }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.log_depth, config.transfer_cap)
    }

    /// Inclusive block range scanned for a given head.
    #[must_use]
    pub fn range(&self, head: u64) -> (u64, u64) {
        (head.saturating_sub(self.log_depth), head)
    }

    /// Keeps logs emitted by `target` or naming it as sender or receiver,
    /// newest first.
    #[must_use]
    pub fn filter(target: Address, logs: Vec<LogEvent>) -> Vec<LogEvent> {
        logs.into_iter().filter(|log| log.involves(target)).rev().collect()
    }

    /// Capped slice for display.
    #[must_use]
    pub fn visible<'a>(&self, scan: &'a RelevanceScan) -> &'a [LogEvent] {
        &scan.relevant[..scan.relevant.len().min(self.cap)]
    }

    /// Fetches and filters the log window below `head`.
    ///
    /// A failed log query is tolerated and yields no transfers.
    pub async fn scan(
        &self,
        target: Address,
        head: u64,
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> RelevanceScan {
        let (from_block, to_block) = self.range(head);
        let logs = match scheduler
            .fetch("eth_getLogs", port.logs(from_block, to_block, &[TRANSFER_TOPIC]))
            .await
        {
            Ok(logs) => logs,
            Err(e) => {
                logging::log_warning(
                    &format!("Transfer logs #{from_block}..#{to_block} unavailable"),
                    &e.to_string(),
                );
                Vec::new()
            }
        };

        RelevanceScan {
            from_block,
            to_block,
            relevant: Self::filter(target, logs),
        }
    }
}
