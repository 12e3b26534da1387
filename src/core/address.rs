//! One-shot scan behind an address page.

use super::holdings::HoldingsResolver;
use super::relevance::AddressRelevanceScanner;
use super::scheduler::FetchScheduler;
use crate::common::error::Result;
use crate::common::logging::{self, LogLevel};
use crate::config::FeedConfig;
use crate::sources::{ChainAccess, Erc20};
use crate::types::{AccountKind, AddressView, format_amount};
use alloy_primitives::Address;

/// Builds an [`AddressView`]: account state, ERC-20 classification, relevant
/// transfers and holdings.
pub struct AddressScanner {
    relevance: AddressRelevanceScanner,
    holdings: HoldingsResolver,
    scheduler: FetchScheduler,
    native_decimals: u8,
}

impl AddressScanner {
    #[must_use]
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_scheduler(config, FetchScheduler::from_config(config))
    }

    /// Shares an existing scheduler, e.g. the feed poller's, so both stay
    /// inside one request budget.
    #[must_use]
    pub fn with_scheduler(config: &FeedConfig, scheduler: FetchScheduler) -> Self {
        Self {
            relevance: AddressRelevanceScanner::from_config(config),
            holdings: HoldingsResolver::from_config(config),
            scheduler,
            native_decimals: config.native_asset.decimals,
        }
    }

    /// Scans `target`.
    ///
    /// # Errors
    ///
    /// Fails only if the balance, code, nonce or head height cannot be read.
    /// Log and token lookups are best-effort.
    pub async fn scan(&self, target: Address, port: &dyn ChainAccess) -> Result<AddressView> {
        let sched = &self.scheduler;
        let (balance, code, nonce, head) = tokio::try_join!(
            sched.fetch("eth_getBalance", port.balance(target)),
            sched.fetch("eth_getCode", port.code(target)),
            sched.fetch("eth_getTransactionCount", port.nonce(target)),
            sched.fetch("eth_blockNumber", port.head_height()),
        )?;

        let is_contract = !code.is_empty();
        let token_metadata = if is_contract {
            Erc20::new(port, sched, target).probe().await
        } else {
            None
        };
        let kind = match (is_contract, token_metadata.is_some()) {
            (false, _) => AccountKind::Eoa,
            (true, false) => AccountKind::Contract,
            (true, true) => AccountKind::Erc20Token,
        };

        let scan = self.relevance.scan(target, head, port, sched).await;
        let holdings = self
            .holdings
            .resolve(
                target,
                balance,
                &scan.relevant,
                token_metadata.as_ref(),
                port,
                sched,
            )
            .await;

        logging::log(
            LogLevel::Success,
            &format!(
                "Scanned {target} ({}): {} transfers in #{}..#{}, {} holdings",
                kind.label(),
                scan.relevant.len(),
                scan.from_block,
                scan.to_block,
                holdings.entries.len()
            ),
        );

        Ok(AddressView {
            address: target,
            balance_raw: balance,
            balance: format_amount(balance, self.native_decimals),
            nonce,
            is_contract,
            kind,
            token_metadata,
            holdings: holdings.entries,
            transfers: self.relevance.visible(&scan).to_vec(),
            metadata: holdings.metadata,
            scanned_from: scan.from_block,
            scanned_to: scan.to_block,
        })
    }
}
