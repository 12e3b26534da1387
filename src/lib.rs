//! # evm-feed
//!
//! Incremental recent-activity view of an EVM chain, rebuilt from a JSON-RPC
//! endpoint on every poll.
//!
//! The crate keeps a bounded, deduplicated, newest-first feed of transactions
//! that converges over repeated polling cycles:
//!
//! 1. The head and a small window of the latest blocks are fetched each cycle.
//! 2. When the feed is sparse, a backward walker tops it up from older blocks
//!    using a persistent cursor.
//! 3. An aggregator merges everything into the feed, never admitting a hash twice.
//!
//! For a single address, [`AddressScanner`] scans recent `Transfer` logs and
//! resolves the token holdings they point at.
//!
//! ```no_run
//! use evm_feed::{FeedConfigBuilder, FeedPoller, JsonRpcClient};
//! use std::sync::Arc;
//!
//! # async fn run() -> evm_feed::Result<()> {
//! let config = FeedConfigBuilder::new()
//!     .with_rpc("http://127.0.0.1:8545")
//!     .with_poll_interval(12)
//!     .build()?;
//! let port = Arc::new(JsonRpcClient::new(&config)?);
//! let poller = FeedPoller::new(config, port);
//! poller.start().await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod common;
pub mod config;
pub mod core;
pub mod sources;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::common::error::{FeedError, Result};
pub use crate::config::{BackfillConfig, FeedConfig, FeedConfigBuilder, NativeAsset, Pacing};
pub use crate::core::{
    AddressRelevanceScanner, AddressScanner, CycleReport, FeedPoller, FeedSession, FetchScheduler,
    Fetched, HistoryWalker, HoldingsResolver, TransactionAggregator, TransactionResolver,
    WindowSnapshotBuilder,
};
pub use crate::sources::{ChainAccess, JsonRpcClient};
pub use crate::types::{
    AccountKind, AddressView, BlockSummary, FeeData, FeedSnapshot, FeedStatus, HoldingEntry,
    LogEvent, TokenMetadata, TransactionRecord, TransferDirection, TransferEvent, TxRef,
};
