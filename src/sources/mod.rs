//! Access to the chain.
//!
//! Everything the engine reads goes through the [`ChainAccess`] port, which
//! keeps the core testable against an in-memory chain. [`JsonRpcClient`] is
//! the production implementation over HTTP JSON-RPC.

pub mod erc20;
pub mod rpc;

use crate::common::error::Result;
use crate::types::{BlockSummary, FeeData, LogEvent, TransactionRecord};
use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

pub use erc20::Erc20;
pub use rpc::JsonRpcClient;

/// Point lookups against an EVM chain.
///
/// Lookups that can legitimately miss (`block`, `transaction`) return
/// `Ok(None)`; `Err` is reserved for transport and decoding failures.
#[async_trait]
pub trait ChainAccess: Send + Sync {
    /// Highest known block number.
    async fn head_height(&self) -> Result<u64>;

    async fn fee_data(&self) -> Result<FeeData>;

    /// Chain id of the network.
    async fn network_id(&self) -> Result<u64>;

    /// Block by number, with inline transaction bodies when `include_bodies` is set.
    async fn block(&self, height: u64, include_bodies: bool) -> Result<Option<BlockSummary>>;

    async fn transaction(&self, hash: B256) -> Result<Option<TransactionRecord>>;

    /// Logs in `[from, to]` whose topic0 is any of `topics`.
    async fn logs(&self, from: u64, to: u64, topics: &[B256]) -> Result<Vec<LogEvent>>;

    async fn balance(&self, address: Address) -> Result<U256>;

    /// Transaction count of the account.
    async fn nonce(&self, address: Address) -> Result<u64>;

    /// Deployed bytecode; empty for plain accounts.
    async fn code(&self, address: Address) -> Result<Bytes>;

    /// Read-only contract call returning the raw return data.
    ///
    /// Fails when the call reverts.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Short name used in log lines.
    fn source_name(&self) -> &'static str;
}
