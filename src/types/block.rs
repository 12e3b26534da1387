//! Blocks and the transactions they reference.

use alloy_primitives::{Address, B256, Bytes, U256};
use serde::Serialize;

/// A mined transaction as the feed displays it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub block_number: u64,
    pub value: U256,
    pub input: Bytes,
    pub nonce: u64,
    pub gas_price: Option<U256>,
}

impl TransactionRecord {
    #[must_use]
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Human name of the called method, based on the 4-byte selector.
    #[must_use]
    pub fn method_name(&self) -> &'static str {
        super::selectors::method_name(&self.input)
    }
}

/// A block's reference to one of its transactions.
///
/// Endpoints return bare hashes unless full bodies were requested, so both
/// shapes must be resolved into a [`TransactionRecord`] before aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TxRef {
    Hash(B256),
    Body(Box<TransactionRecord>),
}

impl TxRef {
    #[must_use]
    pub fn hash(&self) -> B256 {
        match self {
            Self::Hash(hash) => *hash,
            Self::Body(record) => record.hash,
        }
    }
}

/// Header-level view of a block plus its transaction references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    pub height: u64,
    pub hash: Option<B256>,
    /// Unix seconds.
    pub timestamp: u64,
    pub miner: Option<Address>,
    pub gas_used: u64,
    pub transactions: Vec<TxRef>,
}

impl BlockSummary {
    #[must_use]
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn has_transactions(&self) -> bool {
        !self.transactions.is_empty()
    }
}
