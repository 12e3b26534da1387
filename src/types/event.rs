//! Event logs and ERC-20 transfer decoding.

use alloy_primitives::{Address, B256, Bytes, U256, b256};
use serde::Serialize;

/// `keccak256("Transfer(address,address,uint256)")`.
pub const TRANSFER_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// A single event log as returned by `eth_getLogs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Emitting contract.
    pub address: Address,
    /// topic0 is the event signature, the rest are indexed parameters.
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

impl LogEvent {
    #[must_use]
    pub fn topic(&self, index: usize) -> Option<&B256> {
        self.topics.get(index)
    }

    /// Whether `target` emitted this log or appears as its first or second
    /// indexed parameter.
    #[must_use]
    pub fn involves(&self, target: Address) -> bool {
        let padded = target.into_word();
        self.address == target
            || self.topic(1) == Some(&padded)
            || self.topic(2) == Some(&padded)
    }

    /// Display name for the event based on topic0.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        self.topic(0)
            .map_or("Log Event", super::selectors::event_name)
    }

    /// Decodes a `Transfer(address,address,uint256)` log.
    ///
    /// ERC-721 transfers index the token id as a fourth topic and carry no
    /// data; the id is returned as the value in that case.
    #[must_use]
    pub fn as_transfer(&self) -> Option<TransferEvent> {
        if self.topic(0) != Some(&TRANSFER_TOPIC) {
            return None;
        }
        let from = Address::from_word(*self.topic(1)?);
        let to = Address::from_word(*self.topic(2)?);
        let value = if self.data.len() >= 32 {
            U256::from_be_slice(&self.data[..32])
        } else if let Some(id) = self.topic(3) {
            U256::from_be_bytes(id.0)
        } else {
            U256::ZERO
        };
        Some(TransferEvent {
            token: self.address,
            from,
            to,
            value,
            block_number: self.block_number,
            transaction_hash: self.transaction_hash,
        })
    }
}

/// Which side of a transfer the viewed address is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

/// A decoded token transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub block_number: u64,
    pub transaction_hash: Option<B256>,
}

impl TransferEvent {
    /// Incoming iff the viewed address is the receiver; anything else,
    /// including a token contract viewing its own transfers, is outgoing.
    #[must_use]
    pub fn direction_for(&self, viewer: Address) -> TransferDirection {
        if self.to == viewer {
            TransferDirection::Incoming
        } else {
            TransferDirection::Outgoing
        }
    }
}
