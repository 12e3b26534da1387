//! Read-only views handed to the rendering layer.

use super::{BlockSummary, HoldingEntry, LogEvent, TokenMetadata, TokenMetadataCache, TransactionRecord};
use super::{TransferDirection, format_amount};
use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Gas price reported by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeData {
    pub gas_price: U256,
}

/// Health of the main feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedStatus {
    /// No cycle has completed yet.
    #[default]
    Initializing,
    /// The last cycle had to walk backwards to fill a sparse feed.
    Syncing,
    /// The last cycle completed from the live window alone.
    Live,
    /// The last cycle failed; the data is from the last good cycle.
    Error,
}

/// State of the main feed after a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub head_height: u64,
    pub fee_price: U256,
    pub network_id: u64,
    /// Latest blocks, newest first.
    pub blocks: Vec<BlockSummary>,
    /// Recent transactions, highest block first.
    pub transactions: Vec<TransactionRecord>,
    pub status: FeedStatus,
}

/// What kind of account an address is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    /// Externally owned account (no code).
    Eoa,
    /// Has code, but does not answer the ERC-20 metadata calls.
    Contract,
    /// Has code and answers name/symbol/totalSupply/decimals.
    Erc20Token,
}

impl AccountKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Eoa => "EOA WALLET",
            Self::Contract => "SMART CONTRACT",
            Self::Erc20Token => "ERC-20 TOKEN",
        }
    }
}

/// Everything known about one address after a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressView {
    pub address: Address,
    /// Native balance in the smallest unit.
    pub balance_raw: U256,
    /// Native balance formatted with 18 decimals.
    pub balance: String,
    pub nonce: u64,
    pub is_contract: bool,
    pub kind: AccountKind,
    /// Set when the address itself is an ERC-20 token.
    pub token_metadata: Option<TokenMetadata>,
    /// Native asset first, then every token with a positive balance.
    pub holdings: Vec<HoldingEntry>,
    /// Transfer logs involving the address, newest first.
    pub transfers: Vec<LogEvent>,
    pub metadata: TokenMetadataCache,
    /// Height the scan was anchored at.
    pub scanned_to: u64,
    pub scanned_from: u64,
}

impl AddressView {
    /// Direction of a transfer log relative to this address.
    #[must_use]
    pub fn direction(&self, log: &LogEvent) -> Option<TransferDirection> {
        log.as_transfer().map(|t| t.direction_for(self.address))
    }

    /// Transfer amount formatted with the token's cached decimals.
    ///
    /// Unknown tokens are formatted with 18 decimals.
    #[must_use]
    pub fn formatted_amount(&self, log: &LogEvent) -> Option<String> {
        let transfer = log.as_transfer()?;
        let decimals = self
            .metadata
            .get(&transfer.token)
            .map_or(18, |meta| meta.decimals);
        Some(format_amount(transfer.value, decimals))
    }

    /// Symbol for a transfer's token, `UNK` when not cached.
    #[must_use]
    pub fn token_symbol(&self, log: &LogEvent) -> String {
        self.metadata
            .get(&log.address)
            .map_or_else(|| TokenMetadata::unknown().symbol, |meta| meta.symbol.clone())
    }
}
