//! Token metadata, holdings, and amount formatting.

use alloy_primitives::utils::format_units;
use alloy_primitives::{Address, U256};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Symbol, name and precision of an ERC-20 contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Formatted total supply, only known when the contract itself was probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<String>,
}

impl TokenMetadata {
    /// Placeholder used when a transfer's token has no cached metadata.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            symbol: "UNK".to_string(),
            name: String::new(),
            decimals: 18,
            total_supply: None,
        }
    }
}

/// Per-session metadata cache keyed by contract address.
///
/// Keys are parsed 20-byte addresses, so `0xAbC…` and `0xabc…` always land
/// on the same entry. Entries are never replaced: decimals and symbol are
/// treated as immutable for the lifetime of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadataCache {
    entries: HashMap<Address, TokenMetadata>,
}

impl TokenMetadataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `meta` unless the contract is already cached. Returns whether it was inserted.
    pub fn insert(&mut self, contract: Address, meta: TokenMetadata) -> bool {
        if self.entries.contains_key(&contract) {
            return false;
        }
        self.entries.insert(contract, meta);
        true
    }

    #[must_use]
    pub fn get(&self, contract: &Address) -> Option<&TokenMetadata> {
        self.entries.get(contract)
    }

    /// Looks up by a hex string in any letter case.
    #[must_use]
    pub fn get_str(&self, contract: &str) -> Option<&TokenMetadata> {
        contract
            .trim()
            .to_ascii_lowercase()
            .parse::<Address>()
            .ok()
            .and_then(|addr| self.entries.get(&addr))
    }

    #[must_use]
    pub fn contains(&self, contract: &Address) -> bool {
        self.entries.contains_key(contract)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &TokenMetadata)> {
        self.entries.iter()
    }
}

impl Serialize for TokenMetadataCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut sorted: Vec<_> = self.entries.iter().collect();
        sorted.sort_by_key(|(addr, _)| **addr);
        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (addr, meta) in sorted {
            map.serialize_entry(&format!("{addr:#x}"), meta)?;
        }
        map.end()
    }
}

/// One row of an address's holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingEntry {
    pub name: String,
    pub symbol: String,
    /// Balance formatted with the token's decimals.
    pub balance: String,
    /// `None` for the native asset.
    pub contract: Option<Address>,
    pub is_native: bool,
}

/// Formats a raw integer amount with `decimals` fractional digits.
///
/// Trailing zeros are trimmed but one fractional digit is always kept
/// (`1000000000000000000` at 18 decimals is `"1.0"`). Falls back to the raw
/// integer when `decimals` is out of range.
#[must_use]
pub fn format_amount(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    match format_units(value, decimals) {
        Ok(formatted) => match formatted.split_once('.') {
            Some((whole, frac)) => {
                let frac = frac.trim_end_matches('0');
                if frac.is_empty() {
                    format!("{whole}.0")
                } else {
                    format!("{whole}.{frac}")
                }
            }
            None => formatted,
        },
        Err(_) => value.to_string(),
    }
}
