//! Token holdings discovered from an address's transfer logs.

use super::scheduler::{FetchScheduler, Fetched, settle};
use crate::config::{FeedConfig, NativeAsset};
use crate::sources::{ChainAccess, Erc20};
use crate::types::{HoldingEntry, LogEvent, TokenMetadata, TokenMetadataCache, format_amount};
use alloy_primitives::{Address, U256};
use futures_util::StreamExt;
use futures_util::stream::FuturesOrdered;
use std::collections::HashSet;

/// Holdings plus the metadata learned while resolving them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Holdings {
    /// Native asset first, then tokens with a positive balance.
    pub entries: Vec<HoldingEntry>,
    pub metadata: TokenMetadataCache,
}

pub struct HoldingsResolver {
    native: NativeAsset,
}

impl HoldingsResolver {
    #[must_use]
    pub fn new(native: NativeAsset) -> Self {
        Self { native }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.native_asset.clone())
    }

    /// Distinct emitting contracts, in first-seen order.
    #[must_use]
    pub fn distinct_contracts(logs: &[LogEvent]) -> Vec<Address> {
        let mut seen = HashSet::new();
        logs.iter()
            .map(|log| log.address)
            .filter(|addr| seen.insert(*addr))
            .collect()
    }

    fn native_entry(&self, balance: U256) -> HoldingEntry {
        HoldingEntry {
            name: self.native.name.clone(),
            symbol: self.native.symbol.clone(),
            balance: format_amount(balance, self.native.decimals),
            contract: None,
            is_native: true,
        }
    }

    async fn token_balance(
        contract: Address,
        owner: Address,
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> (Address, Fetched<(TokenMetadata, U256)>) {
        let result = Erc20::new(port, scheduler, contract)
            .metadata_and_balance(owner)
            .await;
        (contract, settle("token balance", result))
    }

    /// Queries every token contract seen in `logs` for `owner`'s balance and
    /// its metadata.
    ///
    /// A contract that fails any of the four calls is left out of both the
    /// holdings and the cache. `own_metadata` is the owner's own token
    /// metadata, when the owner is itself a token.
    pub async fn resolve(
        &self,
        owner: Address,
        native_balance: U256,
        logs: &[LogEvent],
        own_metadata: Option<&TokenMetadata>,
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> Holdings {
        let mut holdings = Holdings {
            entries: vec![self.native_entry(native_balance)],
            metadata: TokenMetadataCache::new(),
        };
        if let Some(meta) = own_metadata {
            holdings.metadata.insert(owner, meta.clone());
        }

        let limit = scheduler.max_in_flight();
        let mut resolved = Vec::new();
        let mut pending = FuturesOrdered::new();
        for contract in Self::distinct_contracts(logs) {
            if pending.len() >= limit {
                if let Some(done) = pending.next().await {
                    resolved.push(done);
                }
            }
            pending.push_back(Self::token_balance(contract, owner, port, scheduler));
        }
        while let Some(done) = pending.next().await {
            resolved.push(done);
        }

        for (contract, fetched) in resolved {
            let Some((meta, balance)) = fetched.into_option() else {
                continue;
            };
            if balance > U256::ZERO {
                holdings.entries.push(HoldingEntry {
                    name: meta.name.clone(),
                    symbol: meta.symbol.clone(),
                    balance: format_amount(balance, meta.decimals),
                    contract: Some(contract),
                    is_native: false,
                });
            }
            holdings.metadata.insert(contract, meta);
        }

        holdings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockChain, MockToken, transfer};
    use alloy_primitives::address;
    use std::time::Duration;

    const OWNER: Address = address!("00000000000000000000000000000000000000a1");
    const GOOD: Address = address!("00000000000000000000000000000000000000c1");
    const BROKEN: Address = address!("00000000000000000000000000000000000000c2");
    const EMPTY: Address = address!("00000000000000000000000000000000000000c3");
    const PEER: Address = address!("00000000000000000000000000000000000000b0");

    fn scheduler() -> FetchScheduler {
        FetchScheduler::new(2, Duration::from_secs(1))
    }

    #[test]
    fn test_distinct_contracts_first_seen_order() {
        let logs = vec![
            transfer(GOOD, OWNER, PEER, 1, 3),
            transfer(BROKEN, PEER, OWNER, 1, 2),
            transfer(GOOD, PEER, OWNER, 1, 1),
        ];
        assert_eq!(HoldingsResolver::distinct_contracts(&logs), vec![GOOD, BROKEN]);
    }

    #[tokio::test]
    async fn test_reverting_token_is_omitted() {
        let chain = MockChain::new(100)
            .with_token(GOOD, MockToken::new("GOOD", "Good Token", 6, 0).with_balance(OWNER, 2_000_000))
            .with_token(BROKEN, MockToken::new("BAD", "Broken", 18, 0).reverting_balance_of());
        let logs = vec![
            transfer(GOOD, PEER, OWNER, 2_000_000, 5),
            transfer(BROKEN, PEER, OWNER, 1, 4),
        ];
        let resolver = HoldingsResolver::new(NativeAsset::default());

        let holdings = resolver
            .resolve(OWNER, U256::from(10u64).pow(U256::from(18)), &logs, None, &chain, &scheduler())
            .await;

        assert_eq!(holdings.entries.len(), 2);
        assert!(holdings.entries[0].is_native);
        assert_eq!(holdings.entries[0].balance, "1.0");
        assert_eq!(holdings.entries[1].symbol, "GOOD");
        assert_eq!(holdings.entries[1].balance, "2.0");
        assert!(holdings.metadata.contains(&GOOD));
        assert!(!holdings.metadata.contains(&BROKEN));
    }

    #[tokio::test]
    async fn test_zero_balance_cached_but_not_held() {
        let chain = MockChain::new(100)
            .with_token(EMPTY, MockToken::new("ZERO", "Zero Balance", 18, 0));
        let logs = vec![transfer(EMPTY, OWNER, PEER, 5, 1)];
        let resolver = HoldingsResolver::new(NativeAsset::default());

        let holdings = resolver
            .resolve(OWNER, U256::ZERO, &logs, None, &chain, &scheduler())
            .await;

        assert_eq!(holdings.entries.len(), 1);
        assert_eq!(holdings.entries[0].balance, "0.0");
        assert_eq!(holdings.metadata.get(&EMPTY).unwrap().symbol, "ZERO");
    }

    #[tokio::test]
    async fn test_own_metadata_cached_with_supply() {
        let chain = MockChain::new(100)
            .with_token(OWNER, MockToken::new("SELF", "Self Token", 18, 1_000));
        let logs = vec![transfer(OWNER, PEER, PEER, 5, 1)];
        let own = TokenMetadata {
            symbol: "SELF".into(),
            name: "Self Token".into(),
            decimals: 18,
            total_supply: Some("0.000000000000001".into()),
        };
        let resolver = HoldingsResolver::new(NativeAsset::default());

        let holdings = resolver
            .resolve(OWNER, U256::ZERO, &logs, Some(&own), &chain, &scheduler())
            .await;

        assert_eq!(holdings.metadata.len(), 1);
        assert_eq!(holdings.metadata.get(&OWNER), Some(&own));
    }
}
