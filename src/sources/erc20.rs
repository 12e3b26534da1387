//! Typed ERC-20 reads on top of [`ChainAccess::call`].

use super::ChainAccess;
use crate::common::error::{FeedError, Result};
use crate::core::scheduler::FetchScheduler;
use crate::types::{TokenMetadata, format_amount};
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Handle to one token contract. Every call goes through the scheduler.
pub struct Erc20<'a> {
    port: &'a dyn ChainAccess,
    scheduler: &'a FetchScheduler,
    address: Address,
}

impl<'a> Erc20<'a> {
    #[must_use]
    pub fn new(port: &'a dyn ChainAccess, scheduler: &'a FetchScheduler, address: Address) -> Self {
        Self {
            port,
            scheduler,
            address,
        }
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    async fn call<C: SolCall + Send>(&self, call: C) -> Result<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let out = self
            .scheduler
            .fetch("eth_call", self.port.call(self.address, data))
            .await?;
        if out.is_empty() {
            return Err(FeedError::ContractCallError(format!(
                "{} on {} returned no data",
                C::SIGNATURE,
                self.address
            )));
        }
        C::abi_decode_returns(&out, true).map_err(|e| {
            FeedError::ContractCallError(format!("{} on {}: {e}", C::SIGNATURE, self.address))
        })
    }

    /// # Errors
    ///
    /// Fails if the contract does not implement `name()`.
    pub async fn name(&self) -> Result<String> {
        Ok(self.call(IERC20::nameCall {}).await?._0)
    }

    /// # Errors
    ///
    /// Fails if the contract does not implement `symbol()`.
    pub async fn symbol(&self) -> Result<String> {
        Ok(self.call(IERC20::symbolCall {}).await?._0)
    }

    /// # Errors
    ///
    /// Fails if the contract does not implement `decimals()`.
    pub async fn decimals(&self) -> Result<u8> {
        Ok(self.call(IERC20::decimalsCall {}).await?._0)
    }

    /// # Errors
    ///
    /// Fails if the contract does not implement `totalSupply()`.
    pub async fn total_supply(&self) -> Result<U256> {
        Ok(self.call(IERC20::totalSupplyCall {}).await?._0)
    }

    /// # Errors
    ///
    /// Fails if the contract does not implement `balanceOf(address)`.
    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.call(IERC20::balanceOfCall { owner }).await?._0)
    }

    /// Metadata plus `owner`'s balance, all four calls issued together.
    ///
    /// # Errors
    ///
    /// Fails if any of the four calls fails.
    pub async fn metadata_and_balance(&self, owner: Address) -> Result<(TokenMetadata, U256)> {
        let (balance, symbol, name, decimals) = tokio::try_join!(
            self.balance_of(owner),
            self.symbol(),
            self.name(),
            self.decimals(),
        )?;
        Ok((
            TokenMetadata {
                symbol,
                name,
                decimals,
                total_supply: None,
            },
            balance,
        ))
    }

    /// ERC-20 interface probe: name, symbol, totalSupply and decimals must all
    /// answer. Any failure means "not a token" and yields `None`.
    pub async fn probe(&self) -> Option<TokenMetadata> {
        let probed = tokio::try_join!(
            self.name(),
            self.symbol(),
            self.total_supply(),
            self.decimals(),
        );
        match probed {
            Ok((name, symbol, supply, decimals)) => Some(TokenMetadata {
                symbol,
                name,
                decimals,
                total_supply: Some(format_amount(supply, decimals)),
            }),
            Err(e) => {
                log::debug!("{} is not ERC-20 like: {e}", self.address);
                None
            }
        }
    }
}
