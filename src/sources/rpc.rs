//! JSON-RPC over HTTP implementation of [`ChainAccess`].

use super::ChainAccess;
use crate::common::error::{FeedError, Result};
use crate::config::FeedConfig;
use crate::types::{BlockSummary, FeeData, LogEvent, TransactionRecord, TxRef};
use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

/// HTTP JSON-RPC client for an EVM node or gateway.
pub struct JsonRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    hash: B256,
    from: Address,
    to: Option<Address>,
    block_number: Option<U64>,
    #[serde(default)]
    value: U256,
    #[serde(default)]
    input: Bytes,
    #[serde(default)]
    nonce: U64,
    gas_price: Option<U256>,
}

impl From<RawTransaction> for TransactionRecord {
    fn from(raw: RawTransaction) -> Self {
        Self {
            hash: raw.hash,
            from: raw.from,
            to: raw.to,
            block_number: raw.block_number.map_or(0, |n| n.to::<u64>()),
            value: raw.value,
            input: raw.input,
            nonce: raw.nonce.to::<u64>(),
            gas_price: raw.gas_price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTxRef {
    Hash(B256),
    Body(Box<RawTransaction>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBlock {
    number: U64,
    hash: Option<B256>,
    timestamp: U64,
    miner: Option<Address>,
    #[serde(default)]
    gas_used: U64,
    #[serde(default)]
    transactions: Vec<RawTxRef>,
}

impl From<RawBlock> for BlockSummary {
    fn from(raw: RawBlock) -> Self {
        let transactions = raw
            .transactions
            .into_iter()
            .map(|tx| match tx {
                RawTxRef::Hash(hash) => TxRef::Hash(hash),
                RawTxRef::Body(body) => TxRef::Body(Box::new((*body).into())),
            })
            .collect();
        Self {
            height: raw.number.to::<u64>(),
            hash: raw.hash,
            timestamp: raw.timestamp.to::<u64>(),
            miner: raw.miner,
            gas_used: raw.gas_used.to::<u64>(),
            transactions,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLog {
    address: Address,
    topics: Vec<B256>,
    #[serde(default)]
    data: Bytes,
    block_number: Option<U64>,
    transaction_hash: Option<B256>,
    log_index: Option<U64>,
}

impl From<RawLog> for LogEvent {
    fn from(raw: RawLog) -> Self {
        Self {
            address: raw.address,
            topics: raw.topics,
            data: raw.data,
            block_number: raw.block_number.map_or(0, |n| n.to::<u64>()),
            transaction_hash: raw.transaction_hash,
            log_index: raw.log_index.map(|n| n.to::<u64>()),
        }
    }
}

impl JsonRpcClient {
    /// Creates a client for `config.rpc_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            url: config.rpc_url.clone(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one request and decodes its `result`.
    ///
    /// A `null` result decodes fine into `Option<T>`; for any other `T` it is a
    /// decoding error.
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| FeedError::RpcError(format!("{method}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::RpcError(format!("{method}: HTTP {status}")));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| FeedError::DecodingError(format!("{method}: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(FeedError::RpcResponseError {
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| FeedError::DecodingError(format!("{method}: {e}")))
    }
}

#[async_trait]
impl ChainAccess for JsonRpcClient {
    async fn head_height(&self) -> Result<u64> {
        let n: U64 = self.request("eth_blockNumber", json!([])).await?;
        Ok(n.to::<u64>())
    }

    async fn fee_data(&self) -> Result<FeeData> {
        let gas_price: U256 = self.request("eth_gasPrice", json!([])).await?;
        Ok(FeeData { gas_price })
    }

    async fn network_id(&self) -> Result<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    async fn block(&self, height: u64, include_bodies: bool) -> Result<Option<BlockSummary>> {
        let raw: Option<RawBlock> = self
            .request(
                "eth_getBlockByNumber",
                json!([format!("{height:#x}"), include_bodies]),
            )
            .await?;
        Ok(raw.map(BlockSummary::from))
    }

    async fn transaction(&self, hash: B256) -> Result<Option<TransactionRecord>> {
        let raw: Option<RawTransaction> = self
            .request("eth_getTransactionByHash", json!([hash]))
            .await?;
        Ok(raw.map(TransactionRecord::from))
    }

    async fn logs(&self, from: u64, to: u64, topics: &[B256]) -> Result<Vec<LogEvent>> {
        let filter = json!({
            "fromBlock": format!("{from:#x}"),
            "toBlock": format!("{to:#x}"),
            "topics": [topics],
        });
        let raw: Vec<RawLog> = self.request("eth_getLogs", json!([filter])).await?;
        Ok(raw.into_iter().map(LogEvent::from).collect())
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    async fn nonce(&self, address: Address) -> Result<u64> {
        let n: U64 = self
            .request("eth_getTransactionCount", json!([address, "latest"]))
            .await?;
        Ok(n.to::<u64>())
    }

    async fn code(&self, address: Address) -> Result<Bytes> {
        self.request("eth_getCode", json!([address, "latest"])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    fn source_name(&self) -> &'static str {
        "JSON-RPC"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_with_hash_references() {
        let raw: RawBlock = serde_json::from_value(json!({
            "number": "0x3e8",
            "hash": format!("0x{}", "11".repeat(32)),
            "timestamp": "0x65000000",
            "miner": "0x0000000000000000000000000000000000000001",
            "gasUsed": "0x5208",
            "transactions": [format!("0x{}", "aa".repeat(32))]
        }))
        .unwrap();
        let block = BlockSummary::from(raw);

        assert_eq!(block.height, 1000);
        assert_eq!(block.gas_used, 21_000);
        assert_eq!(block.transactions, vec![TxRef::Hash(B256::repeat_byte(0xaa))]);
    }

    #[test]
    fn test_block_with_inline_bodies() {
        let raw: RawBlock = serde_json::from_value(json!({
            "number": "0x1",
            "timestamp": "0x0",
            "transactions": [{
                "hash": format!("0x{}", "bb".repeat(32)),
                "from": "0x0000000000000000000000000000000000000002",
                "to": null,
                "blockNumber": "0x1",
                "value": "0x0",
                "input": "0x6080604052",
                "nonce": "0x7",
                "gasPrice": "0x3b9aca00"
            }]
        }))
        .unwrap();
        let block = BlockSummary::from(raw);

        match &block.transactions[0] {
            TxRef::Body(tx) => {
                assert!(tx.is_contract_creation());
                assert_eq!(tx.nonce, 7);
                assert_eq!(tx.method_name(), "contractCreation");
            }
            TxRef::Hash(_) => panic!("expected inline body"),
        }
    }
}
