//! In-memory chain used by unit tests.

use crate::common::error::{FeedError, Result};
use crate::sources::ChainAccess;
use crate::sources::erc20::IERC20;
use crate::types::{BlockSummary, FeeData, LogEvent, TRANSFER_TOPIC, TransactionRecord, TxRef};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Transaction whose hash depends only on `id`.
pub fn tx(id: u64, height: u64) -> TransactionRecord {
    TransactionRecord {
        hash: B256::from(U256::from(id)),
        from: Address::with_last_byte(0x11),
        to: Some(Address::with_last_byte(0x22)),
        block_number: height,
        value: U256::from(id),
        input: Bytes::new(),
        nonce: id,
        gas_price: None,
    }
}

/// ERC-20 `Transfer` log emitted by `token`.
pub fn transfer(token: Address, from: Address, to: Address, amount: u64, block: u64) -> LogEvent {
    LogEvent {
        address: token,
        topics: vec![TRANSFER_TOPIC, from.into_word(), to.into_word()],
        data: Bytes::from(U256::from(amount).to_be_bytes::<32>().to_vec()),
        block_number: block,
        transaction_hash: None,
        log_index: None,
    }
}

#[derive(Debug, Clone)]
pub struct MockToken {
    symbol: String,
    name: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    reverting_balance_of: bool,
}

impl MockToken {
    pub fn new(symbol: &str, name: &str, decimals: u8, total_supply: u64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            total_supply: U256::from(total_supply),
            balances: HashMap::new(),
            reverting_balance_of: false,
        }
    }

    pub fn with_balance(mut self, owner: Address, amount: u64) -> Self {
        self.balances.insert(owner, U256::from(amount));
        self
    }

    pub fn reverting_balance_of(mut self) -> Self {
        self.reverting_balance_of = true;
        self
    }

    fn answer(&self, data: &[u8]) -> Result<Vec<u8>> {
        let revert = || FeedError::ContractCallError("execution reverted".to_string());
        let selector: [u8; 4] = data.get(..4).and_then(|s| s.try_into().ok()).ok_or_else(revert)?;
        let out = match selector {
            s if s == IERC20::nameCall::SELECTOR => {
                IERC20::nameCall::abi_encode_returns(&(self.name.clone(),))
            }
            s if s == IERC20::symbolCall::SELECTOR => {
                IERC20::symbolCall::abi_encode_returns(&(self.symbol.clone(),))
            }
            s if s == IERC20::decimalsCall::SELECTOR => {
                IERC20::decimalsCall::abi_encode_returns(&(self.decimals,))
            }
            s if s == IERC20::totalSupplyCall::SELECTOR => {
                IERC20::totalSupplyCall::abi_encode_returns(&(self.total_supply,))
            }
            s if s == IERC20::balanceOfCall::SELECTOR => {
                if self.reverting_balance_of {
                    return Err(revert());
                }
                let call = IERC20::balanceOfCall::abi_decode(data, true)?;
                let balance = self.balances.get(&call.owner).copied().unwrap_or_default();
                IERC20::balanceOfCall::abi_encode_returns(&(balance,))
            }
            _ => return Err(revert()),
        };
        Ok(out)
    }
}

#[derive(Default)]
struct State {
    head: u64,
    gas_price: U256,
    network_id: u64,
    head_fails: bool,
    fee_fails: bool,
    blocks: HashMap<u64, BlockSummary>,
    failing_blocks: HashSet<u64>,
    transactions: HashMap<B256, TransactionRecord>,
    logs: Vec<LogEvent>,
    logs_fail: bool,
    balances: HashMap<Address, U256>,
    nonces: HashMap<Address, u64>,
    code: HashMap<Address, Bytes>,
    tokens: HashMap<Address, MockToken>,
}

/// Chain whose contents are set up by the test.
///
/// Missing blocks and transactions read as `Ok(None)`; anything marked as
/// failing returns an RPC error.
pub struct MockChain {
    state: Mutex<State>,
    latency: Option<Duration>,
    block_lookups: AtomicUsize,
    transaction_lookups: AtomicUsize,
}

impl MockChain {
    pub fn new(head: u64) -> Self {
        Self {
            state: Mutex::new(State {
                head,
                gas_price: U256::from(1_000_000_000u64),
                network_id: 1,
                ..State::default()
            }),
            latency: None,
            block_lookups: AtomicUsize::new(0),
            transaction_lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_token(self, address: Address, token: MockToken) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.code.insert(address, Bytes::from(vec![0x60, 0x80, 0x60, 0x40]));
            state.tokens.insert(address, token);
        }
        self
    }

    pub fn with_account(self, address: Address, balance: U256, nonce: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.balances.insert(address, balance);
            state.nonces.insert(address, nonce);
        }
        self
    }

    pub fn with_code(self, address: Address, code: Bytes) -> Self {
        self.state.lock().unwrap().code.insert(address, code);
        self
    }

    /// Every block lookup sleeps this long first.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Stores a block referencing `txs` by hash and registers the bodies.
    pub fn add_block(&self, height: u64, txs: Vec<TransactionRecord>) {
        let mut state = self.state.lock().unwrap();
        let refs = txs.iter().map(|t| TxRef::Hash(t.hash)).collect();
        for t in txs {
            state.transactions.insert(t.hash, t);
        }
        state.blocks.insert(
            height,
            BlockSummary {
                height,
                hash: Some(B256::from(U256::from(height) << 128)),
                timestamp: 1_700_000_000 + height * 12,
                miner: Some(Address::with_last_byte(0xee)),
                gas_used: 21_000,
                transactions: refs,
            },
        );
    }

    pub fn add_transaction(&self, tx: TransactionRecord) {
        self.state.lock().unwrap().transactions.insert(tx.hash, tx);
    }

    pub fn fail_block(&self, height: u64) {
        self.state.lock().unwrap().failing_blocks.insert(height);
    }

    pub fn add_log(&self, log: LogEvent) {
        self.state.lock().unwrap().logs.push(log);
    }

    pub fn fail_logs(&self) {
        self.state.lock().unwrap().logs_fail = true;
    }

    pub fn set_head(&self, head: u64) {
        self.state.lock().unwrap().head = head;
    }

    pub fn fail_head(&self) {
        self.state.lock().unwrap().head_fails = true;
    }

    pub fn fail_fee(&self) {
        self.state.lock().unwrap().fee_fails = true;
    }

    /// Clears head and fee failures.
    pub fn recover(&self) {
        let mut state = self.state.lock().unwrap();
        state.head_fails = false;
        state.fee_fails = false;
    }

    pub fn block_lookups(&self) -> usize {
        self.block_lookups.load(Ordering::SeqCst)
    }

    pub fn transaction_lookups(&self) -> usize {
        self.transaction_lookups.load(Ordering::SeqCst)
    }
}

fn unavailable(what: &str) -> FeedError {
    FeedError::RpcError(format!("{what} unavailable"))
}

#[async_trait]
impl ChainAccess for MockChain {
    async fn head_height(&self) -> Result<u64> {
        let state = self.state.lock().unwrap();
        if state.head_fails {
            return Err(unavailable("head"));
        }
        Ok(state.head)
    }

    async fn fee_data(&self) -> Result<FeeData> {
        let state = self.state.lock().unwrap();
        if state.fee_fails {
            return Err(unavailable("gas price"));
        }
        Ok(FeeData {
            gas_price: state.gas_price,
        })
    }

    async fn network_id(&self) -> Result<u64> {
        Ok(self.state.lock().unwrap().network_id)
    }

    async fn block(&self, height: u64, include_bodies: bool) -> Result<Option<BlockSummary>> {
        self.block_lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let state = self.state.lock().unwrap();
        if state.failing_blocks.contains(&height) {
            return Err(unavailable(&format!("block {height}")));
        }
        let Some(mut block) = state.blocks.get(&height).cloned() else {
            return Ok(None);
        };
        if include_bodies {
            block.transactions = block
                .transactions
                .into_iter()
                .map(|r| match state.transactions.get(&r.hash()) {
                    Some(body) => TxRef::Body(Box::new(body.clone())),
                    None => r,
                })
                .collect();
        }
        Ok(Some(block))
    }

    async fn transaction(&self, hash: B256) -> Result<Option<TransactionRecord>> {
        self.transaction_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().transactions.get(&hash).cloned())
    }

    async fn logs(&self, from: u64, to: u64, topics: &[B256]) -> Result<Vec<LogEvent>> {
        let state = self.state.lock().unwrap();
        if state.logs_fail {
            return Err(unavailable("logs"));
        }
        let mut logs: Vec<LogEvent> = state
            .logs
            .iter()
            .filter(|l| (from..=to).contains(&l.block_number))
            .filter(|l| topics.is_empty() || l.topic(0).is_some_and(|t| topics.contains(t)))
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.block_number);
        Ok(logs)
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        Ok(self.state.lock().unwrap().balances.get(&address).copied().unwrap_or_default())
    }

    async fn nonce(&self, address: Address) -> Result<u64> {
        Ok(self.state.lock().unwrap().nonces.get(&address).copied().unwrap_or_default())
    }

    async fn code(&self, address: Address) -> Result<Bytes> {
        Ok(self.state.lock().unwrap().code.get(&address).cloned().unwrap_or_default())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let state = self.state.lock().unwrap();
        let token = state
            .tokens
            .get(&to)
            .ok_or_else(|| FeedError::ContractCallError("execution reverted".to_string()))?;
        token.answer(&data).map(Bytes::from)
    }

    fn source_name(&self) -> &'static str {
        "mock"
    }
}
