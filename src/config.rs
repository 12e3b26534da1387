//! Configuration for the feed engine.
//!
//! [`FeedConfigBuilder`] follows the usual builder flow: every knob has a
//! default, `with_*` methods override, and [`FeedConfigBuilder::build`]
//! validates the result.

use crate::common::error::{FeedError, Result};
use std::time::Duration;

/// How a batch of fetches is paced against the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// One request at a time, waiting `delay_ms` after each completes.
    Sequential { delay_ms: u64 },
    /// The whole batch at once, bounded by the scheduler's in-flight limit.
    Parallel,
}

/// Tuning for the backward history walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    /// Whether the walker runs at all.
    pub enabled: bool,
    /// The walker activates while `feed + incoming` is below this many transactions.
    pub target_feed_len: usize,
    /// A walk stops once it has discovered this many transactions.
    pub discovery_quota: usize,
    /// Blocks fetched per walker iteration.
    pub batch_size: u64,
    /// Hard upper bound on iterations per walk.
    pub max_attempts: u32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            target_feed_len: 20,
            discovery_quota: 5,
            batch_size: 5,
            max_attempts: 2,
        }
    }
}

/// Label for the chain's native asset in holdings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAsset {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeAsset {
    fn default() -> Self {
        Self {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Validated configuration shared by every component.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// JSON-RPC endpoint (http:// or https://).
    pub rpc_url: String,
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Number of latest blocks fetched per cycle.
    pub window_size: u64,
    /// Pacing used for the latest-block window.
    pub window_pacing: Pacing,
    /// Maximum number of transactions kept in the visible feed.
    pub feed_cap: usize,
    pub backfill: BackfillConfig,
    /// Upper bound on concurrent requests to the endpoint.
    pub max_in_flight: usize,
    /// Timeout applied to every individual request.
    pub request_timeout_ms: u64,
    /// Delay between sequential transaction-body fetches.
    pub tx_fetch_delay_ms: u64,
    /// Only the first N transaction references of a block are resolved.
    pub max_txs_per_block: usize,
    /// Ask the endpoint for inline transaction bodies instead of hashes.
    pub full_transactions: bool,
    /// How many blocks back the address scan looks for transfer logs.
    pub log_depth: u64,
    /// Maximum transfers kept in an address view.
    pub transfer_cap: usize,
    pub native_asset: NativeAsset,
}

impl FeedConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn tx_fetch_pacing(&self) -> Pacing {
        Pacing::Sequential {
            delay_ms: self.tx_fetch_delay_ms,
        }
    }
}

/// Builder for [`FeedConfig`].
#[derive(Debug, Default, Clone)]
pub struct FeedConfigBuilder {
    rpc_url: Option<String>,
    poll_interval_secs: Option<u64>,
    window_size: Option<u64>,
    window_pacing: Option<Pacing>,
    feed_cap: Option<usize>,
    backfill: Option<BackfillConfig>,
    max_in_flight: Option<usize>,
    request_timeout_ms: Option<u64>,
    tx_fetch_delay_ms: Option<u64>,
    max_txs_per_block: Option<usize>,
    full_transactions: bool,
    log_depth: Option<u64>,
    transfer_cap: Option<usize>,
    native_asset: Option<NativeAsset>,
}

impl FeedConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from environment variables.
    ///
    /// Reads `RPC_URL`, `POLL_INTERVAL_SECS`, `WINDOW_SIZE`, `FEED_CAP`,
    /// `BACKFILL_ENABLED`, `BACKFILL_TARGET`, `BACKFILL_QUOTA`,
    /// `BACKFILL_BATCH_SIZE`, `BACKFILL_MAX_ATTEMPTS`, `MAX_IN_FLIGHT`,
    /// `REQUEST_TIMEOUT_MS`, `LOG_DEPTH`, `NATIVE_NAME`, `NATIVE_SYMBOL` and
    /// `NATIVE_DECIMALS`.
    /// Unset variables keep their defaults; unparsable ones are an error.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::ConfigError`] when a variable is present but not a number.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::new();
        if let Ok(url) = std::env::var("RPC_URL") {
            builder = builder.with_rpc(url);
        }
        if let Some(v) = env_parse::<u64>("POLL_INTERVAL_SECS")? {
            builder = builder.with_poll_interval(v);
        }
        if let Some(v) = env_parse::<u64>("WINDOW_SIZE")? {
            builder = builder.with_window_size(v);
        }
        if let Some(v) = env_parse::<usize>("FEED_CAP")? {
            builder = builder.with_feed_cap(v);
        }
        if let Some(v) = env_parse::<usize>("MAX_IN_FLIGHT")? {
            builder = builder.with_max_in_flight(v);
        }
        if let Some(v) = env_parse::<u64>("REQUEST_TIMEOUT_MS")? {
            builder = builder.with_request_timeout_ms(v);
        }
        if let Some(v) = env_parse::<u64>("LOG_DEPTH")? {
            builder = builder.with_log_depth(v);
        }

        let mut backfill = BackfillConfig::default();
        if let Some(v) = env_parse::<bool>("BACKFILL_ENABLED")? {
            backfill.enabled = v;
        }
        if let Some(v) = env_parse::<usize>("BACKFILL_TARGET")? {
            backfill.target_feed_len = v;
        }
        if let Some(v) = env_parse::<usize>("BACKFILL_QUOTA")? {
            backfill.discovery_quota = v;
        }
        if let Some(v) = env_parse::<u64>("BACKFILL_BATCH_SIZE")? {
            backfill.batch_size = v;
        }
        if let Some(v) = env_parse::<u32>("BACKFILL_MAX_ATTEMPTS")? {
            backfill.max_attempts = v;
        }
        builder = builder.with_backfill(backfill);

        if let (Ok(name), Ok(symbol)) = (std::env::var("NATIVE_NAME"), std::env::var("NATIVE_SYMBOL"))
        {
            builder = builder.with_native_asset(name, symbol);
        }
        if let Some(v) = env_parse::<u8>("NATIVE_DECIMALS")? {
            builder = builder.with_native_decimals(v);
        }
        Ok(builder)
    }

    #[must_use]
    pub fn with_rpc(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, secs: u64) -> Self {
        self.poll_interval_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn with_window_size(mut self, blocks: u64) -> Self {
        self.window_size = Some(blocks);
        self
    }

    #[must_use]
    pub fn with_window_pacing(mut self, pacing: Pacing) -> Self {
        self.window_pacing = Some(pacing);
        self
    }

    #[must_use]
    pub fn with_feed_cap(mut self, cap: usize) -> Self {
        self.feed_cap = Some(cap);
        self
    }

    #[must_use]
    pub fn with_backfill(mut self, backfill: BackfillConfig) -> Self {
        self.backfill = Some(backfill);
        self
    }

    #[must_use]
    pub fn with_max_in_flight(mut self, max: usize) -> Self {
        self.max_in_flight = Some(max);
        self
    }

    #[must_use]
    pub fn with_request_timeout_ms(mut self, millis: u64) -> Self {
        self.request_timeout_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn with_tx_fetch_delay_ms(mut self, millis: u64) -> Self {
        self.tx_fetch_delay_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn with_max_txs_per_block(mut self, max: usize) -> Self {
        self.max_txs_per_block = Some(max);
        self
    }

    #[must_use]
    pub fn with_full_transactions(mut self, enabled: bool) -> Self {
        self.full_transactions = enabled;
        self
    }

    #[must_use]
    pub fn with_log_depth(mut self, blocks: u64) -> Self {
        self.log_depth = Some(blocks);
        self
    }

    #[must_use]
    pub fn with_transfer_cap(mut self, cap: usize) -> Self {
        self.transfer_cap = Some(cap);
        self
    }

    /// Relabels the native asset, keeping any decimals set earlier.
    #[must_use]
    pub fn with_native_asset(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        let decimals = self.native_asset.as_ref().map_or(18, |native| native.decimals);
        self.native_asset = Some(NativeAsset {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        });
        self
    }

    #[must_use]
    pub fn with_native_decimals(mut self, decimals: u8) -> Self {
        self.native_asset
            .get_or_insert_with(NativeAsset::default)
            .decimals = decimals;
        self
    }

    /// Validates and produces the final configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::ConfigError`] if the RPC URL is missing or not
    /// http(s), or if any size that must be positive is zero.
    pub fn build(self) -> Result<FeedConfig> {
        let rpc_url = self
            .rpc_url
            .ok_or_else(|| FeedError::ConfigError("RPC URL is required".to_string()))?;
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            return Err(FeedError::ConfigError(format!(
                "RPC URL must start with http:// or https://, got {rpc_url}"
            )));
        }

        let backfill = self.backfill.unwrap_or_default();
        let config = FeedConfig {
            rpc_url,
            poll_interval_secs: self.poll_interval_secs.unwrap_or(12),
            window_size: self.window_size.unwrap_or(6),
            window_pacing: self.window_pacing.unwrap_or(Pacing::Parallel),
            feed_cap: self.feed_cap.unwrap_or(30),
            backfill,
            max_in_flight: self.max_in_flight.unwrap_or(5),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(10_000),
            tx_fetch_delay_ms: self.tx_fetch_delay_ms.unwrap_or(50),
            max_txs_per_block: self.max_txs_per_block.unwrap_or(10),
            full_transactions: self.full_transactions,
            log_depth: self.log_depth.unwrap_or(5_000),
            transfer_cap: self.transfer_cap.unwrap_or(200),
            native_asset: self.native_asset.unwrap_or_default(),
        };

        let positive = [
            ("poll interval", config.poll_interval_secs),
            ("window size", config.window_size),
            ("feed cap", config.feed_cap as u64),
            ("max in-flight requests", config.max_in_flight as u64),
            ("request timeout", config.request_timeout_ms),
            ("backfill batch size", config.backfill.batch_size),
            ("backfill max attempts", u64::from(config.backfill.max_attempts)),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(FeedError::ConfigError(format!("{name} must be positive")));
            }
        }

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| FeedError::ConfigError(format!("{key} has invalid value {raw:?}"))),
        Err(_) => Ok(None),
    }
}
