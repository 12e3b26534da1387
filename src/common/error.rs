//! Error types for the feed engine.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Everything that can go wrong while talking to the chain or building a view.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport-level failure reaching the RPC endpoint.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("RPC responded with error {code}: {message}")]
    RpcResponseError { code: i64, message: String },

    /// A single call exceeded the per-request timeout.
    #[error("{method} timed out after {millis}ms")]
    Timeout { method: String, millis: u64 },

    /// A response could not be decoded into the expected shape.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// A contract call reverted or returned data that does not match the ABI.
    #[error("Contract call failed: {0}")]
    ContractCallError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),
}

impl FeedError {
    /// Whether the failure is worth retrying on the next poll.
    ///
    /// Configuration and internal errors will fail the same way every time.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::ConfigError(_) | Self::InternalError(_))
    }
}
