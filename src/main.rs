//! `evm-feed` command line.
//!
//! With no arguments, polls the configured endpoint and prints a line per
//! cycle until Ctrl+C. With an address argument, scans that address once and
//! prints the view as JSON.

#![warn(clippy::all, clippy::pedantic)]

use alloy_primitives::Address;
use evm_feed::common::logging::{self, LogLevel};
use evm_feed::{AddressScanner, FeedConfigBuilder, FeedError, FeedPoller, JsonRpcClient};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let config = FeedConfigBuilder::from_env()?.build()?;
    let client = JsonRpcClient::new(&config)?;

    if let Some(arg) = env::args().nth(1) {
        let target: Address = arg
            .parse()
            .map_err(|e| FeedError::ConfigError(format!("invalid address {arg}: {e}")))?;
        let view = AddressScanner::new(&config).scan(target, &client).await?;
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    let poller = FeedPoller::new(config, Arc::new(client));
    let token = poller.cancellation_token();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logging::log(LogLevel::Info, "Received Ctrl+C, shutting down...");
            token.cancel();
        }
    });

    poller.start().await?;
    Ok(())
}
