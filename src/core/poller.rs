//! Timer-driven poll loop publishing [`FeedSnapshot`]s.

use super::session::{CycleReport, FeedSession};
use crate::common::error::{FeedError, Result};
use crate::common::logging::{self, LogLevel};
use crate::config::FeedConfig;
use crate::sources::ChainAccess;
use crate::types::FeedSnapshot;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

fn failure_context(error: &FeedError, source: &str) -> String {
    if error.is_transient() {
        format!("Cycle failed on {source} (retrying next tick)")
    } else {
        format!("Cycle failed on {source} (needs operator attention)")
    }
}

/// Runs a [`FeedSession`] on a fixed interval until cancelled.
///
/// Every cycle, successful or not, publishes the session snapshot on a
/// `watch` channel. Ticks that fall due while a cycle is still running are
/// skipped, so cycles never overlap.
pub struct FeedPoller {
    config: FeedConfig,
    port: Arc<dyn ChainAccess>,
    session: FeedSession,
    updates: watch::Sender<FeedSnapshot>,
    cancellation_token: CancellationToken,
}

impl FeedPoller {
    #[must_use]
    pub fn new(config: FeedConfig, port: Arc<dyn ChainAccess>) -> Self {
        let session = FeedSession::new(&config);
        let (updates, _) = watch::channel(session.snapshot().clone());
        Self {
            config,
            port,
            session,
            updates,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Receiver that always holds the latest snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> &FeedSnapshot {
        self.session.snapshot()
    }

    #[must_use]
    pub fn session(&self) -> &FeedSession {
        &self.session
    }

    /// Returns a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Requests a graceful stop.
    pub fn shutdown(&self) {
        self.cancellation_token.cancel();
    }

    /// Runs one cycle and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns the cycle error after publishing the `Error` snapshot.
    pub async fn poll_once(&mut self) -> Result<CycleReport> {
        let started = Instant::now();
        let outcome = self.session.cycle(self.port.as_ref()).await;
        self.updates.send_replace(self.session.snapshot().clone());

        match &outcome {
            Ok(report) => {
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                let backfill = report
                    .backfilled
                    .map(|n| format!(", {n} backfilled"))
                    .unwrap_or_default();
                logging::log(
                    LogLevel::Success,
                    &format!(
                        "#{} | {} blocks, {} live{backfill}, {} new | feed {} | {:?} ({elapsed_ms}ms)",
                        report.head,
                        report.blocks,
                        report.live,
                        report.admitted,
                        self.session.aggregator().len(),
                        report.status,
                    ),
                );
            }
            Err(e) => logging::log_error(&failure_context(e, self.port.source_name()), &e.to_string()),
        }
        outcome
    }

    /// Polls until the cancellation token fires.
    ///
    /// Cycle failures never end the loop; the next tick simply retries.
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok(())` once cancelled.
    pub async fn start(mut self) -> Result<()> {
        logging::log_startup(
            &self.config.rpc_url,
            self.config.window_size,
            self.config.poll_interval_secs,
        );

        let token = self.cancellation_token.clone();
        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    // Errors are already logged and published.
                    let _ = self.poll_once().await;
                }
            }
        }

        logging::log(LogLevel::Info, "Feed poller stopped");
        Ok(())
    }
}
