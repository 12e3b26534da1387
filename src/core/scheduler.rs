//! Rate-limited fetch scheduling.
//!
//! Every chain call in the engine goes through a [`FetchScheduler`]. It caps
//! the number of requests in flight across all callers, bounds each call with
//! a timeout, and paces batches either one-by-one with a delay or as a bounded
//! parallel burst.

use crate::common::error::{FeedError, Result};
use crate::common::logging;
use crate::config::{FeedConfig, Pacing};
use futures_util::StreamExt;
use futures_util::stream::FuturesOrdered;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout};

/// Outcome of a best-effort fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Success(T),
    /// The fetch failed or timed out; the item is dropped from the batch.
    Skip,
}

impl<T> Fetched<T> {
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Skip => None,
        }
    }

    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }
}

/// Turns a finished best-effort request into a [`Fetched`], logging the failure.
pub fn settle<T>(label: &str, result: Result<T>) -> Fetched<T> {
    match result {
        Ok(value) => Fetched::Success(value),
        Err(e) => {
            logging::log_warning(&format!("Skipping {label}"), &e.to_string());
            Fetched::Skip
        }
    }
}

/// Keeps the successful values of a batch, in order.
pub fn successes<T>(batch: Vec<Fetched<T>>) -> Vec<T> {
    batch.into_iter().filter_map(Fetched::into_option).collect()
}

/// Shared gate in front of the chain port.
///
/// Cloning is cheap and clones share the same in-flight budget.
#[derive(Debug, Clone)]
pub struct FetchScheduler {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    timeout: Duration,
}

impl FetchScheduler {
    #[must_use]
    pub fn new(max_in_flight: usize, timeout: Duration) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(config.max_in_flight, config.request_timeout())
    }

    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Runs one strict request: waits for a permit, applies the timeout, and
    /// propagates any failure.
    ///
    /// # Errors
    ///
    /// Returns the request's own error, or [`FeedError::Timeout`] if it did not
    /// finish in time.
    pub async fn fetch<T, F>(&self, label: &'static str, request: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FeedError::InternalError("fetch scheduler closed".to_string()))?;

        match timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FeedError::Timeout {
                method: label.to_string(),
                millis: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Runs one best-effort request; failures are logged and become [`Fetched::Skip`].
    pub async fn best_effort<T, F>(&self, label: &'static str, request: F) -> Fetched<T>
    where
        F: Future<Output = Result<T>>,
    {
        settle(label, self.fetch(label, request).await)
    }

    /// Runs a best-effort request per item with the given pacing.
    ///
    /// Results come back in input order regardless of pacing. In parallel
    /// mode at most `max_in_flight` requests of the batch are pending at once.
    pub async fn run_batch<A, T, F, Fut>(
        &self,
        label: &'static str,
        pacing: Pacing,
        items: Vec<A>,
        make_request: F,
    ) -> Vec<Fetched<T>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut out = Vec::with_capacity(items.len());
        match pacing {
            Pacing::Sequential { delay_ms } => {
                for (i, item) in items.into_iter().enumerate() {
                    if i > 0 && delay_ms > 0 {
                        sleep(Duration::from_millis(delay_ms)).await;
                    }
                    out.push(self.best_effort(label, make_request(item)).await);
                }
            }
            Pacing::Parallel => {
                let mut pending = FuturesOrdered::new();
                for item in items {
                    if pending.len() >= self.max_in_flight {
                        if let Some(done) = pending.next().await {
                            out.push(done);
                        }
                    }
                    pending.push_back(self.best_effort(label, make_request(item)));
                }
                while let Some(done) = pending.next().await {
                    out.push(done);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let scheduler = FetchScheduler::new(2, Duration::from_secs(1));
        let results = scheduler
            .run_batch("test", Pacing::Parallel, (0..4).collect::<Vec<u32>>(), |i| async move {
                if i % 2 == 0 {
                    Ok(i)
                } else {
                    Err(FeedError::RpcError("boom".into()))
                }
            })
            .await;

        assert_eq!(
            results,
            vec![
                Fetched::Success(0),
                Fetched::Skip,
                Fetched::Success(2),
                Fetched::Skip
            ]
        );
        assert_eq!(successes(results), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_strict_fetch_propagates() {
        let scheduler = FetchScheduler::new(1, Duration::from_secs(1));
        let err = scheduler
            .fetch::<u32, _>("strict", async { Err(FeedError::RpcError("down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::RpcError(_)));
    }

    #[tokio::test]
    async fn test_timeout_becomes_error() {
        let scheduler = FetchScheduler::new(1, Duration::from_millis(20));
        let err = scheduler
            .fetch("slow", async {
                sleep(Duration::from_millis(500)).await;
                Ok(1u32)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_parallel_respects_in_flight_limit() {
        let scheduler = FetchScheduler::new(2, Duration::from_secs(1));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let results = scheduler
            .run_batch("bounded", Pacing::Parallel, (0..6).collect::<Vec<u32>>(), |i| {
                let current = current.clone();
                let peak = peak.clone();
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                }
            })
            .await;

        assert_eq!(successes(results), vec![0, 1, 2, 3, 4, 5]);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_sequential_spacing() {
        let scheduler = FetchScheduler::new(4, Duration::from_secs(1));
        let started = Instant::now();
        let results = scheduler
            .run_batch(
                "paced",
                Pacing::Sequential { delay_ms: 20 },
                (0..3).collect::<Vec<u32>>(),
                |i| async move { Ok(i) },
            )
            .await;

        assert_eq!(successes(results), vec![0, 1, 2]);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
