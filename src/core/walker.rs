//! Backward history walker.
//!
//! Tops the feed up from older blocks when the live window is sparse. The
//! walker owns a cursor that starts just below the live window and only ever
//! moves towards genesis, so every block is scanned at most once per session.

use super::resolve::{TransactionResolver, fetch_blocks};
use super::scheduler::FetchScheduler;
use crate::common::logging::{self, LogLevel};
use crate::config::{BackfillConfig, FeedConfig, Pacing};
use crate::sources::ChainAccess;
use crate::types::TransactionRecord;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Result of one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub transactions: Vec<TransactionRecord>,
    pub attempts: u32,
    pub blocks_scanned: usize,
    /// Cursor after the walk.
    pub cursor: u64,
}

/// Releases the single-flight flag when dropped, on every exit path.
struct WalkGuard<'a>(&'a AtomicBool);

impl Drop for WalkGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct CursorState {
    /// `None` until the first activation.
    next: Option<u64>,
    /// Set once genesis has been scanned.
    exhausted: bool,
}

/// Walks older blocks in bounded batches.
///
/// [`FeedSession::cycle`](super::FeedSession::cycle) awaits a walk inline, so
/// under the poller a slow walk delays the next live refresh and the
/// single-flight flag is never contended. The flag matters when a walker is
/// shared between tasks: a second `walk` while one is running returns `None`
/// instead of scanning the same blocks twice.
pub struct HistoryWalker {
    config: BackfillConfig,
    window_size: u64,
    include_bodies: bool,
    resolver: TransactionResolver,
    cursor: Mutex<CursorState>,
    in_flight: AtomicBool,
}

impl HistoryWalker {
    #[must_use]
    pub fn new(
        config: BackfillConfig,
        window_size: u64,
        include_bodies: bool,
        resolver: TransactionResolver,
    ) -> Self {
        Self {
            config,
            window_size,
            include_bodies,
            resolver,
            cursor: Mutex::new(CursorState::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(
            config.backfill.clone(),
            config.window_size,
            config.full_transactions,
            TransactionResolver::from_config(config),
        )
    }

    /// Next height the walker will scan, if it has been activated.
    #[must_use]
    pub fn cursor(&self) -> Option<u64> {
        self.cursor.lock().ok().and_then(|state| state.next)
    }

    /// Whether genesis has been reached.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.lock().is_ok_and(|state| state.exhausted)
    }

    #[must_use]
    pub fn is_walking(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether a walk should start given the feed size and this cycle's finds.
    #[must_use]
    pub fn should_activate(&self, held: usize, incoming: usize) -> bool {
        self.config.enabled
            && held + incoming < self.config.target_feed_len
            && !self.is_walking()
            && !self.is_exhausted()
    }

    fn try_acquire(&self) -> Option<WalkGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| WalkGuard(&self.in_flight))
    }

    /// Claims the cursor for one batch: initializes it on first use and
    /// returns the batch heights, or `None` once genesis has been scanned.
    fn next_batch(&self, head: u64) -> Option<Vec<u64>> {
        let mut state = self.cursor.lock().ok()?;
        if state.exhausted {
            return None;
        }
        let start = *state
            .next
            .get_or_insert_with(|| head.saturating_sub(self.window_size));
        let heights: Vec<u64> = (0..self.config.batch_size)
            .map_while(|offset| start.checked_sub(offset))
            .collect();

        if start < self.config.batch_size {
            state.next = Some(0);
            state.exhausted = true;
        } else {
            state.next = Some(start - self.config.batch_size);
        }
        Some(heights)
    }

    /// Walks backwards from the cursor.
    ///
    /// Returns `None` without touching the network if another walk is already
    /// running. Otherwise scans at most `max_attempts` batches, stopping early
    /// once `discovery_quota` transactions were found or genesis was reached.
    pub async fn walk(
        &self,
        head: u64,
        port: &dyn ChainAccess,
        scheduler: &FetchScheduler,
    ) -> Option<WalkReport> {
        let _guard = self.try_acquire()?;
        let mut report = WalkReport::default();

        while report.transactions.len() < self.config.discovery_quota
            && report.attempts < self.config.max_attempts
        {
            let Some(heights) = self.next_batch(head) else {
                break;
            };
            report.attempts += 1;
            report.blocks_scanned += heights.len();

            let blocks = fetch_blocks(
                heights,
                Pacing::Parallel,
                self.include_bodies,
                port,
                scheduler,
            )
            .await;
            report.transactions.extend(
                self.resolver
                    .resolve_blocks(&blocks, port, scheduler)
                    .await,
            );
        }

        report.cursor = self.cursor().unwrap_or(0);
        if !report.transactions.is_empty() {
            logging::log(
                LogLevel::Debug,
                &format!(
                    "Backfill found {} transactions in {} blocks (cursor now #{})",
                    report.transactions.len(),
                    report.blocks_scanned,
                    report.cursor
                ),
            );
        }
        Some(report)
    }
}
