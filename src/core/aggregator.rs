//! Bounded, deduplicated transaction feed.

use crate::types::TransactionRecord;
use alloy_primitives::B256;
use std::collections::HashSet;

/// Owns the visible feed and every hash ever admitted to it.
///
/// `seen` only grows. A transaction evicted from the tail of the feed keeps
/// its hash in `seen` and is never admitted again.
#[derive(Debug, Clone)]
pub struct TransactionAggregator {
    cap: usize,
    seen: HashSet<B256>,
    feed: Vec<TransactionRecord>,
}

impl TransactionAggregator {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            seen: HashSet::new(),
            feed: Vec::new(),
        }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Current feed, highest block first.
    #[must_use]
    pub fn feed(&self) -> &[TransactionRecord] {
        &self.feed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.feed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }

    #[must_use]
    pub fn has_seen(&self, hash: &B256) -> bool {
        self.seen.contains(hash)
    }

    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Merges this cycle's transactions into the feed and returns how many
    /// were admitted.
    ///
    /// `incoming` goes in front of the prior feed, so on equal heights new
    /// transactions sort first. Each hash is checked and recorded in one step,
    /// which also collapses duplicates inside `incoming`.
    pub fn merge(&mut self, incoming: Vec<TransactionRecord>) -> usize {
        let prior = std::mem::take(&mut self.feed);

        let mut next: Vec<TransactionRecord> = incoming
            .into_iter()
            .filter(|tx| self.seen.insert(tx.hash))
            .collect();
        let admitted = next.len();

        next.extend(prior);
        next.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        next.truncate(self.cap);
        self.feed = next;

        admitted
    }
}
