use std::{
    collections::HashSet,
    fmt::Debug,
    hash::Hash,
    time::{Duration, Instant},
};

use log::warn;

use grid_shared::Timer;

/// Quorum tracker over a fixed set of ids.
///
/// Every id handed to [`FetchTracker::new`] lives in exactly one of three
/// sets: pending, complete, or dropped. Ids only ever leave pending. The
/// tracker is done when nothing is pending or its deadline has passed; once
/// the deadline passes, [`FetchTracker::expire`] moves whatever is still
/// pending into dropped. Dropped ids are reported, never retried.
pub struct FetchTracker<K> {
    pending: HashSet<K>,
    complete: HashSet<K>,
    dropped: HashSet<K>,
    deadline: Timer,
}

impl<K: Clone + Debug + Eq + Hash> FetchTracker<K> {
    pub fn new<I: IntoIterator<Item = K>>(ids: I, timeout: Duration, now: &Instant) -> Self {
        Self {
            pending: ids.into_iter().collect(),
            complete: HashSet::new(),
            dropped: HashSet::new(),
            deadline: Timer::new(timeout, now),
        }
    }

    /// Marks `id` as arrived. Unknown, duplicate and late ids are ignored.
    /// Returns whether anything changed
    pub fn update(&mut self, id: &K) -> bool {
        if let Some(id) = self.pending.take(id) {
            self.complete.insert(id);
            true
        } else {
            false
        }
    }

    pub fn is_done(&self, now: &Instant) -> bool {
        self.pending.is_empty() || self.deadline.ringing(now)
    }

    /// Once the deadline has passed, drops every id still pending and
    /// returns them. Returns nothing before the deadline or on later calls
    pub fn expire(&mut self, now: &Instant) -> Vec<K> {
        if self.pending.is_empty() || !self.deadline.ringing(now) {
            return Vec::new();
        }

        let total = self.len();
        let expired: Vec<K> = self.pending.drain().collect();
        warn!(
            "Fetch deadline of {:?} passed with {} of {} ids missing, dropping them",
            self.deadline.duration(),
            expired.len(),
            total,
        );
        self.dropped.extend(expired.iter().cloned());
        expired
    }

    pub fn is_pending(&self, id: &K) -> bool {
        self.pending.contains(id)
    }

    pub fn is_complete(&self, id: &K) -> bool {
        self.complete.contains(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &K> {
        self.pending.iter()
    }

    pub fn complete(&self) -> impl Iterator<Item = &K> {
        self.complete.iter()
    }

    /// Ids dropped at the deadline
    pub fn failed(&self) -> impl Iterator<Item = &K> {
        self.dropped.iter()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn complete_count(&self) -> usize {
        self.complete.len()
    }

    pub fn failed_count(&self) -> usize {
        self.dropped.len()
    }

    /// Number of ids the tracker was built with
    pub fn len(&self) -> usize {
        self.pending.len() + self.complete.len() + self.dropped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fraction of ids that are no longer pending
    pub fn progress(&self) -> f32 {
        let total = self.len();
        if total == 0 {
            return 1.0;
        }
        (total - self.pending.len()) as f32 / total as f32
    }
}
