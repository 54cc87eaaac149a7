use std::{
    collections::HashSet,
    time::{Duration, Instant},
};

use log::{info, warn};

use grid_shared::{BootstrapManifest, ItemKey};

use crate::{
    bootstrap::{BatchResult, FetchBatch, FetchKind},
    transport::HttpClient,
    FetchTracker,
};

/// Drives the skeleton, appearance and contact fetches to quorum.
///
/// Skeleton and contacts are requested as soon as the coordinator starts.
/// Appearance keys come partly from skeleton records, so that fetch is only
/// issued once the skeleton tracker is done. Failed batches are not retried;
/// their ids stay pending until the deadline drops them.
pub struct BootstrapCoordinator {
    fetch_url: String,
    batch_size: usize,
    timeout: Duration,
    appearance_seeds: Vec<ItemKey>,
    discovered: Vec<ItemKey>,
    skeleton: FetchTracker<ItemKey>,
    contacts: FetchTracker<ItemKey>,
    appearance: Option<FetchTracker<ItemKey>>,
    batches: Vec<FetchBatch>,
    requests_issued: usize,
}

impl BootstrapCoordinator {
    pub fn start(
        manifest: &BootstrapManifest,
        fetch_url: impl Into<String>,
        batch_size: usize,
        timeout: Duration,
        http: &mut dyn HttpClient,
        now: &Instant,
    ) -> Self {
        let mut coordinator = Self {
            fetch_url: fetch_url.into(),
            batch_size,
            timeout,
            appearance_seeds: manifest.appearance.clone(),
            discovered: Vec::new(),
            skeleton: FetchTracker::new(manifest.skeleton.iter().copied(), timeout, now),
            contacts: FetchTracker::new(manifest.contacts.iter().copied(), timeout, now),
            appearance: None,
            batches: Vec::new(),
            requests_issued: 0,
        };

        info!(
            "Bootstrapping {} skeleton and {} contact records",
            manifest.skeleton.len(),
            manifest.contacts.len()
        );
        coordinator.issue(FetchKind::Skeleton, &manifest.skeleton, http);
        coordinator.issue(FetchKind::Contacts, &manifest.contacts, http);
        coordinator
    }

    pub fn tracker(&self, kind: FetchKind) -> Option<&FetchTracker<ItemKey>> {
        match kind {
            FetchKind::Skeleton => Some(&self.skeleton),
            FetchKind::Contacts => Some(&self.contacts),
            FetchKind::Appearance => self.appearance.as_ref(),
        }
    }

    pub fn appearance_issued(&self) -> bool {
        self.appearance.is_some()
    }

    pub fn requests_issued(&self) -> usize {
        self.requests_issued
    }

    pub fn outstanding_batches(&self) -> usize {
        self.batches.len()
    }

    /// Every tracker is done, appearance included
    pub fn is_ready(&self, now: &Instant) -> bool {
        match &self.appearance {
            Some(appearance) => {
                appearance.is_done(now) && self.skeleton.is_done(now) && self.contacts.is_done(now)
            }
            None => false,
        }
    }

    /// Mean settled share across the three fetch kinds. An appearance fetch
    /// that has not been issued yet counts as nothing settled
    pub fn progress(&self) -> f32 {
        let settled: f32 = FetchKind::ALL
            .iter()
            .map(|kind| self.tracker(*kind).map_or(0.0, FetchTracker::progress))
            .sum();
        settled / FetchKind::ALL.len() as f32
    }

    /// Applies every reply that has arrived, expires overdue trackers and
    /// issues the appearance fetch once the skeleton is done. Returns the ids
    /// dropped on this call, once per id
    pub fn poll(
        &mut self,
        http: &mut dyn HttpClient,
        now: &Instant,
    ) -> Vec<(FetchKind, Vec<ItemKey>)> {
        let mut outstanding = Vec::with_capacity(self.batches.len());
        for mut batch in std::mem::take(&mut self.batches) {
            match batch.poll() {
                None => outstanding.push(batch),
                Some(BatchResult::Records(records)) => {
                    let kind = batch.kind();
                    for record in records {
                        if let Some(tracker) = self.tracker_mut(kind) {
                            tracker.update(&record.key);
                        }
                        if kind == FetchKind::Skeleton {
                            self.discovered.extend(record.linked);
                        }
                    }
                }
                Some(BatchResult::Failed(reason)) => {
                    warn!(
                        "Fetch of {} {} records failed: {}",
                        batch.len(),
                        batch.kind().name(),
                        reason
                    );
                }
            }
        }
        self.batches = outstanding;

        let mut dropped = Vec::new();
        for kind in FetchKind::ALL {
            if let Some(tracker) = self.tracker_mut(kind) {
                let expired = tracker.expire(now);
                if !expired.is_empty() {
                    dropped.push((kind, expired));
                }
            }
        }

        if self.appearance.is_none() && self.skeleton.is_done(now) {
            self.issue_appearance(http, now);
        }

        dropped
    }

    fn issue_appearance(&mut self, http: &mut dyn HttpClient, now: &Instant) {
        let mut seen = HashSet::new();
        let keys: Vec<ItemKey> = self
            .appearance_seeds
            .iter()
            .chain(self.discovered.iter())
            .copied()
            .filter(|key| seen.insert(*key))
            .collect();

        info!(
            "Skeleton settled, fetching {} appearance records",
            keys.len()
        );
        self.appearance = Some(FetchTracker::new(keys.iter().copied(), self.timeout, now));
        self.issue(FetchKind::Appearance, &keys, http);
    }

    fn issue(&mut self, kind: FetchKind, keys: &[ItemKey], http: &mut dyn HttpClient) {
        let batches = FetchBatch::issue_all(kind, keys, self.batch_size, &self.fetch_url, http);
        self.requests_issued += batches.len();
        self.batches.extend(batches);
    }

    fn tracker_mut(&mut self, kind: FetchKind) -> Option<&mut FetchTracker<ItemKey>> {
        match kind {
            FetchKind::Skeleton => Some(&mut self.skeleton),
            FetchKind::Contacts => Some(&mut self.contacts),
            FetchKind::Appearance => self.appearance.as_mut(),
        }
    }
}
