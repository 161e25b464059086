//! Run statistics

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::processor::PackageOutcome;

/// Outcome counters shared by every worker of a run
#[derive(Debug, Default)]
pub struct SyncStats {
    pages: AtomicU64,
    synced: AtomicU64,
    info_unavailable: AtomicU64,
    versions_unavailable: AtomicU64,
    owners_unavailable: AtomicU64,
    failed: AtomicU64,
    panicked: AtomicU64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &PackageOutcome) {
        let counter = match outcome {
            PackageOutcome::Synced => &self.synced,
            PackageOutcome::InfoUnavailable => &self.info_unavailable,
            PackageOutcome::VersionsUnavailable => &self.versions_unavailable,
            PackageOutcome::OwnersUnavailable => &self.owners_unavailable,
            PackageOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A worker died before reporting an outcome
    pub fn record_panic(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_page(&self) {
        self.pages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncReport {
        SyncReport {
            pages: self.pages.load(Ordering::Relaxed),
            synced: self.synced.load(Ordering::Relaxed),
            info_unavailable: self.info_unavailable.load(Ordering::Relaxed),
            versions_unavailable: self.versions_unavailable.load(Ordering::Relaxed),
            owners_unavailable: self.owners_unavailable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Non-empty pages fully processed
    pub pages: u64,
    pub synced: u64,
    pub info_unavailable: u64,
    pub versions_unavailable: u64,
    pub owners_unavailable: u64,
    /// Packages stopped by a write that exhausted its retries
    pub failed: u64,
    pub panicked: u64,
}

impl SyncReport {
    /// Every package handed to a worker
    pub fn packages(&self) -> u64 {
        self.synced
            + self.info_unavailable
            + self.versions_unavailable
            + self.owners_unavailable
            + self.failed
            + self.panicked
    }

    /// Packages that stopped short of the final write
    pub fn incomplete(&self) -> u64 {
        self.packages() - self.synced
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packages on {} pages: {} synced, {} without info, {} without versions, \
             {} without owners, {} failed",
            self.packages(),
            self.pages,
            self.synced,
            self.info_unavailable,
            self.versions_unavailable,
            self.owners_unavailable,
            self.failed + self.panicked,
        )
    }
}
