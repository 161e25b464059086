//! Bounded worker pool with a per-page barrier
//!
//! A page's packages are spawned together onto a [`JoinSet`]; each task waits for a permit
//! from a [`Semaphore`] of the pool's width before touching the network, so at most `width`
//! packages are in progress. [`PageBatch::wait`] drains the set, which makes it the barrier
//! between one page and the next.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gemsync_core::{Page, PackageName};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{error, Instrument};

use crate::processor::{PackageOutcome, PackageProcessor};
use crate::stats::SyncStats;

/// Packages processed at the same time unless configured otherwise
pub const DEFAULT_CONCURRENCY: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    width: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl WorkerPool {
    /// A width of zero is raised to one
    pub fn new(width: usize) -> Self {
        Self { width: width.max(1) }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Start processing every package on `page`
    pub fn dispatch(&self, page: Page, processor: &Arc<PackageProcessor>) -> PageBatch {
        let number = page.number;
        let permits = Arc::new(Semaphore::new(self.width));
        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for name in page.into_names() {
            let permits = permits.clone();
            let processor = processor.clone();
            let package = name.clone();

            let handle = tasks.spawn(
                async move {
                    // The semaphore lives only as long as this page and is never closed
                    let _permit = permits.acquire_owned().await;
                    processor.process(&package).await
                }
                .in_current_span(),
            );
            names.insert(handle.id(), name);
        }

        PageBatch {
            page: number,
            tasks,
            names,
        }
    }
}

/// Work spawned for one page, not yet awaited
pub struct PageBatch {
    page: u32,
    tasks: JoinSet<PackageOutcome>,
    names: HashMap<Id, PackageName>,
}

impl fmt::Debug for PageBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageBatch")
            .field("page", &self.page)
            .field("pending", &self.tasks.len())
            .finish()
    }
}

impl PageBatch {
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Wait for every package of the page, recording outcomes. A worker that panicked is
    /// logged with its package and counted; it does not affect the others.
    pub async fn wait(mut self, stats: &SyncStats) {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => stats.record(&outcome),
                Err(e) => {
                    let package = self
                        .names
                        .get(&e.id())
                        .map_or("<unknown>", PackageName::as_str);
                    error!(
                        event = "worker_panicked",
                        page = self.page,
                        package,
                        error_message = %e,
                        "worker task aborted"
                    );
                    stats.record_panic();
                }
            }
        }
    }
}
