//! Catalog pagination
//!
//! [`SyncDriver::run`] walks the sink catalog page by page from page 1. Every non-empty page
//! is handed to the [`WorkerPool`] and fully drained before the next page is requested; the
//! first empty page ends the run. Listing a page goes through the retry policy like any
//! other call, but unlike a package failure, a listing failure ends the whole run.

use std::sync::Arc;

use gemsync_core::{Page, SyncError, SyncResult};
use gemsync_registry::{SinkClient, SourceClient};
use tracing::{debug, info, info_span, Instrument};

use crate::pool::{PageBatch, WorkerPool, DEFAULT_CONCURRENCY};
use crate::processor::PackageProcessor;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::stats::{SyncReport, SyncStats};

/// First catalog page requested
const FIRST_PAGE: u32 = 1;

/// Tunables for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Worker pool width
    pub concurrency: usize,
    /// Applied to every remote call, page listings included
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryConfig::default(),
        }
    }
}

/// Where the driver is in the catalog walk
#[derive(Debug)]
pub enum DriverState {
    FetchingPage { page: u32 },
    DispatchingPage { page: Page },
    AwaitingPageCompletion { batch: PageBatch },
    Done,
    Failed(SyncError),
}

impl DriverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DriverState::Done | DriverState::Failed(_))
    }
}

pub struct SyncDriver {
    sink: Arc<dyn SinkClient>,
    processor: Arc<PackageProcessor>,
    pool: WorkerPool,
    retry: RetryPolicy,
}

impl SyncDriver {
    pub fn new(
        source: Arc<dyn SourceClient>,
        sink: Arc<dyn SinkClient>,
        config: PipelineConfig,
    ) -> Self {
        let retry = RetryPolicy::new(config.retry);
        let processor = Arc::new(PackageProcessor::new(source, sink.clone(), retry.clone()));

        Self {
            sink,
            processor,
            pool: WorkerPool::new(config.concurrency),
            retry,
        }
    }

    /// Synchronize the whole catalog. Only a page listing that exhausts its retries fails
    /// the run; every package-level problem is logged and counted in the report instead.
    pub async fn run(&self) -> SyncResult<SyncReport> {
        let stats = SyncStats::new();
        let mut state = DriverState::FetchingPage { page: FIRST_PAGE };

        while !state.is_terminal() {
            state = self.advance(state, &stats).await;
        }

        match state {
            DriverState::Failed(error) => Err(error),
            _ => {
                let report = stats.snapshot();
                info!(
                    event = "sync_completed",
                    pages = report.pages,
                    packages = report.packages(),
                    synced = report.synced,
                    incomplete = report.incomplete(),
                    "catalog sync completed"
                );
                Ok(report)
            }
        }
    }

    async fn advance(&self, state: DriverState, stats: &SyncStats) -> DriverState {
        match state {
            DriverState::FetchingPage { page } => match self.list_page(page).await {
                Ok(listed) if listed.is_empty() => {
                    debug!(page, "empty page, catalog exhausted");
                    DriverState::Done
                }
                Ok(listed) => DriverState::DispatchingPage { page: listed },
                Err(error) => DriverState::Failed(error),
            },
            DriverState::DispatchingPage { page } => {
                info!(
                    event = "page_started",
                    page = page.number,
                    packages = page.len(),
                    "processing page"
                );
                DriverState::AwaitingPageCompletion {
                    batch: self.pool.dispatch(page, &self.processor),
                }
            }
            DriverState::AwaitingPageCompletion { batch } => {
                let page = batch.page();
                batch
                    .wait(stats)
                    .instrument(info_span!("page", page))
                    .await;
                stats.record_page();

                info!(event = "page_completed", page, "page finished");
                DriverState::FetchingPage { page: page + 1 }
            }
            terminal => terminal,
        }
    }

    async fn list_page(&self, page: u32) -> SyncResult<Page> {
        let sink = &self.sink;
        self.retry.run("list_page", || sink.list_page(page)).await
    }
}
