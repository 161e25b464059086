//! # gemsync-pipeline
//!
//! The synchronization core: walk the sink's catalog a page at a time and copy each
//! package's detail, dependencies, versions and owners from the source registry into the
//! sink, with every remote call retried and every package isolated from the others.
//!
//! - `retry`: bounded exponential-backoff retry around one remote call
//! - `processor`: the seven-step per-package sequence and its outcomes
//! - `pool`: semaphore-bounded workers with a per-page barrier
//! - `driver`: the pagination state machine and the `run` entry point
//! - `stats`: outcome counters and the final report

pub mod driver;
pub mod pool;
pub mod processor;
pub mod retry;
pub mod stats;

#[cfg(test)]
mod test_support;

pub use driver::{DriverState, PipelineConfig, SyncDriver};
pub use pool::{PageBatch, WorkerPool, DEFAULT_CONCURRENCY};
pub use processor::{PackageOutcome, PackageProcessor, SyncStep};
pub use retry::{RetryConfig, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
pub use stats::{SyncReport, SyncStats};
