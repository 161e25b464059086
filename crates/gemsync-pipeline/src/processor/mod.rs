//! Per-package synchronization
//!
//! [`PackageProcessor::process`] copies one package's metadata from the source registry to
//! the sink in seven sequential steps. Each remote call is retried on its own. A fetch that
//! finds nothing, or whose retries run out, stops the package with a step-specific error
//! log; a write whose retries run out is logged as `process_package`. Either way the
//! processor returns a [`PackageOutcome`] and never an error, so one bad package cannot
//! disturb its siblings. Writes already made are left in place.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use gemsync_core::{PackageName, SyncError, SyncResult};
use gemsync_registry::{SinkClient, SourceClient};
use tracing::{debug, error, info, info_span, Instrument};

use crate::retry::RetryPolicy;


/// The seven remote calls made for one package, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStep {
    FetchInfo,
    PutDetail,
    PutDependencies,
    FetchVersions,
    PutVersions,
    FetchOwners,
    PutOwners,
}

impl SyncStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::FetchInfo => "fetch_info",
            SyncStep::PutDetail => "put_detail",
            SyncStep::PutDependencies => "put_dependencies",
            SyncStep::FetchVersions => "fetch_versions",
            SyncStep::PutVersions => "put_versions",
            SyncStep::FetchOwners => "fetch_owners",
            SyncStep::PutOwners => "put_owners",
        }
    }

    /// Log event for a fetch that produced nothing; `None` for writes
    fn unavailable_event(&self) -> Option<&'static str> {
        match self {
            SyncStep::FetchInfo => Some("fetch_info_failed"),
            SyncStep::FetchVersions => Some("fetch_versions_failed"),
            SyncStep::FetchOwners => Some("fetch_owners_failed"),
            _ => None,
        }
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state reached by one package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageOutcome {
    /// All seven steps succeeded
    Synced,
    /// Info fetch found nothing or exhausted its retries; nothing was written
    InfoUnavailable,
    /// Detail and dependencies written, versions fetch gave up
    VersionsUnavailable,
    /// Everything but owners written
    OwnersUnavailable,
    /// A write exhausted its retries
    Failed { step: SyncStep },
}

impl PackageOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, PackageOutcome::Synced)
    }
}

/// A write that gave up, carried to the processor boundary
struct StepFailure {
    step: SyncStep,
    error: SyncError,
}

/// Copies one package at a time; shared by every worker of a run
pub struct PackageProcessor {
    source: Arc<dyn SourceClient>,
    sink: Arc<dyn SinkClient>,
    retry: RetryPolicy,
}

impl PackageProcessor {
    pub fn new(
        source: Arc<dyn SourceClient>,
        sink: Arc<dyn SinkClient>,
        retry: RetryPolicy,
    ) -> Self {
        Self { source, sink, retry }
    }

    /// Synchronize `name`. Never fails; the outcome says how far it got.
    pub async fn process(&self, name: &PackageName) -> PackageOutcome {
        let span = info_span!("package", package = %name);

        async {
            info!(event = "package_started", package = %name, "syncing package");

            match self.sync(name).await {
                Ok(outcome) => {
                    debug!(?outcome, "package finished");
                    outcome
                }
                Err(StepFailure { step, error }) => {
                    error!(
                        event = "process_package",
                        package = %name,
                        step = step.as_str(),
                        error_category = error.category(),
                        error_message = %error,
                        "package sync failed"
                    );
                    PackageOutcome::Failed { step }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn sync(&self, name: &PackageName) -> Result<PackageOutcome, StepFailure> {
        let source = &self.source;
        let sink = &self.sink;

        let Some(info) = self
            .fetch(SyncStep::FetchInfo, name, || source.fetch_info(name))
            .await
        else {
            return Ok(PackageOutcome::InfoUnavailable);
        };

        self.write(SyncStep::PutDetail, || sink.put_detail(&info)).await?;
        self.write(SyncStep::PutDependencies, || sink.put_dependencies(&info)).await?;

        let Some(versions) = self
            .fetch(SyncStep::FetchVersions, name, || source.fetch_versions(name))
            .await
        else {
            return Ok(PackageOutcome::VersionsUnavailable);
        };

        self.write(SyncStep::PutVersions, || sink.put_versions(name, &versions)).await?;

        let Some(owners) = self
            .fetch(SyncStep::FetchOwners, name, || source.fetch_owners(name))
            .await
        else {
            return Ok(PackageOutcome::OwnersUnavailable);
        };

        self.write(SyncStep::PutOwners, || sink.put_owners(name, &owners)).await?;

        Ok(PackageOutcome::Synced)
    }

    /// Retry a source read. Not-found and exhaustion both end in one error log and `None`.
    async fn fetch<T, F, Fut>(&self, step: SyncStep, name: &PackageName, call: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<Option<T>>>,
    {
        let event = step.unavailable_event().unwrap_or("process_package");

        match self.retry.run(step.as_str(), call).await {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                error!(
                    event,
                    package = %name,
                    reason = "not_found",
                    "package data not found on source"
                );
                None
            }
            Err(error) => {
                error!(
                    event,
                    package = %name,
                    reason = "retries_exhausted",
                    error_category = error.category(),
                    error_message = %error,
                    "giving up on source fetch"
                );
                None
            }
        }
    }

    /// Retry a sink write, tagging an exhausted failure with its step
    async fn write<F, Fut>(&self, step: SyncStep, call: F) -> Result<(), StepFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SyncResult<()>>,
    {
        self.retry
            .run(step.as_str(), call)
            .await
            .map_err(|error| StepFailure { step, error })
    }
}
