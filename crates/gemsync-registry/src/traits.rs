//! Collaborator interfaces consumed by the sync pipeline.

use async_trait::async_trait;
use gemsync_core::{OwnerList, PackageInfo, PackageName, Page, VersionList};

use crate::RegistryResult;

/// Read side: the authoritative per-package metadata
///
/// `Ok(None)` means the registry answered and has no such data. `Err` is reserved for
/// failures worth retrying (transport errors, unexpected statuses, bad bodies).
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch the detail record of the package's current version
    async fn fetch_info(&self, name: &PackageName) -> RegistryResult<Option<PackageInfo>>;

    /// Fetch every published version
    async fn fetch_versions(&self, name: &PackageName) -> RegistryResult<Option<VersionList>>;

    /// Fetch the accounts that own the package
    async fn fetch_owners(&self, name: &PackageName) -> RegistryResult<Option<OwnerList>>;
}

/// Write side: the catalog to walk and the endpoints receiving metadata
#[async_trait]
pub trait SinkClient: Send + Sync {
    /// List one page of known package names. An empty page ends the catalog.
    async fn list_page(&self, page: u32) -> RegistryResult<Page>;

    async fn put_detail(&self, info: &PackageInfo) -> RegistryResult<()>;

    /// Write the dependency record derived from `info`
    async fn put_dependencies(&self, info: &PackageInfo) -> RegistryResult<()>;

    async fn put_versions(&self, name: &PackageName, versions: &VersionList)
        -> RegistryResult<()>;

    async fn put_owners(&self, name: &PackageName, owners: &OwnerList) -> RegistryResult<()>;
}
