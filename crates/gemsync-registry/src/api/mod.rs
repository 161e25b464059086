//! Sink API wire types

use gemsync_core::{OwnerRecord, PackageName, VersionRecord};
use serde::{Deserialize, Serialize};

/// One row of the sink's catalog listing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogEntry {
    /// Package name
    pub name: PackageName,
}

/// Body of the versions write
#[derive(Debug, Serialize)]
pub struct VersionsPayload<'a> {
    pub versions: &'a [VersionRecord],
}

/// Body of the owners write
#[derive(Debug, Serialize)]
pub struct OwnersPayload<'a> {
    pub owners: &'a [OwnerRecord],
}
