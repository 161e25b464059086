//! # gemsync-core
//!
//! Core types and utilities shared across all gemsync crates.
//!
//! This crate provides:
//! - `PackageName`, `PackageInfo`, `Page` and the version/owner records moved between
//!   the source registry and the sink analytics API
//! - `DependencyRecord`, the dependency payload derived from `PackageInfo`
//! - `SyncError` enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Data records exchanged with the remote APIs
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SyncError, SyncResult};
pub use types::{
    DependencyEntry, DependencyKind, DependencyRecord, DependencyRequirement, GemDependencies,
    OwnerList, OwnerRecord, PackageInfo, PackageName, Page, VersionList, VersionRecord,
};
