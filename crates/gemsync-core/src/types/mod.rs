//! Core data types for gemsync.
//!
//! This module provides the records moved from the source registry to the sink:
//! - Package names, package info and catalog pages
//! - Dependency declarations and the derived dependency record
//! - Version and owner records

pub mod dependency;
pub mod owner;
pub mod package;
pub mod version;

// Re-export all public types
pub use dependency::{
    DependencyEntry, DependencyKind, DependencyRecord, DependencyRequirement, GemDependencies,
};
pub use owner::{OwnerList, OwnerRecord};
pub use package::{PackageInfo, PackageName, Page};
pub use version::{VersionList, VersionRecord};
