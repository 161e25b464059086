//! Remote API clients for gemsync
//!
//! This crate provides the two collaborators the sync pipeline talks to: the RubyGems
//! source registry, read through [`SourceClient`], and the BestGems analytics API, listed
//! and written through [`SinkClient`]. Clients make exactly one HTTP attempt per call;
//! retrying is the pipeline's job.

pub mod api;
pub mod client;
pub mod sink;
pub mod source;
pub mod traits;

// Re-export main types
pub use api::{CatalogEntry, OwnersPayload, VersionsPayload};
pub use client::{AuthConfig, HttpConfig};
pub use sink::BestGemsClient;
pub use source::{RubyGemsClient, DEFAULT_SOURCE_URL};
pub use traits::{SinkClient, SourceClient};

use gemsync_core::error::SyncError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, SyncError>;
