//! Configuration parsing for gemsync
//!
//! This crate handles parsing and validation of `gemsync.toml`, layered with `GEMSYNC_*`
//! environment variables and command-line overrides into one [`SyncConfig`].

pub mod merge;
pub mod toml;

// Re-export main types
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource, CONFIG_FILE_NAME};
pub use crate::toml::{
    HttpSection, PoolSection, RetrySection, SinkSection, SourceSection, SyncConfig,
};

use gemsync_core::error::SyncError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, SyncError>;
