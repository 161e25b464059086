//! Version records from the registry's version listing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One published version of a package
///
/// Only `number` is required. Every other key is kept as received, nulls included, so
/// the versions write repeats the registry's listing exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version number, e.g. `"7.1.2"` or `"1.0.0.rc1"`
    pub number: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Versions of a package, newest first as the registry orders them
pub type VersionList = Vec<VersionRecord>;

impl VersionRecord {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            extra: Map::new(),
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.extra
            .insert("platform".to_string(), Value::String(platform.into()));
        self
    }

    pub fn platform(&self) -> Option<&str> {
        self.extra.get("platform").and_then(Value::as_str)
    }

    pub fn created_at(&self) -> Option<&str> {
        self.extra.get("created_at").and_then(Value::as_str)
    }

    /// Platform-specific builds carry a platform other than `ruby`
    pub fn is_platform_specific(&self) -> bool {
        self.platform().is_some_and(|p| p != "ruby")
    }
}
