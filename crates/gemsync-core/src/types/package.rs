//! Package identity, detail records and catalog pages.

use super::dependency::{DependencyKind, DependencyRecord, DependencyRequirement, GemDependencies};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// Name of a package, the correlation key for every step of its sync
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PackageName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Package detail as served by the source registry
///
/// The detail object is kept exactly as received and is what serializes back out, so the
/// sink sees the registry's record untouched. `name`, `version` and `dependencies` are a
/// typed view parsed from it; the builders below update both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageInfo {
    name: PackageName,
    version: Option<String>,
    dependencies: GemDependencies,
    detail: Map<String, Value>,
}

/// Fields of the detail object the pipeline reads
#[derive(Deserialize)]
struct InfoView {
    name: PackageName,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: Option<GemDependencies>,
}

impl PackageInfo {
    /// Create package info with no version and no dependencies
    pub fn new(name: impl Into<PackageName>) -> Self {
        let name = name.into();
        let mut detail = Map::new();
        detail.insert("name".to_string(), Value::String(name.to_string()));

        Self {
            name,
            version: None,
            dependencies: GemDependencies::default(),
            detail,
        }
    }

    /// Set the current version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.detail
            .insert("version".to_string(), Value::String(version.clone()));
        self.version = Some(version);
        self
    }

    /// Declare a dependency of the current version
    pub fn with_dependency(
        mut self,
        kind: DependencyKind,
        name: impl Into<String>,
        requirements: impl Into<String>,
    ) -> Self {
        let requirement = DependencyRequirement::new(name, requirements);
        let entry = json!({ "name": requirement.name, "requirements": requirement.requirements });

        let groups = self
            .detail
            .entry("dependencies")
            .or_insert_with(|| json!({ "development": [], "runtime": [] }));
        if !groups.is_object() {
            *groups = json!({ "development": [], "runtime": [] });
        }
        match &mut groups[kind.as_str()] {
            Value::Array(items) => items.push(entry),
            other => *other = Value::Array(vec![entry]),
        }

        match kind {
            DependencyKind::Runtime => self.dependencies.runtime.push(requirement),
            DependencyKind::Development => self.dependencies.development.push(requirement),
        }
        self
    }

    pub fn name(&self) -> &PackageName {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn dependencies(&self) -> &GemDependencies {
        &self.dependencies
    }

    /// The detail object as received
    pub fn detail(&self) -> &Map<String, Value> {
        &self.detail
    }

    /// Flatten the runtime and development declarations into the sink's dependency record
    pub fn dependency_record(&self) -> DependencyRecord {
        DependencyRecord::from_info(self)
    }
}

impl Serialize for PackageInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.detail.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PackageInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let detail = Map::<String, Value>::deserialize(deserializer)?;
        let view: InfoView =
            serde_json::from_value(Value::Object(detail.clone())).map_err(D::Error::custom)?;

        Ok(Self {
            name: view.name,
            version: view.version,
            dependencies: view.dependencies.unwrap_or_default(),
            detail,
        })
    }
}

/// One page of the sink's package catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number this page was requested with
    pub number: u32,
    pub names: Vec<PackageName>,
}

impl Page {
    pub fn new(number: u32, names: Vec<PackageName>) -> Self {
        Self { number, names }
    }

    /// An empty page marks the end of the catalog
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageName> {
        self.names.iter()
    }

    pub fn into_names(self) -> Vec<PackageName> {
        self.names
    }
}
