//! Dependency declarations and the record pushed to the sink.

use super::package::{PackageInfo, PackageName};
use serde::{Deserialize, Serialize};

/// A single `name` + `requirements` pair as the registry declares it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRequirement {
    pub name: String,
    /// Requirement string, e.g. `">= 1.2, < 3"`
    pub requirements: String,
}

impl DependencyRequirement {
    pub fn new(name: impl Into<String>, requirements: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: requirements.into(),
        }
    }
}

/// Dependency declarations of the current version, grouped by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemDependencies {
    #[serde(default)]
    pub development: Vec<DependencyRequirement>,
    #[serde(default)]
    pub runtime: Vec<DependencyRequirement>,
}

/// Type of dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Needed at runtime
    Runtime,
    /// Needed only to develop or test the package
    Development,
}

/// One flattened dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub name: String,
    pub requirements: String,
    pub kind: DependencyKind,
}

/// Payload of the sink's dependency write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: PackageName,
    pub version: Option<String>,
    pub dependencies: Vec<DependencyEntry>,
}

impl DependencyRecord {
    /// Runtime edges first, then development edges, each in declaration order
    pub fn from_info(info: &PackageInfo) -> Self {
        let declared = info.dependencies();
        let runtime = declared
            .runtime
            .iter()
            .map(|dep| DependencyEntry::new(dep, DependencyKind::Runtime));
        let development = declared
            .development
            .iter()
            .map(|dep| DependencyEntry::new(dep, DependencyKind::Development));

        Self {
            name: info.name().clone(),
            version: info.version().map(str::to_string),
            dependencies: runtime.chain(development).collect(),
        }
    }

    pub fn runtime(&self) -> impl Iterator<Item = &DependencyEntry> {
        self.dependencies.iter().filter(|dep| dep.kind.is_runtime())
    }
}

impl DependencyEntry {
    fn new(requirement: &DependencyRequirement, kind: DependencyKind) -> Self {
        Self {
            name: requirement.name.clone(),
            requirements: requirement.requirements.clone(),
            kind,
        }
    }
}

impl DependencyKind {
    /// Group key in the registry's dependency object
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::Runtime => "runtime",
            DependencyKind::Development => "development",
        }
    }

    /// Check if this dependency is needed at runtime
    pub fn is_runtime(&self) -> bool {
        matches!(self, DependencyKind::Runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_orders_runtime_before_development() {
        let info = PackageInfo::new("rails")
            .with_version("7.1.2")
            .with_dependency(DependencyKind::Development, "bundler", ">= 1.15.0")
            .with_dependency(DependencyKind::Runtime, "activesupport", "= 7.1.2")
            .with_dependency(DependencyKind::Runtime, "railties", "= 7.1.2");

        let record = info.dependency_record();

        assert_eq!(record.name.as_str(), "rails");
        assert_eq!(record.version.as_deref(), Some("7.1.2"));
        let names: Vec<_> = record.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["activesupport", "railties", "bundler"]);
        assert_eq!(record.runtime().count(), 2);
    }

    #[test]
    fn test_record_wire_shape() {
        let info = PackageInfo::new("rack")
            .with_version("3.0.8")
            .with_dependency(DependencyKind::Development, "minitest", "~> 5.0");

        let value = serde_json::to_value(info.dependency_record()).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "rack",
                "version": "3.0.8",
                "dependencies": [
                    { "name": "minitest", "requirements": "~> 5.0", "kind": "development" }
                ]
            })
        );
    }

    #[test]
    fn test_empty_dependencies() {
        let record = PackageInfo::new("tiny").dependency_record();
        assert!(record.dependencies.is_empty());
        assert_eq!(record.version, None);
    }
}
