//! Owner records from the registry's ownership listing.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// An account allowed to push the package, kept exactly as the registry lists it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerRecord {
    fields: Map<String, Value>,
}

pub type OwnerList = Vec<OwnerRecord>;

impl OwnerRecord {
    pub fn new(id: u64, handle: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("handle".to_string(), Value::String(handle.into()));
        Self { fields }
    }

    pub fn id(&self) -> Option<u64> {
        self.fields.get("id").and_then(Value::as_u64)
    }

    pub fn handle(&self) -> Option<&str> {
        self.fields.get("handle").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
