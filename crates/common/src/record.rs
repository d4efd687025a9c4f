//! Record and relationship types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RecordId;

/// Record type identifiers understood by the remote service.
pub mod record_type {
    pub const LAND: &str = "asset--land";
    pub const STRUCTURE: &str = "asset--structure";
    pub const PLANT: &str = "asset--plant";
    pub const EQUIPMENT: &str = "asset--equipment";
    pub const STANDARD_QUANTITY: &str = "quantity--standard";
    pub const ACTIVITY_LOG: &str = "log--activity";
    pub const SEEDING_LOG: &str = "log--seeding";
    pub const PLANT_TYPE: &str = "taxonomy_term--plant_type";
    pub const LOG_CATEGORY: &str = "taxonomy_term--log_category";
    pub const UNIT: &str = "taxonomy_term--unit";
}

/// A reference to another record, as stored in a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "type")]
    pub record_type: String,
    pub id: RecordId,
}

impl RecordRef {
    pub fn new(record_type: impl Into<String>, id: RecordId) -> Self {
        Self {
            record_type: record_type.into(),
            id,
        }
    }
}

/// A record held by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub record_type: String,
    pub id: RecordId,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub relationships: BTreeMap<String, Vec<RecordRef>>,
}

impl Record {
    /// Creates an empty record of the given type with a fresh client-side id.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            id: RecordId::new(),
            attributes: Map::new(),
            relationships: BTreeMap::new(),
        }
    }

    /// Sets an attribute, replacing any previous value.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets a relationship, replacing any previous references.
    pub fn with_relationship(mut self, key: impl Into<String>, refs: Vec<RecordRef>) -> Self {
        self.relationships.insert(key.into(), refs);
        self
    }

    /// Returns the `name` attribute, if present.
    pub fn name(&self) -> Option<&str> {
        self.attribute_str("name")
    }

    /// Returns the `status` attribute, if present.
    pub fn status(&self) -> Option<&str> {
        self.attribute_str("status")
    }

    /// Returns a string attribute.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Returns the references held under a relationship, or an empty slice.
    pub fn related(&self, key: &str) -> &[RecordRef] {
        self.relationships.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if any relationship of this record points at `id`.
    pub fn references(&self, id: RecordId) -> bool {
        self.relationships
            .values()
            .flatten()
            .any(|reference| reference.id == id)
    }

    /// Returns a reference to this record.
    pub fn to_ref(&self) -> RecordRef {
        RecordRef::new(self.record_type.clone(), self.id)
    }
}
