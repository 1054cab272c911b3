//! Purpose: Resource metadata and its manifest serialization, including skip state.
//! Exports: `Descriptor`, `ResourcePath`, `ResourceState`.
//! Role: Holds what the manifest will say about a resource; storage never reads it.
//! Invariants: `name` survives every state; a skipped entry nulls every other key.
//! Invariants: The null-filled skipped shape exists only at serialization time.

use serde_json::{json, Map, Value as JsonValue};

use crate::core::field::TableSchema;

/// Where a resource's data lives, relative to the package root.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourcePath {
    Single(String),
    Many(Vec<String>),
}

impl ResourcePath {
    fn to_json(&self) -> JsonValue {
        match self {
            ResourcePath::Single(path) => json!(path),
            ResourcePath::Many(paths) => json!(paths),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceState {
    Active,
    Skipped(String),
}

impl ResourceState {
    pub fn is_skipped(&self) -> bool {
        matches!(self, ResourceState::Skipped(_))
    }

    pub fn skip_reason(&self) -> Option<&str> {
        match self {
            ResourceState::Active => None,
            ResourceState::Skipped(reason) => Some(reason),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Descriptor {
    pub name: String,
    pub path: Option<ResourcePath>,
    pub schema: Option<TableSchema>,
    pub description: Option<String>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            schema: None,
            description: None,
        }
    }

    pub fn with_path(mut self, path: ResourcePath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_schema(mut self, schema: TableSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record one more content path, promoting the path to a list if needed.
    pub fn push_path(&mut self, path: impl Into<String>) {
        let path = path.into();
        match &mut self.path {
            Some(ResourcePath::Many(paths)) => paths.push(path),
            Some(ResourcePath::Single(existing)) => {
                let existing = std::mem::take(existing);
                self.path = Some(ResourcePath::Many(vec![existing, path]));
            }
            None => self.path = Some(ResourcePath::Many(vec![path])),
        }
    }

    /// Manifest entry for this descriptor under the given state.
    ///
    /// A skipped entry keeps the active shape's keys with everything but
    /// `name` nulled and `description` replaced by the skip reason, so
    /// manifest readers see which resources exist even when a build
    /// filtered them out.
    pub fn manifest_value(&self, state: &ResourceState) -> JsonValue {
        let mut entry = Map::new();
        entry.insert("name".to_string(), json!(self.name));
        match state {
            ResourceState::Active => {
                if let Some(path) = &self.path {
                    entry.insert("path".to_string(), path.to_json());
                }
                if let Some(schema) = &self.schema {
                    entry.insert(
                        "schema".to_string(),
                        serde_json::to_value(schema).unwrap_or(JsonValue::Null),
                    );
                }
                if let Some(description) = &self.description {
                    entry.insert("description".to_string(), json!(description));
                }
            }
            ResourceState::Skipped(reason) => {
                if self.path.is_some() {
                    entry.insert("path".to_string(), JsonValue::Null);
                }
                if self.schema.is_some() {
                    entry.insert("schema".to_string(), JsonValue::Null);
                }
                entry.insert("description".to_string(), json!(reason));
            }
        }
        JsonValue::Object(entry)
    }
}
