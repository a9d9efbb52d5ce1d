//! Wire record definitions

use keel_core::{KeelError, Result};
use keel_schema::FieldRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Current [`WorldRecord`] layout version
pub const WORLD_FORMAT_VERSION: u32 = 1;

/// One entity, relative to its parent prefab (if any).
///
/// Presence matters: a component that is not listed keeps the prefab's
/// default, and a field that is not listed keeps the default's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: i64,
    #[serde(default)]
    pub parent_prefab: Option<String>,
    /// Added or changed components, in the entity's component order
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
    /// Prefab kinds the entity no longer has
    #[serde(default)]
    pub removed_components: Vec<String>,
}

/// One component: every field, or only the changed ones in a delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
}

/// A prefab with every component in full
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefabRecord {
    pub name: String,
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

/// A snapshot of a whole world: prefabs first, then entities against them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    /// The id the store hands out next; ids below it are never reused
    pub next_id: u64,
    #[serde(default)]
    pub prefabs: Vec<PrefabRecord>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

fn default_version() -> u32 {
    WORLD_FORMAT_VERSION
}

impl EntityRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            parent_prefab: None,
            components: Vec::new(),
            removed_components: Vec::new(),
        }
    }

    pub fn with_parent(mut self, prefab: impl Into<String>) -> Self {
        self.parent_prefab = Some(prefab.into());
        self
    }

    pub fn with_component(mut self, component: ComponentRecord) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_removed(mut self, kind: impl Into<String>) -> Self {
        self.removed_components.push(kind.into());
        self
    }

    /// True when the record carries nothing beyond the prefab
    pub fn is_unchanged(&self) -> bool {
        self.components.is_empty() && self.removed_components.is_empty()
    }

    /// Reject records no serializer would produce.
    ///
    /// Checks structure only; kinds and fields are resolved on merge.
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.parent_prefab, Some(name) if name.is_empty()) {
            return Err(KeelError::Decode(format!(
                "entity {}: empty parent prefab name",
                self.id
            )));
        }

        let kinds = validate_components(&self.components)
            .map_err(|msg| KeelError::Decode(format!("entity {}: {}", self.id, msg)))?;

        let mut removed = HashSet::new();
        for kind in &self.removed_components {
            if kind.is_empty() {
                return Err(KeelError::Decode(format!(
                    "entity {}: empty removed component kind",
                    self.id
                )));
            }
            if kinds.contains(kind.as_str()) {
                return Err(KeelError::Decode(format!(
                    "entity {}: component '{}' is both written and removed",
                    self.id, kind
                )));
            }
            if !removed.insert(kind.as_str()) {
                return Err(KeelError::Decode(format!(
                    "entity {}: component '{}' removed twice",
                    self.id, kind
                )));
            }
        }
        Ok(())
    }
}

impl ComponentRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldRecord) -> Self {
        self.fields.push(field);
        self
    }
}

impl PrefabRecord {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(KeelError::Decode("prefab with an empty name".to_string()));
        }
        validate_components(&self.components)
            .map(|_| ())
            .map_err(|msg| KeelError::Decode(format!("prefab '{}': {}", self.name, msg)))
    }
}

/// Kind names must be non-empty and unique, field names non-empty
fn validate_components(components: &[ComponentRecord]) -> std::result::Result<HashSet<&str>, String> {
    let mut kinds = HashSet::new();
    for component in components {
        if component.kind.is_empty() {
            return Err("component with an empty kind".to_string());
        }
        if !kinds.insert(component.kind.as_str()) {
            return Err(format!("component '{}' appears twice", component.kind));
        }
        if component.fields.iter().any(|f| f.name.is_empty()) {
            return Err(format!("component '{}' has a field with an empty name", component.kind));
        }
    }
    Ok(kinds)
}
