//! Entity values and metadata

use crate::component::ComponentSet;
use crate::prefab::Prefab;
use keel_core::EntityId;
use keel_schema::Component;
use serde::{Deserialize, Serialize};

/// An entity's state, detached from any store.
///
/// `prefab` is a name, not a handle: the prefab may disappear later and
/// the entity stays valid.
#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub prefab: Option<String>,
    pub components: ComponentSet,
}

impl Entity {
    /// Create an entity with no components and no prefab
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity holding a fresh copy of a prefab's components
    pub fn from_prefab(prefab: &Prefab) -> Self {
        Self {
            prefab: Some(prefab.name().to_string()),
            components: prefab.components().clone(),
        }
    }

    pub fn with_component<C: Component>(mut self, component: C) -> Self {
        self.components.add(component);
        self
    }
}

/// Information about a stored entity for listings and debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityInfo {
    /// The stable entity ID
    pub id: EntityId,
    /// Prefab name (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefab: Option<String>,
    /// Component kinds present on this entity, in iteration order
    pub components: Vec<String>,
}

impl EntityInfo {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            prefab: None,
            components: Vec::new(),
        }
    }

    pub fn with_prefab(mut self, prefab: impl Into<String>) -> Self {
        self.prefab = Some(prefab.into());
        self
    }

    pub fn with_components(mut self, components: Vec<String>) -> Self {
        self.components = components;
        self
    }
}
