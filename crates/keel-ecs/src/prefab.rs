//! Prefabs: named templates of default components

use crate::component::ComponentSet;
use keel_core::{KeelError, Result};
use keel_schema::{AnyComponent, Component};
use std::collections::HashMap;

/// A named, read-only set of default components.
///
/// Built once with the `with_*` methods; there is no way to change the
/// components of a prefab once it is placed in a [`PrefabStore`].
#[derive(Debug, Clone)]
pub struct Prefab {
    name: String,
    components: ComponentSet,
}

impl Prefab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: ComponentSet::new(),
        }
    }

    /// Create a prefab from an already assembled component set
    pub fn from_components(name: impl Into<String>, components: ComponentSet) -> Self {
        Self {
            name: name.into(),
            components,
        }
    }

    pub fn with_component<C: Component>(mut self, component: C) -> Self {
        self.components.add(component);
        self
    }

    pub fn with_boxed(mut self, component: Box<dyn AnyComponent>) -> Self {
        self.components.insert(component);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &ComponentSet {
        &self.components
    }

    /// The default instance of one kind
    pub fn component(&self, kind: &str) -> Option<&dyn AnyComponent> {
        self.components.get(kind)
    }
}

/// Lookup of prefabs by name; the only view of prefabs the persister needs
pub trait PrefabSource {
    fn prefab(&self, name: &str) -> Option<&Prefab>;
}

/// Owning store of prefabs, keyed by unique name
#[derive(Debug, Clone, Default)]
pub struct PrefabStore {
    prefabs: HashMap<String, Prefab>,
}

impl PrefabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prefab. Names are unique.
    pub fn insert(&mut self, prefab: Prefab) -> Result<()> {
        if self.prefabs.contains_key(prefab.name()) {
            return Err(KeelError::DuplicatePrefab(prefab.name().to_string()));
        }
        log::debug!(
            "Registered prefab '{}' ({} components)",
            prefab.name(),
            prefab.components().len()
        );
        self.prefabs.insert(prefab.name().to_string(), prefab);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Prefab> {
        self.prefabs.get(name)
    }

    /// Remove a prefab. Entities created from it keep their components;
    /// they are serialized in full from then on.
    pub fn remove(&mut self, name: &str) -> Option<Prefab> {
        self.prefabs.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.prefabs.contains_key(name)
    }

    /// Prefab names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.prefabs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Prefabs, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &Prefab> {
        let mut prefabs: Vec<_> = self.prefabs.values().collect();
        prefabs.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        prefabs.into_iter()
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}

impl PrefabSource for PrefabStore {
    fn prefab(&self, name: &str) -> Option<&Prefab> {
        self.get(name)
    }
}

impl PrefabSource for HashMap<String, Prefab> {
    fn prefab(&self, name: &str) -> Option<&Prefab> {
        self.get(name)
    }
}
