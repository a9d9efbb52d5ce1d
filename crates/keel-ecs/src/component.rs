//! Type-erased component storage

use keel_schema::{AnyComponent, Component};

/// The components of one entity or prefab, at most one per kind.
///
/// Iteration follows insertion order; replacing a component keeps the
/// position of the one it replaces. Serialization relies on this order
/// to emit records deterministically.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    components: Vec<Box<dyn AnyComponent>>,
}

impl ComponentSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn position(&self, kind: &str) -> Option<usize> {
        self.components.iter().position(|c| c.kind() == kind)
    }

    /// Get a component by kind
    pub fn get(&self, kind: &str) -> Option<&dyn AnyComponent> {
        self.components
            .iter()
            .find(|c| c.kind() == kind)
            .map(|c| &**c)
    }

    /// Get a mutable component by kind
    pub fn get_mut(&mut self, kind: &str) -> Option<&mut dyn AnyComponent> {
        self.components
            .iter_mut()
            .find(|c| c.kind() == kind)
            .map(|c| &mut **c)
    }

    /// Get a component as its concrete type
    pub fn get_as<C: Component>(&self) -> Option<&C> {
        self.get(C::KIND)?.as_any().downcast_ref::<C>()
    }

    /// Get a mutable component as its concrete type
    pub fn get_as_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.get_mut(C::KIND)?.as_any_mut().downcast_mut::<C>()
    }

    /// Insert a component, returning the one of the same kind it replaced
    pub fn insert(&mut self, component: Box<dyn AnyComponent>) -> Option<Box<dyn AnyComponent>> {
        match self.position(component.kind()) {
            Some(index) => Some(std::mem::replace(&mut self.components[index], component)),
            None => {
                self.components.push(component);
                None
            }
        }
    }

    /// Insert a concrete component
    pub fn add<C: Component>(&mut self, component: C) -> Option<Box<dyn AnyComponent>> {
        self.insert(Box::new(component))
    }

    /// Remove a component by kind, keeping the order of the rest
    pub fn remove(&mut self, kind: &str) -> Option<Box<dyn AnyComponent>> {
        let index = self.position(kind)?;
        Some(self.components.remove(index))
    }

    /// Check if a component kind is present
    pub fn has(&self, kind: &str) -> bool {
        self.position(kind).is_some()
    }

    /// Kind names, in iteration order
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.iter().map(|c| c.kind())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AnyComponent> + '_ {
        self.components.iter().map(|c| &**c)
    }

    /// Copy every component of `other` into this set, replacing same-kind entries
    pub fn merge(&mut self, other: &ComponentSet) {
        for component in other.iter() {
            self.insert(component.clone_boxed());
        }
    }
}
