//! EntityStore - the authoritative table of live entities

use crate::entity::{Entity, EntityInfo};
use crate::prefab::{Prefab, PrefabSource};
use bimap::BiMap;
use keel_core::{EntityId, KeelError, Result};
use keel_schema::{AnyComponent, Component};
use std::collections::HashMap;

/// The live entities of one world
///
/// Wraps hecs::World with:
/// - Stable EntityId mapping
/// - Type-erased component sets
/// - Weak, name-based prefab references
///
/// Ids start at 1 and only ever grow; destroying an entity or clearing
/// the store never makes an id available again. Explicit ids may not exceed
/// [`EntityId::MAX`].
pub struct EntityStore {
    /// The underlying hecs world
    world: hecs::World,
    /// Bidirectional mapping: EntityId <-> hecs::Entity
    id_map: BiMap<EntityId, hecs::Entity>,
    /// Entity state, by id
    entities: HashMap<EntityId, Entity>,
    /// The id the next `create` hands out
    next_id: EntityId,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            world: hecs::World::new(),
            id_map: BiMap::new(),
            entities: HashMap::new(),
            next_id: EntityId::from_raw(1),
        }
    }

    fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        // Bounded by EntityId::MAX + 1, far from u64::MAX
        self.next_id = EntityId::from_raw(id.raw() + 1);
        id
    }

    fn spawn(&mut self, id: EntityId, entity: Entity) {
        let handle = self.world.spawn((id,));
        self.id_map.insert(id, handle);
        self.entities.insert(id, entity);
    }

    /// Create an empty entity
    pub fn create(&mut self) -> EntityId {
        self.insert(Entity::new())
    }

    /// Create an entity holding a copy of a prefab's components
    pub fn create_from_prefab(&mut self, prefab: &Prefab) -> EntityId {
        self.insert(Entity::from_prefab(prefab))
    }

    /// Create an entity from a prefab looked up by name
    pub fn create_from_source<S>(&mut self, source: &S, prefab: &str) -> Result<EntityId>
    where
        S: PrefabSource + ?Sized,
    {
        let prefab = source
            .prefab(prefab)
            .ok_or_else(|| KeelError::UnknownPrefab(prefab.to_string()))?;
        Ok(self.create_from_prefab(prefab))
    }

    /// Store a detached entity under a freshly allocated id
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = self.allocate();
        self.spawn(id, entity);
        id
    }

    /// Store an entity under a specific id (for loading snapshots)
    pub fn insert_with_id(&mut self, id: EntityId, entity: Entity) -> Result<()> {
        if self.id_map.contains_left(&id) {
            return Err(KeelError::DuplicateEntity(id.to_string()));
        }
        let following = id
            .checked_next()
            .filter(|_| id <= EntityId::MAX)
            .ok_or_else(|| KeelError::IdOutOfRange(id.to_string()))?;

        // Ensure the ID counter stays ahead
        if id >= self.next_id {
            self.next_id = following;
        }

        self.spawn(id, entity);
        Ok(())
    }

    /// Destroy an entity, handing back its final state
    pub fn destroy(&mut self, id: EntityId) -> Result<Entity> {
        let (_, handle) = self
            .id_map
            .remove_by_left(&id)
            .ok_or_else(|| KeelError::EntityNotFound(id.to_string()))?;

        self.world
            .despawn(handle)
            .map_err(|_| KeelError::EntityNotFound(id.to_string()))?;

        self.entities
            .remove(&id)
            .ok_or_else(|| KeelError::EntityNotFound(id.to_string()))
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId) -> bool {
        self.id_map.contains_left(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.entities
            .get(&id)
            .ok_or_else(|| KeelError::EntityNotFound(id.to_string()))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or_else(|| KeelError::EntityNotFound(id.to_string()))
    }

    /// The live components of an entity, in iteration order
    pub fn iter_components(
        &self,
        id: EntityId,
    ) -> Result<impl Iterator<Item = &dyn AnyComponent> + '_> {
        Ok(self.entity(id)?.components.iter())
    }

    /// Put a component on an entity, replacing any instance of the same kind
    pub fn apply_component(
        &mut self,
        id: EntityId,
        component: Box<dyn AnyComponent>,
    ) -> Result<Option<Box<dyn AnyComponent>>> {
        Ok(self.entity_mut(id)?.components.insert(component))
    }

    /// Put a concrete component on an entity
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> Result<()> {
        self.apply_component(id, Box::new(component))?;
        Ok(())
    }

    /// Remove a component kind from an entity. Removing an absent kind is a no-op.
    pub fn remove_component(
        &mut self,
        id: EntityId,
        kind: &str,
    ) -> Result<Option<Box<dyn AnyComponent>>> {
        Ok(self.entity_mut(id)?.components.remove(kind))
    }

    /// Get a component from an entity
    pub fn get_component(&self, id: EntityId, kind: &str) -> Option<&dyn AnyComponent> {
        self.entities.get(&id).and_then(|e| e.components.get(kind))
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut(&mut self, id: EntityId, kind: &str) -> Option<&mut dyn AnyComponent> {
        self.entities
            .get_mut(&id)
            .and_then(|e| e.components.get_mut(kind))
    }

    /// Get a component from an entity as its concrete type
    pub fn component<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.entities.get(&id).and_then(|e| e.components.get_as::<C>())
    }

    /// Get a mutable component from an entity as its concrete type
    pub fn component_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        self.entities
            .get_mut(&id)
            .and_then(|e| e.components.get_as_mut::<C>())
    }

    pub fn has_component(&self, id: EntityId, kind: &str) -> bool {
        self.get_component(id, kind).is_some()
    }

    /// Get info about all entities, ordered by id
    pub fn all_entities(&self) -> Vec<EntityInfo> {
        self.ids()
            .into_iter()
            .filter_map(|id| {
                let entity = self.entities.get(&id)?;
                let info = EntityInfo::new(id)
                    .with_components(entity.components.kinds().map(String::from).collect());
                Some(match &entity.prefab {
                    Some(prefab) => info.with_prefab(prefab.clone()),
                    None => info,
                })
            })
            .collect()
    }

    /// All entity ids, ascending
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.id_map.left_values().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get number of entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The id the next `create` will hand out
    pub fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Make sure no id below `next` is handed out again
    pub fn reserve_ids_below(&mut self, next: EntityId) -> Result<()> {
        if next.raw() > EntityId::MAX.raw() + 1 {
            return Err(KeelError::IdOutOfRange(next.to_string()));
        }
        if next > self.next_id {
            self.next_id = next;
        }
        Ok(())
    }

    /// Remove every entity. The id counter is kept.
    pub fn clear(&mut self) {
        self.world.clear();
        self.id_map.clear();
        self.entities.clear();
    }
}
