//! Prefab-relative entity serialization and merging

use crate::config::PersistConfig;
use crate::format::{ComponentRecord, EntityRecord, PrefabRecord};
use keel_core::{EntityId, KeelError, Result};
use keel_ecs::{ComponentSet, Entity, EntityStore, Prefab, PrefabSource};
use keel_schema::{AnyComponent, ComponentLibrary};

/// Converts entities to and from [`EntityRecord`]s.
///
/// Serialization diffs each entity against its prefab, kind by kind:
///
/// | entity has it | prefab has it | written as |
/// |---|---|---|
/// | yes | no | component record with every field |
/// | yes | yes, equal | nothing |
/// | yes | yes, differs | component record with the changed fields |
/// | no | yes | kind name in `removed_components` |
///
/// Deserialization starts from a copy of the prefab's components and
/// replays the record on top. Both directions are all-or-nothing.
pub struct EntityPersister<'a> {
    library: &'a ComponentLibrary,
    prefabs: &'a dyn PrefabSource,
    config: PersistConfig,
}

impl<'a> EntityPersister<'a> {
    pub fn new<S: PrefabSource>(library: &'a ComponentLibrary, prefabs: &'a S) -> Self {
        Self {
            library,
            prefabs,
            config: PersistConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PersistConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PersistConfig {
        &self.config
    }

    pub fn library(&self) -> &'a ComponentLibrary {
        self.library
    }

    /// Resolve the entity's prefab. A name that no longer resolves is
    /// treated as no prefab at all.
    fn baseline(&self, id: i64, entity: &Entity) -> Option<&'a Prefab> {
        let name = entity.prefab.as_deref()?;
        let prefab = self.prefabs.prefab(name);
        if prefab.is_none() {
            log::warn!(
                "Entity {} refers to missing prefab '{}'; writing it in full",
                id,
                name
            );
        }
        prefab
    }

    /// Serialize an entity as a delta against its prefab
    pub fn serialize_entity(&self, id: i64, entity: &Entity) -> Result<EntityRecord> {
        let prefab = self.baseline(id, entity);
        let defaults = prefab.map(Prefab::components);

        let mut components = Vec::new();
        for component in entity.components.iter() {
            let kind = component.kind();
            if self.config.is_transient(kind) {
                continue;
            }
            let info = self.library.describe(kind)?;

            let default = defaults.and_then(|d| d.get(kind));
            let fields = match default {
                Some(default) if self.config.delta_encoding => {
                    let fields = info.serialize_delta(component, default)?;
                    if fields.is_empty() {
                        continue;
                    }
                    fields
                }
                _ => info.serialize(component)?,
            };
            components.push(ComponentRecord {
                kind: kind.to_string(),
                fields,
            });
        }

        let removed_components: Vec<String> = defaults
            .map(|d| {
                d.kinds()
                    .filter(|kind| !entity.components.has(kind) && !self.config.is_transient(kind))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let record = EntityRecord {
            id,
            parent_prefab: prefab.map(|p| p.name().to_string()),
            components,
            removed_components,
        };
        log::trace!(
            "Serialized entity {}: {} component records, {} removed",
            id,
            record.components.len(),
            record.removed_components.len()
        );
        Ok(record)
    }

    /// Serialize an entity held by a store
    pub fn serialize_stored(&self, store: &EntityStore, id: EntityId) -> Result<EntityRecord> {
        let entity = store
            .get(id)
            .ok_or_else(|| KeelError::EntityNotFound(id.to_string()))?;
        let wire_id = i64::try_from(id.raw())
            .map_err(|_| KeelError::Encode(format!("entity id {} does not fit the wire id", id)))?;
        self.serialize_entity(wire_id, entity)
    }

    /// Rebuild an entity: the parent prefab's components, then the record's
    /// additions and changes, minus the removed kinds
    pub fn deserialize_entity(&self, record: &EntityRecord) -> Result<Entity> {
        record.validate()?;

        let mut components = match &record.parent_prefab {
            Some(name) => self
                .prefabs
                .prefab(name)
                .ok_or_else(|| KeelError::UnknownPrefab(name.clone()))?
                .components()
                .clone(),
            None => ComponentSet::new(),
        };

        for component in &record.components {
            let info = self.library.describe(&component.kind)?;
            match components.get_mut(&component.kind) {
                Some(existing) => info.deserialize_into(&component.fields, existing)?,
                None => {
                    components.insert(info.deserialize(&component.fields)?);
                }
            }
        }

        for kind in &record.removed_components {
            components.remove(kind);
        }

        log::trace!(
            "Deserialized entity {} ({} components)",
            record.id,
            components.len()
        );
        Ok(Entity {
            prefab: record.parent_prefab.clone(),
            components,
        })
    }

    /// Deserialize a record into a store under a fresh id
    pub fn load_entity(&self, record: &EntityRecord, store: &mut EntityStore) -> Result<EntityId> {
        let entity = self.deserialize_entity(record)?;
        Ok(store.insert(entity))
    }

    /// Serialize one component with every field
    pub fn serialize_component(&self, component: &dyn AnyComponent) -> Result<ComponentRecord> {
        let info = self.library.describe(component.kind())?;
        Ok(ComponentRecord {
            kind: component.kind().to_string(),
            fields: info.serialize(component)?,
        })
    }

    /// Build a component from a record; missing fields keep their defaults
    pub fn deserialize_component(&self, record: &ComponentRecord) -> Result<Box<dyn AnyComponent>> {
        self.library.describe(&record.kind)?.deserialize(&record.fields)
    }

    /// Serialize a prefab with every component in full
    pub fn serialize_prefab(&self, prefab: &Prefab) -> Result<PrefabRecord> {
        let components = prefab
            .components()
            .iter()
            .map(|c| self.serialize_component(c))
            .collect::<Result<Vec<_>>>()?;
        Ok(PrefabRecord {
            name: prefab.name().to_string(),
            components,
        })
    }

    pub fn deserialize_prefab(&self, record: &PrefabRecord) -> Result<Prefab> {
        record.validate()?;
        let mut components = ComponentSet::new();
        for component in &record.components {
            components.insert(self.deserialize_component(component)?);
        }
        Ok(Prefab::from_components(record.name.clone(), components))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_ecs::PrefabStore;
    use keel_schema::{Component, FieldDef, FieldRecord, TypedValue};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Health {
        current: i32,
        max: i32,
    }

    impl Component for Health {
        const KIND: &'static str = "Health";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::direct("current", |h: &Self| &h.current, |h: &mut Self| &mut h.current),
                FieldDef::direct("max", |h: &Self| &h.max, |h: &mut Self| &mut h.max),
            ]
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Selected {
        by: String,
    }

    impl Component for Selected {
        const KIND: &'static str = "Selected";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("by", |s: &Self| &s.by, |s: &mut Self| &mut s.by)]
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Speed {
        value: f32,
    }

    impl Component for Speed {
        const KIND: &'static str = "Speed";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("value", |s: &Self| &s.value, |s: &mut Self| &mut s.value)]
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Unregistered {
        flag: bool,
    }

    impl Component for Unregistered {
        const KIND: &'static str = "Unregistered";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("flag", |u: &Self| &u.flag, |u: &mut Self| &mut u.flag)]
        }
    }

    fn library() -> ComponentLibrary {
        let mut library = ComponentLibrary::new();
        library.register::<Health>().unwrap();
        library.register::<Selected>().unwrap();
        library
    }

    fn prefabs() -> PrefabStore {
        let mut prefabs = PrefabStore::new();
        prefabs
            .insert(Prefab::new("Orc").with_component(Health { current: 10, max: 10 }))
            .unwrap();
        prefabs
    }

    #[test]
    fn test_partial_field_delta() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs);

        let mut entity = Entity::from_prefab(prefabs.get("Orc").unwrap());
        entity.components.get_as_mut::<Health>().unwrap().current = 4;

        let record = persister.serialize_entity(3, &entity).unwrap();
        assert_eq!(
            record.components,
            vec![ComponentRecord::new("Health")
                .with_field(FieldRecord::new("current", TypedValue::integer(4)))]
        );

        let loaded = persister.deserialize_entity(&record).unwrap();
        assert_eq!(
            loaded.components.get_as::<Health>(),
            Some(&Health { current: 4, max: 10 })
        );
    }

    #[test]
    fn test_nan_default_left_unchanged() {
        let mut library = library();
        library.register::<Speed>().unwrap();
        let mut prefabs = PrefabStore::new();
        prefabs
            .insert(Prefab::new("Drifter").with_component(Speed { value: f32::NAN }))
            .unwrap();
        let persister = EntityPersister::new(&library, &prefabs);

        let mut entity = Entity::from_prefab(prefabs.get("Drifter").unwrap());
        let record = persister.serialize_entity(1, &entity).unwrap();
        assert!(record.is_unchanged());

        entity.components.get_as_mut::<Speed>().unwrap().value = 2.5;
        let record = persister.serialize_entity(1, &entity).unwrap();
        assert_eq!(
            record.components,
            vec![ComponentRecord::new("Speed")
                .with_field(FieldRecord::new("value", TypedValue::float(2.5)))]
        );
    }

    #[test]
    fn test_missing_prefab_degrades_to_full() {
        let library = library();
        let mut prefabs = prefabs();
        let entity = Entity::from_prefab(prefabs.get("Orc").unwrap());
        prefabs.remove("Orc");

        let persister = EntityPersister::new(&library, &prefabs);
        let record = persister.serialize_entity(1, &entity).unwrap();
        assert!(record.parent_prefab.is_none());
        assert_eq!(record.components.len(), 1);
        assert_eq!(record.components[0].fields.len(), 2);

        let loaded = persister.deserialize_entity(&record).unwrap();
        assert_eq!(
            loaded.components.get_as::<Health>(),
            Some(&Health { current: 10, max: 10 })
        );
    }

    #[test]
    fn test_unknown_prefab_on_load() {
        let library = library();
        let prefabs = PrefabStore::new();
        let persister = EntityPersister::new(&library, &prefabs);

        let record = EntityRecord::new(1).with_parent("Orc");
        assert!(matches!(
            persister.deserialize_entity(&record),
            Err(KeelError::UnknownPrefab(_))
        ));
    }

    #[test]
    fn test_unknown_component_kind() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs);

        let entity = Entity::new().with_component(Unregistered::default());
        assert!(matches!(
            persister.serialize_entity(1, &entity),
            Err(KeelError::UnknownComponentKind(_))
        ));

        let record = EntityRecord::new(1).with_component(ComponentRecord::new("Unregistered"));
        assert!(matches!(
            persister.deserialize_entity(&record),
            Err(KeelError::UnknownComponentKind(_))
        ));
    }

    #[test]
    fn test_decode_failure_is_all_or_nothing() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs);

        let record = EntityRecord::new(1).with_parent("Orc").with_component(
            ComponentRecord::new("Health")
                .with_field(FieldRecord::new("current", TypedValue::string("four"))),
        );
        assert!(matches!(
            persister.deserialize_entity(&record),
            Err(KeelError::TypeMismatch { .. })
        ));
        assert_eq!(
            prefabs.get("Orc").unwrap().components().get_as::<Health>(),
            Some(&Health { current: 10, max: 10 })
        );
    }

    #[test]
    fn test_delta_encoding_disabled() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs)
            .with_config(PersistConfig::default().with_delta_encoding(false));

        let entity = Entity::from_prefab(prefabs.get("Orc").unwrap());
        let record = persister.serialize_entity(1, &entity).unwrap();
        assert_eq!(record.parent_prefab.as_deref(), Some("Orc"));
        assert_eq!(record.components.len(), 1);
        assert_eq!(record.components[0].fields.len(), 2);

        let mut stripped = entity.clone();
        stripped.components.remove("Health");
        let record = persister.serialize_entity(1, &stripped).unwrap();
        assert_eq!(record.removed_components, vec!["Health"]);
    }

    #[test]
    fn test_transient_components_skipped() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs)
            .with_config(PersistConfig::default().with_transient("Selected").with_transient("Health"));

        let mut entity = Entity::new().with_component(Selected {
            by: "player".to_string(),
        });
        entity.prefab = Some("Orc".to_string());

        let record = persister.serialize_entity(1, &entity).unwrap();
        assert!(record.is_unchanged());

        let loaded = persister.deserialize_entity(&record).unwrap();
        assert!(loaded.components.has("Health"));
        assert!(!loaded.components.has("Selected"));
    }

    #[test]
    fn test_serialize_stored() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs);

        let mut store = EntityStore::new();
        let id = store.create_from_source(&prefabs, "Orc").unwrap();
        let record = persister.serialize_stored(&store, id).unwrap();
        assert_eq!(record.id, id.raw() as i64);
        assert!(record.is_unchanged());

        let loaded = persister.load_entity(&record, &mut store).unwrap();
        assert_ne!(loaded, id);
        assert!(store.has_component(loaded, "Health"));

        assert!(matches!(
            persister.serialize_stored(&store, EntityId::from_raw(500)),
            Err(KeelError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_prefab_round_trip() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs);

        let record = persister.serialize_prefab(prefabs.get("Orc").unwrap()).unwrap();
        assert_eq!(record.name, "Orc");
        assert_eq!(record.components[0].fields.len(), 2);

        let prefab = persister.deserialize_prefab(&record).unwrap();
        assert_eq!(
            prefab.components().get_as::<Health>(),
            Some(&Health { current: 10, max: 10 })
        );
    }

    #[test]
    fn test_component_round_trip() {
        let library = library();
        let prefabs = prefabs();
        let persister = EntityPersister::new(&library, &prefabs);

        let health = Health { current: 1, max: 2 };
        let record = persister.serialize_component(&health).unwrap();
        let restored = persister.deserialize_component(&record).unwrap();
        assert_eq!(restored.as_any().downcast_ref::<Health>(), Some(&health));
    }
}
