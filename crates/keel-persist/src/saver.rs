//! World snapshot saving

use crate::config::PersistConfig;
use crate::format::{WorldRecord, WORLD_FORMAT_VERSION};
use crate::persister::EntityPersister;
use crate::wire;
use keel_core::Result;
use keel_ecs::{EntityStore, PrefabStore};
use keel_schema::ComponentLibrary;
use std::fs;
use std::path::Path;

/// Snapshot a store and its prefabs.
///
/// Prefabs are written in full, sorted by name; entities are written as
/// deltas against them, by ascending id.
pub fn save_world(
    library: &ComponentLibrary,
    config: &PersistConfig,
    store: &EntityStore,
    prefabs: &PrefabStore,
) -> Result<WorldRecord> {
    let persister = EntityPersister::new(library, prefabs).with_config(config.clone());

    let prefab_records = prefabs
        .iter()
        .map(|p| persister.serialize_prefab(p))
        .collect::<Result<Vec<_>>>()?;
    let entity_records = store
        .ids()
        .into_iter()
        .map(|id| persister.serialize_stored(store, id))
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "Saved world: {} prefabs, {} entities",
        prefab_records.len(),
        entity_records.len()
    );
    Ok(WorldRecord {
        version: WORLD_FORMAT_VERSION,
        next_id: store.next_id().raw(),
        prefabs: prefab_records,
        entities: entity_records,
    })
}

/// Save a world to a TOML string
pub fn save_world_string(
    library: &ComponentLibrary,
    config: &PersistConfig,
    store: &EntityStore,
    prefabs: &PrefabStore,
) -> Result<String> {
    wire::to_toml_string(&save_world(library, config, store, prefabs)?)
}

/// Save a world to compact bytes
pub fn save_world_bytes(
    library: &ComponentLibrary,
    config: &PersistConfig,
    store: &EntityStore,
    prefabs: &PrefabStore,
) -> Result<Vec<u8>> {
    wire::to_bytes(&save_world(library, config, store, prefabs)?)
}

/// Save a world to a TOML file
pub fn save_world_file<P: AsRef<Path>>(
    path: P,
    library: &ComponentLibrary,
    config: &PersistConfig,
    store: &EntityStore,
    prefabs: &PrefabStore,
) -> Result<()> {
    let content = save_world_string(library, config, store, prefabs)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_ecs::Prefab;
    use keel_schema::{Component, FieldDef};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Door {
        locked: bool,
    }

    impl Component for Door {
        const KIND: &'static str = "Door";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("locked", |d: &Self| &d.locked, |d: &mut Self| &mut d.locked)]
        }
    }

    #[test]
    fn test_save_world() {
        let mut library = ComponentLibrary::new();
        library.register::<Door>().unwrap();
        let mut prefabs = PrefabStore::new();
        prefabs
            .insert(Prefab::new("door").with_component(Door { locked: true }))
            .unwrap();

        let mut store = EntityStore::new();
        let closed = store.create_from_source(&prefabs, "door").unwrap();
        let open = store.create_from_source(&prefabs, "door").unwrap();
        store.component_mut::<Door>(open).unwrap().locked = false;

        let world = save_world(&library, &PersistConfig::default(), &store, &prefabs).unwrap();
        assert_eq!(world.next_id, 3);
        assert_eq!(world.prefabs.len(), 1);
        assert_eq!(world.entities[0].id, closed.raw() as i64);
        assert!(world.entities[0].is_unchanged());
        assert_eq!(world.entities[1].components.len(), 1);

        let text = save_world_string(&library, &PersistConfig::default(), &store, &prefabs).unwrap();
        assert!(text.contains("next_id = 3"));
    }
}
