//! World snapshot loading

use crate::format::{WorldRecord, WORLD_FORMAT_VERSION};
use crate::persister::EntityPersister;
use crate::wire;
use keel_core::{EntityId, KeelError, Result};
use keel_ecs::{EntityStore, PrefabStore};
use keel_schema::ComponentLibrary;
use std::fs;
use std::path::Path;

/// Rebuild a store and its prefabs from a snapshot.
///
/// Entities keep their saved ids and the id counter is restored, so ids
/// handed out before the save are never handed out again.
pub fn load_world(
    library: &ComponentLibrary,
    record: &WorldRecord,
) -> Result<(EntityStore, PrefabStore)> {
    if record.version > WORLD_FORMAT_VERSION {
        return Err(KeelError::Decode(format!(
            "world format version {} is newer than supported version {}",
            record.version, WORLD_FORMAT_VERSION
        )));
    }
    if record.next_id > EntityId::MAX.raw() + 1 {
        return Err(KeelError::Decode(format!(
            "next id {} is beyond the largest entity id {}",
            record.next_id,
            EntityId::MAX
        )));
    }

    // Prefab records are self-contained
    let none = PrefabStore::new();
    let prefab_persister = EntityPersister::new(library, &none);
    let mut prefabs = PrefabStore::new();
    for prefab in &record.prefabs {
        prefabs.insert(prefab_persister.deserialize_prefab(prefab)?)?;
    }

    let persister = EntityPersister::new(library, &prefabs);
    let mut store = EntityStore::new();
    for entity_record in &record.entities {
        let raw = u64::try_from(entity_record.id).map_err(|_| {
            KeelError::Decode(format!("negative entity id {}", entity_record.id))
        })?;
        let entity = persister.deserialize_entity(entity_record)?;
        store.insert_with_id(EntityId::from_raw(raw), entity)?;
    }
    store.reserve_ids_below(EntityId::from_raw(record.next_id))?;

    log::debug!(
        "Loaded world: {} prefabs, {} entities",
        prefabs.len(),
        store.entity_count()
    );
    Ok((store, prefabs))
}

/// Load a world from a TOML string
pub fn load_world_string(
    library: &ComponentLibrary,
    content: &str,
) -> Result<(EntityStore, PrefabStore)> {
    let record: WorldRecord = wire::from_toml_str(content)?;
    load_world(library, &record)
}

/// Load a world from compact bytes
pub fn load_world_bytes(
    library: &ComponentLibrary,
    bytes: &[u8],
) -> Result<(EntityStore, PrefabStore)> {
    let record: WorldRecord = wire::from_bytes(bytes)?;
    load_world(library, &record)
}

/// Load a world from a TOML file
pub fn load_world_file<P: AsRef<Path>>(
    path: P,
    library: &ComponentLibrary,
) -> Result<(EntityStore, PrefabStore)> {
    let content = fs::read_to_string(path)?;
    load_world_string(library, &content)
}
