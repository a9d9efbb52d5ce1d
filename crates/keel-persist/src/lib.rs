//! Keel Persist - Prefab-relative entity persistence
//!
//! Entities are written as deltas against the prefab they were created
//! from: components equal to the prefab's defaults are left out, changed
//! components carry only their changed fields, and prefab components the
//! entity no longer has are listed by kind. Loading starts from the
//! prefab and replays the delta.
//!
//! Records encode to a compact binary form or to TOML.

mod config;
mod format;
mod loader;
mod persister;
mod saver;
pub mod wire;

pub use config::PersistConfig;
pub use format::{ComponentRecord, EntityRecord, PrefabRecord, WorldRecord, WORLD_FORMAT_VERSION};
pub use loader::{load_world, load_world_bytes, load_world_file, load_world_string};
pub use persister::EntityPersister;
pub use saver::{save_world, save_world_bytes, save_world_file, save_world_string};
