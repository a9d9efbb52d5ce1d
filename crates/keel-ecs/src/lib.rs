//! Keel ECS - Entity and prefab stores
//!
//! This crate wraps hecs with stable, never-reused entity identifiers and
//! type-erased component storage, and provides the named prefab templates
//! entities are created from and diffed against.

mod component;
mod entity;
mod prefab;
mod world;

pub use component::ComponentSet;
pub use entity::{Entity, EntityInfo};
pub use prefab::{Prefab, PrefabSource, PrefabStore};
pub use world::EntityStore;
