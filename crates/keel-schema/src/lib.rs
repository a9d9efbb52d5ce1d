//! Keel Schema - Field-level type handling and component metadata
//!
//! This crate provides the pieces that turn a component's declared fields
//! into wire values and back:
//! - `TypedValue` / `FieldRecord` - the handler-level wire encoding
//! - `TypeHandler` / `TypeHandlerRegistry` - per-type encode/decode/equals
//! - `Component` / `FieldDef` - registration-time field tables
//! - `SerializationInfo` / `ComponentLibrary` - cached per-kind metadata

pub mod builtin;
mod component;
mod handler;
mod library;
mod metadata;
mod value;

pub use builtin::{ListHandler, Vec3Handler};
pub use component::{AnyComponent, Component, FieldDef};
pub use handler::{DynTypeHandler, TypeHandler, TypeHandlerRegistry};
pub use library::ComponentLibrary;
pub use metadata::{FieldInfo, SerializationInfo};
pub use value::{FieldRecord, TypedValue};
