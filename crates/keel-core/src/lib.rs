//! Keel Core - Foundational types for the Keel persistence engine
//!
//! This crate provides the types that all other Keel crates depend on:
//! - `EntityId` - Store-local entity identifiers
//! - `Vec3` - The 3-float vector used by the stock extension handler
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{KeelError, Result};
pub use id::EntityId;
pub use types::Vec3;
