//! Persister configuration

use keel_core::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How entities are written.
///
/// ```toml
/// delta_encoding = true
/// transient_components = ["Selection", "Hover"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Write only what differs from the prefab. When off, every live
    /// component is written in full; the parent prefab and removed kinds
    /// are still recorded.
    pub delta_encoding: bool,
    /// Runtime-only kinds: never written, never listed as removed
    pub transient_components: Vec<String>,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            delta_encoding: true,
            transient_components: Vec::new(),
        }
    }
}

impl PersistConfig {
    /// Parse from a TOML string; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn with_delta_encoding(mut self, enabled: bool) -> Self {
        self.delta_encoding = enabled;
        self
    }

    pub fn with_transient(mut self, kind: impl Into<String>) -> Self {
        self.transient_components.push(kind.into());
        self
    }

    pub fn is_transient(&self, kind: &str) -> bool {
        self.transient_components.iter().any(|k| k == kind)
    }
}
