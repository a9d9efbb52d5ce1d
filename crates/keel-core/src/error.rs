//! Error types for Keel

use thiserror::Error;

/// The main error type for Keel operations
#[derive(Debug, Error)]
pub enum KeelError {
    #[error("Unsupported field type: no type handler registered for {0}")]
    UnsupportedType(String),

    #[error("Unknown component kind: {0}")]
    UnknownComponentKind(String),

    #[error("Unknown prefab: {0}")]
    UnknownPrefab(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Invalid field value: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Unknown field '{field}' on component '{component}'")]
    UnknownField { component: String, field: String },

    #[error("Field '{field}' appears more than once on component '{component}'")]
    DuplicateField { component: String, field: String },

    #[error("Component kind mismatch: expected {expected}, got {got}")]
    ComponentKindMismatch { expected: String, got: String },

    #[error("Component kind '{kind}' is already registered by {existing}")]
    DuplicateComponentKind { kind: String, existing: String },

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Entity id out of range: {0}")]
    IdOutOfRange(String),

    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(String),

    #[error("Duplicate prefab name: {0}")]
    DuplicatePrefab(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for Keel operations
pub type Result<T> = std::result::Result<T, KeelError>;

impl KeelError {
    /// Shorthand for a wire value whose variant does not match the handler
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        KeelError::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}

impl From<toml::de::Error> for KeelError {
    fn from(err: toml::de::Error) -> Self {
        KeelError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for KeelError {
    fn from(err: toml::ser::Error) -> Self {
        KeelError::TomlSerError(err.to_string())
    }
}
