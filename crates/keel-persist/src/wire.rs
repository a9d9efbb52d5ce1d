//! Byte and text encodings for records
//!
//! The binary form is bincode's standard configuration over serde; it is
//! what goes over a network or into a save slot. The TOML form is for
//! files a person may read or diff.

use crate::format::EntityRecord;
use keel_core::{KeelError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a record to compact bytes
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| KeelError::Encode(e.to_string()))
}

/// Decode a record from bytes. Trailing bytes are an error.
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, read): (T, usize) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| KeelError::Decode(e.to_string()))?;
    if read != bytes.len() {
        return Err(KeelError::Decode(format!(
            "{} trailing bytes after record",
            bytes.len() - read
        )));
    }
    Ok(value)
}

/// Encode a record as pretty TOML
pub fn to_toml_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(toml::to_string_pretty(value)?)
}

/// Decode a record from TOML text
pub fn from_toml_str<T: DeserializeOwned>(content: &str) -> Result<T> {
    Ok(toml::from_str(content)?)
}

/// Encode an entity record to bytes
pub fn encode_entity(record: &EntityRecord) -> Result<Vec<u8>> {
    to_bytes(record)
}

/// Decode and validate an entity record
pub fn decode_entity(bytes: &[u8]) -> Result<EntityRecord> {
    let record: EntityRecord = from_bytes(bytes)?;
    record.validate()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ComponentRecord;
    use keel_schema::{FieldRecord, TypedValue};

    fn record() -> EntityRecord {
        EntityRecord::new(1)
            .with_parent("Test")
            .with_component(
                ComponentRecord::new("String")
                    .with_field(FieldRecord::new("value", TypedValue::string("Delta"))),
            )
            .with_removed("Integer")
    }

    #[test]
    fn test_binary_round_trip() {
        let bytes = encode_entity(&record()).unwrap();
        assert_eq!(decode_entity(&bytes).unwrap(), record());
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode_entity(&record()).unwrap();
        assert!(matches!(
            decode_entity(&bytes[..bytes.len() - 1]),
            Err(KeelError::Decode(_))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode_entity(&record()).unwrap();
        bytes.push(0);
        assert!(matches!(decode_entity(&bytes), Err(KeelError::Decode(_))));
    }

    #[test]
    fn test_decoded_record_is_validated() {
        let bad = record().with_removed("String");
        let bytes = encode_entity(&bad).unwrap();
        assert!(matches!(decode_entity(&bytes), Err(KeelError::Decode(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let text = to_toml_string(&record()).unwrap();
        let parsed: EntityRecord = from_toml_str(&text).unwrap();
        assert_eq!(parsed, record());
        assert!(from_toml_str::<EntityRecord>("id = \"one\"").is_err());
    }
}
