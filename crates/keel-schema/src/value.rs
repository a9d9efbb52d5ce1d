//! Handler-level wire values

use serde::{Deserialize, Serialize};

/// An encoded field value.
///
/// Every variant carries a list so that scalar and composite types share
/// one shape: a single `i32` is `Integer(vec![n])`, a 3-float vector is
/// `Float(vec![x, y, z])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypedValue {
    Integer(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Boolean(Vec<bool>),
    String(Vec<String>),
    Bytes(Vec<u8>),
    List(Vec<TypedValue>),
}

impl TypedValue {
    pub fn integer(value: i32) -> Self {
        TypedValue::Integer(vec![value])
    }

    pub fn long(value: i64) -> Self {
        TypedValue::Long(vec![value])
    }

    pub fn float(value: f32) -> Self {
        TypedValue::Float(vec![value])
    }

    pub fn double(value: f64) -> Self {
        TypedValue::Double(vec![value])
    }

    pub fn boolean(value: bool) -> Self {
        TypedValue::Boolean(vec![value])
    }

    pub fn string(value: impl Into<String>) -> Self {
        TypedValue::String(vec![value.into()])
    }

    /// Name of the variant, as it appears on the wire
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Integer(_) => "integer",
            TypedValue::Long(_) => "long",
            TypedValue::Float(_) => "float",
            TypedValue::Double(_) => "double",
            TypedValue::Boolean(_) => "boolean",
            TypedValue::String(_) => "string",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::List(_) => "list",
        }
    }

    pub fn as_integers(&self) -> Option<&[i32]> {
        match self {
            TypedValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_longs(&self) -> Option<&[i64]> {
        match self {
            TypedValue::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            TypedValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_doubles(&self) -> Option<&[f64]> {
        match self {
            TypedValue::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_booleans(&self) -> Option<&[bool]> {
        match self {
            TypedValue::Boolean(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            TypedValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TypedValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::List(v) => Some(v),
            _ => None,
        }
    }
}

/// A named, encoded field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub value: TypedValue,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>, value: TypedValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
