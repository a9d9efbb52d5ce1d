//! Stock type handlers: primitives, strings, bytes, and extension types

use crate::handler::{TypeHandler, TypeHandlerRegistry};
use crate::value::TypedValue;
use keel_core::{KeelError, Result, Vec3};

/// Install the handlers every registry starts with
pub(crate) fn install(registry: &mut TypeHandlerRegistry) {
    registry.register::<bool, _>(BoolHandler);
    registry.register::<i8, _>(I8Handler);
    registry.register::<u8, _>(U8Handler);
    registry.register::<i16, _>(I16Handler);
    registry.register::<u16, _>(U16Handler);
    registry.register::<i32, _>(IntegerHandler);
    registry.register::<u32, _>(U32Handler);
    registry.register::<i64, _>(LongHandler);
    registry.register::<u64, _>(U64Handler);
    registry.register::<f32, _>(FloatHandler);
    registry.register::<f64, _>(DoubleHandler);
    registry.register::<char, _>(CharHandler);
    registry.register::<String, _>(StringHandler);
    registry.register::<Vec<u8>, _>(BytesHandler);
}

/// Pull the only element out of a single-valued list
fn single<'a, T>(values: Option<&'a [T]>, expected: &str, value: &TypedValue) -> Result<&'a T> {
    match values {
        Some([one]) => Ok(one),
        Some(many) => Err(KeelError::Decode(format!(
            "expected exactly one {} value, got {}",
            expected,
            many.len()
        ))),
        None => Err(KeelError::type_mismatch(expected, value.kind_name())),
    }
}

macro_rules! scalar_handler {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $ctor:ident, $accessor:ident, $wire:literal) => {
        scalar_handler!($(#[$doc])* $name, $ty, $ctor, $accessor, $wire, |a, b| a == b);
    };
    ($(#[$doc:meta])* $name:ident, $ty:ty, $ctor:ident, $accessor:ident, $wire:literal,
     |$a:ident, $b:ident| $eq:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl TypeHandler<$ty> for $name {
            fn encode(&self, value: &$ty) -> TypedValue {
                TypedValue::$ctor(value.clone())
            }

            fn decode(&self, value: &TypedValue) -> Result<$ty> {
                single(value.$accessor(), $wire, value).cloned()
            }

            fn equals(&self, $a: &$ty, $b: &$ty) -> bool {
                $eq
            }
        }
    };
}

/// Small integers stored in a wider wire variant. Decoding range-checks.
macro_rules! widened_handler {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $wide:ty, $ctor:ident, $accessor:ident, $wire:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl TypeHandler<$ty> for $name {
            fn encode(&self, value: &$ty) -> TypedValue {
                TypedValue::$ctor(<$wide>::from(*value))
            }

            fn decode(&self, value: &TypedValue) -> Result<$ty> {
                let wide = *single(value.$accessor(), $wire, value)?;
                <$ty>::try_from(wide).map_err(|_| {
                    KeelError::Decode(format!(
                        "{} value {} is out of range for {}",
                        $wire,
                        wide,
                        stringify!($ty)
                    ))
                })
            }

            fn equals(&self, a: &$ty, b: &$ty) -> bool {
                a == b
            }
        }
    };
}

scalar_handler!(
    /// `bool` as a one-element boolean list
    BoolHandler, bool, boolean, as_booleans, "boolean"
);
scalar_handler!(
    /// `i32` as a one-element integer list
    IntegerHandler, i32, integer, as_integers, "integer"
);
scalar_handler!(
    /// `i64` as a one-element long list
    LongHandler, i64, long, as_longs, "long"
);
scalar_handler!(
    /// `f32` as a one-element float list. Values compare by bit pattern, so
    /// NaN equals NaN and `0.0` differs from `-0.0`.
    FloatHandler, f32, float, as_floats, "float",
    |a, b| a.to_bits() == b.to_bits()
);
scalar_handler!(
    /// `f64` as a one-element double list, compared by bit pattern
    DoubleHandler, f64, double, as_doubles, "double",
    |a, b| a.to_bits() == b.to_bits()
);
scalar_handler!(
    /// `String` as a one-element string list
    StringHandler, String, string, as_strings, "string"
);

widened_handler!(
    /// `i8` in a one-element integer list
    I8Handler, i8, i32, integer, as_integers, "integer"
);
widened_handler!(
    /// `u8` in a one-element integer list
    U8Handler, u8, i32, integer, as_integers, "integer"
);
widened_handler!(
    /// `i16` in a one-element integer list
    I16Handler, i16, i32, integer, as_integers, "integer"
);
widened_handler!(
    /// `u16` in a one-element integer list
    U16Handler, u16, i32, integer, as_integers, "integer"
);
widened_handler!(
    /// `u32` in a one-element long list
    U32Handler, u32, i64, long, as_longs, "long"
);

/// `u64` as its decimal string. No signed wire variant holds the full range.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Handler;

impl TypeHandler<u64> for U64Handler {
    fn encode(&self, value: &u64) -> TypedValue {
        TypedValue::string(value.to_string())
    }

    fn decode(&self, value: &TypedValue) -> Result<u64> {
        let text = single(value.as_strings(), "string", value)?;
        text.parse()
            .map_err(|e| KeelError::Decode(format!("invalid u64 '{}': {}", text, e)))
    }

    fn equals(&self, a: &u64, b: &u64) -> bool {
        a == b
    }
}

/// `char` as a one-character string
#[derive(Debug, Clone, Copy, Default)]
pub struct CharHandler;

impl TypeHandler<char> for CharHandler {
    fn encode(&self, value: &char) -> TypedValue {
        TypedValue::string(value.to_string())
    }

    fn decode(&self, value: &TypedValue) -> Result<char> {
        let text = single(value.as_strings(), "string", value)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(KeelError::Decode(format!(
                "expected exactly one character, got '{}'",
                text
            ))),
        }
    }

    fn equals(&self, a: &char, b: &char) -> bool {
        a == b
    }
}

/// `Vec<u8>` as raw bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesHandler;

impl TypeHandler<Vec<u8>> for BytesHandler {
    fn encode(&self, value: &Vec<u8>) -> TypedValue {
        TypedValue::Bytes(value.clone())
    }

    fn decode(&self, value: &TypedValue) -> Result<Vec<u8>> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| KeelError::type_mismatch("bytes", value.kind_name()))
    }

    fn equals(&self, a: &Vec<u8>, b: &Vec<u8>) -> bool {
        a == b
    }
}

/// [`Vec3`] as a three-element float list
#[derive(Debug, Clone, Copy, Default)]
pub struct Vec3Handler;

impl TypeHandler<Vec3> for Vec3Handler {
    fn encode(&self, value: &Vec3) -> TypedValue {
        TypedValue::Float(value.to_array().to_vec())
    }

    fn decode(&self, value: &TypedValue) -> Result<Vec3> {
        match value.as_floats() {
            Some(&[x, y, z]) => Ok(Vec3::new(x, y, z)),
            Some(other) => Err(KeelError::Decode(format!(
                "vec3 needs exactly 3 floats, got {}",
                other.len()
            ))),
            None => Err(KeelError::type_mismatch("float", value.kind_name())),
        }
    }

    fn equals(&self, a: &Vec3, b: &Vec3) -> bool {
        a.to_array()
            .iter()
            .zip(b.to_array())
            .all(|(x, y)| x.to_bits() == y.to_bits())
    }
}

/// `Vec<T>` as a nested list, element-wise through an inner handler.
///
/// ```ignore
/// library.register_type_handler::<Vec<String>, _>(ListHandler::new(StringHandler));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ListHandler<H> {
    inner: H,
}

impl<H> ListHandler<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<T, H: TypeHandler<T>> TypeHandler<Vec<T>> for ListHandler<H> {
    fn encode(&self, value: &Vec<T>) -> TypedValue {
        TypedValue::List(value.iter().map(|item| self.inner.encode(item)).collect())
    }

    fn decode(&self, value: &TypedValue) -> Result<Vec<T>> {
        let items = value
            .as_list()
            .ok_or_else(|| KeelError::type_mismatch("list", value.kind_name()))?;
        items.iter().map(|item| self.inner.decode(item)).collect()
    }

    fn equals(&self, a: &Vec<T>, b: &Vec<T>) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.inner.equals(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_encoding() {
        assert_eq!(IntegerHandler.encode(&1), TypedValue::Integer(vec![1]));
        assert_eq!(
            StringHandler.encode(&"Delta".to_string()),
            TypedValue::String(vec!["Delta".to_string()])
        );
        assert!(BoolHandler.decode(&TypedValue::boolean(true)).unwrap());
        assert_eq!(DoubleHandler.decode(&TypedValue::double(0.25)).unwrap(), 0.25);
    }

    #[test]
    fn test_scalar_decode_is_strict() {
        // No coercion between numeric variants
        assert!(matches!(
            FloatHandler.decode(&TypedValue::integer(1)),
            Err(KeelError::TypeMismatch { .. })
        ));
        assert!(matches!(
            IntegerHandler.decode(&TypedValue::Integer(vec![1, 2])),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            StringHandler.decode(&TypedValue::String(Vec::new())),
            Err(KeelError::Decode(_))
        ));
    }

    #[test]
    fn test_float_equality_is_bitwise() {
        assert!(FloatHandler.equals(&f32::NAN, &f32::NAN));
        assert!(DoubleHandler.equals(&f64::NAN, &f64::NAN));
        assert!(!FloatHandler.equals(&0.0, &-0.0));
        assert!(!DoubleHandler.equals(&1.0, &1.5));

        let nan = Vec3::new(f32::NAN, 0.0, 1.0);
        assert!(Vec3Handler.equals(&nan, &nan));
        assert!(!Vec3Handler.equals(&nan, &Vec3::UP));
    }

    #[test]
    fn test_widened_integers() {
        assert_eq!(U8Handler.encode(&200), TypedValue::integer(200));
        assert_eq!(I8Handler.decode(&TypedValue::integer(-128)).unwrap(), -128);
        assert_eq!(I16Handler.decode(&TypedValue::integer(-300)).unwrap(), -300);
        assert_eq!(U16Handler.decode(&TypedValue::integer(65535)).unwrap(), 65535);
        assert_eq!(U32Handler.encode(&u32::MAX), TypedValue::long(u32::MAX as i64));
        assert_eq!(U32Handler.decode(&TypedValue::long(7)).unwrap(), 7);

        // Out of range is an error, never a wrap
        assert!(matches!(
            U8Handler.decode(&TypedValue::integer(256)),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            I8Handler.decode(&TypedValue::integer(128)),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            I16Handler.decode(&TypedValue::integer(40_000)),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            U16Handler.decode(&TypedValue::integer(-1)),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            U32Handler.decode(&TypedValue::long(u32::MAX as i64 + 1)),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            U32Handler.decode(&TypedValue::integer(1)),
            Err(KeelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_u64_handler() {
        let encoded = U64Handler.encode(&u64::MAX);
        assert_eq!(encoded, TypedValue::string(u64::MAX.to_string()));
        assert_eq!(U64Handler.decode(&encoded).unwrap(), u64::MAX);
        assert!(matches!(
            U64Handler.decode(&TypedValue::string("18446744073709551616".to_string())),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            U64Handler.decode(&TypedValue::string("-1".to_string())),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            U64Handler.decode(&TypedValue::long(1)),
            Err(KeelError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_char_handler() {
        assert_eq!(CharHandler.encode(&'λ'), TypedValue::string("λ".to_string()));
        assert_eq!(CharHandler.decode(&TypedValue::string("λ".to_string())).unwrap(), 'λ');
        assert!(matches!(
            CharHandler.decode(&TypedValue::string("ab".to_string())),
            Err(KeelError::Decode(_))
        ));
        assert!(matches!(
            CharHandler.decode(&TypedValue::string(String::new())),
            Err(KeelError::Decode(_))
        ));
    }

    #[test]
    fn test_vec3_handler() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let encoded = Vec3Handler.encode(&v);
        assert_eq!(encoded.as_floats(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(Vec3Handler.decode(&encoded).unwrap(), v);
        assert!(matches!(
            Vec3Handler.decode(&TypedValue::Float(vec![1.0, 2.0])),
            Err(KeelError::Decode(_))
        ));
    }

    #[test]
    fn test_list_handler() {
        let handler = ListHandler::new(StringHandler);
        let value = vec!["a".to_string(), "b".to_string()];
        let encoded = handler.encode(&value);
        assert_eq!(encoded.as_list().map(|l| l.len()), Some(2));
        assert_eq!(handler.decode(&encoded).unwrap(), value);

        assert!(handler.equals(&value, &value.clone()));
        assert!(!handler.equals(&value, &vec!["a".to_string()]));

        let bad = TypedValue::List(vec![TypedValue::integer(3)]);
        assert!(handler.decode(&bad).is_err());
    }

    #[test]
    fn test_bytes_handler() {
        let encoded = BytesHandler.encode(&vec![0xde, 0xad]);
        assert_eq!(encoded, TypedValue::Bytes(vec![0xde, 0xad]));
        assert!(BytesHandler.decode(&TypedValue::integer(1)).is_err());
    }
}
