//! Type handler trait and registry

use crate::builtin;
use crate::value::TypedValue;
use keel_core::{KeelError, Result};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Encode/decode/compare strategy for one field type.
///
/// Handlers are the extension seam: registering a handler for a type makes
/// every component field of that type persistable without touching the
/// persister.
pub trait TypeHandler<T>: Send + Sync + 'static {
    fn encode(&self, value: &T) -> TypedValue;

    /// Decode a wire value. A variant or arity the handler does not accept
    /// is an error, never a coercion.
    fn decode(&self, value: &TypedValue) -> Result<T>;

    /// Semantic equality, used for field-level change detection
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// Object-safe view of a [`TypeHandler`], operating on type-erased values.
pub trait DynTypeHandler: Send + Sync {
    /// Name of the Rust type this handler serves
    fn value_type(&self) -> &'static str;

    fn encode_any(&self, value: &dyn Any) -> Result<TypedValue>;

    fn decode_any(&self, value: &TypedValue) -> Result<Box<dyn Any>>;

    fn equals_any(&self, a: &dyn Any, b: &dyn Any) -> Result<bool>;
}

struct Erased<T, H> {
    handler: H,
    _value: PhantomData<fn() -> T>,
}

impl<T: Any, H: TypeHandler<T>> Erased<T, H> {
    fn downcast<'v>(&self, value: &'v dyn Any) -> Result<&'v T> {
        value
            .downcast_ref::<T>()
            .ok_or_else(|| KeelError::type_mismatch(type_name::<T>(), "a value of another type"))
    }
}

impl<T: Any, H: TypeHandler<T>> DynTypeHandler for Erased<T, H> {
    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn encode_any(&self, value: &dyn Any) -> Result<TypedValue> {
        Ok(self.handler.encode(self.downcast(value)?))
    }

    fn decode_any(&self, value: &TypedValue) -> Result<Box<dyn Any>> {
        Ok(Box::new(self.handler.decode(value)?))
    }

    fn equals_any(&self, a: &dyn Any, b: &dyn Any) -> Result<bool> {
        Ok(self.handler.equals(self.downcast(a)?, self.downcast(b)?))
    }
}

/// Registry mapping a declared field type to its handler.
///
/// `new()` comes with handlers for `bool`, the integer types up to 64 bits,
/// `f32`, `f64`, `char`, `String` and `Vec<u8>`. Registering a handler for
/// a type that already has one replaces it.
#[derive(Clone)]
pub struct TypeHandlerRegistry {
    handlers: HashMap<TypeId, Arc<dyn DynTypeHandler>>,
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.values().map(|h| h.value_type()).collect();
        names.sort_unstable();
        f.debug_struct("TypeHandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}

impl TypeHandlerRegistry {
    /// Create a registry with the built-in handlers installed
    pub fn new() -> Self {
        let mut registry = Self::empty();
        builtin::install(&mut registry);
        registry
    }

    /// Create a registry with no handlers at all
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for `T`. Returns `true` if it replaced an earlier one.
    pub fn register<T: Any, H: TypeHandler<T>>(&mut self, handler: H) -> bool {
        let erased = Erased {
            handler,
            _value: PhantomData::<fn() -> T>,
        };
        self.handlers
            .insert(TypeId::of::<T>(), Arc::new(erased))
            .is_some()
    }

    /// Get the handler for `T`
    pub fn get<T: Any>(&self) -> Result<Arc<dyn DynTypeHandler>> {
        self.get_by_id(TypeId::of::<T>(), type_name::<T>())
    }

    /// Get a handler by type id; `type_name` is only used for the error
    pub fn get_by_id(&self, id: TypeId, type_name: &str) -> Result<Arc<dyn DynTypeHandler>> {
        self.handlers
            .get(&id)
            .cloned()
            .ok_or_else(|| KeelError::UnsupportedType(type_name.to_string()))
    }

    /// Check whether `T` has a handler
    pub fn contains<T: Any>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
