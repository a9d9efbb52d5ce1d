//! Component library: registered kinds and their cached metadata

use crate::component::{AnyComponent, Component};
use crate::handler::{TypeHandler, TypeHandlerRegistry};
use crate::metadata::SerializationInfo;
use keel_core::{KeelError, Result};
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered component kind
#[derive(Clone, Copy)]
struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    build: fn(&TypeHandlerRegistry) -> Result<SerializationInfo>,
}

/// Registry of component kinds, their type handlers, and cached
/// [`SerializationInfo`].
///
/// Metadata for a kind is built at most once: the first `describe` call
/// takes the write lock, re-checks the cache and builds; every later call
/// is served from the cache. Registering a type handler drops the cache so
/// the next `describe` resolves fields against the new handler set.
pub struct ComponentLibrary {
    handlers: TypeHandlerRegistry,
    kinds: HashMap<&'static str, Registration>,
    cache: RwLock<HashMap<&'static str, Arc<SerializationInfo>>>,
}

impl Default for ComponentLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentLibrary {
    /// Create an empty library using the built-in type handlers
    pub fn new() -> Self {
        Self::with_handlers(TypeHandlerRegistry::new())
    }

    /// Create an empty library using the given handler registry
    pub fn with_handlers(handlers: TypeHandlerRegistry) -> Self {
        Self {
            handlers,
            kinds: HashMap::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or replace) the handler for field type `T`
    pub fn register_type_handler<T: Any, H: TypeHandler<T>>(&mut self, handler: H) {
        let replaced = self.handlers.register::<T, H>(handler);
        let cache = self.cache.get_mut();
        if !cache.is_empty() {
            log::debug!(
                "Handler for {} {}; dropping {} cached component descriptions",
                type_name::<T>(),
                if replaced { "replaced" } else { "added" },
                cache.len()
            );
            cache.clear();
        }
    }

    /// Register a component kind.
    ///
    /// Metadata is built immediately so a field with no type handler fails
    /// here rather than at first use; on failure the kind stays unregistered.
    /// Registering the same type twice is a no-op.
    pub fn register<C: Component>(&mut self) -> Result<Arc<SerializationInfo>> {
        if let Some(existing) = self.kinds.get(C::KIND) {
            if existing.type_id != TypeId::of::<C>() {
                return Err(KeelError::DuplicateComponentKind {
                    kind: C::KIND.to_string(),
                    existing: existing.type_name.to_string(),
                });
            }
            return self.describe(C::KIND);
        }

        self.kinds.insert(
            C::KIND,
            Registration {
                type_id: TypeId::of::<C>(),
                type_name: type_name::<C>(),
                build: SerializationInfo::build::<C>,
            },
        );
        match self.describe(C::KIND) {
            Ok(info) => Ok(info),
            Err(err) => {
                self.kinds.remove(C::KIND);
                Err(err)
            }
        }
    }

    /// Get the serialization metadata for a kind, building it on first use
    pub fn describe(&self, kind: &str) -> Result<Arc<SerializationInfo>> {
        if let Some(info) = self.cache.read().get(kind) {
            return Ok(Arc::clone(info));
        }

        let (&name, registration) = self
            .kinds
            .get_key_value(kind)
            .ok_or_else(|| KeelError::UnknownComponentKind(kind.to_string()))?;

        let mut cache = self.cache.write();
        if let Some(info) = cache.get(name) {
            return Ok(Arc::clone(info));
        }
        let info = Arc::new((registration.build)(&self.handlers)?);
        log::debug!(
            "Built serialization info for '{}' ({} fields)",
            name,
            info.fields().len()
        );
        cache.insert(name, Arc::clone(&info));
        Ok(info)
    }

    /// Get the serialization metadata for a component type
    pub fn describe_type<C: Component>(&self) -> Result<Arc<SerializationInfo>> {
        match self.kinds.get(C::KIND) {
            Some(registration) if registration.type_id == TypeId::of::<C>() => {
                self.describe(C::KIND)
            }
            _ => Err(KeelError::UnknownComponentKind(C::KIND.to_string())),
        }
    }

    /// A default instance of a registered kind
    pub fn create_default(&self, kind: &str) -> Result<Box<dyn AnyComponent>> {
        Ok(self.describe(kind)?.create_default())
    }

    /// Check if a kind is registered
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// List all registered kind names
    pub fn kind_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.kinds.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn handlers(&self) -> &TypeHandlerRegistry {
        &self.handlers
    }
}

impl fmt::Debug for ComponentLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentLibrary")
            .field("kinds", &self.kind_names())
            .field("cached", &self.cache.read().len())
            .field("handlers", &self.handlers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::Vec3Handler;
    use crate::component::FieldDef;
    use keel_core::Vec3;
    use std::thread;

    #[derive(Debug, Clone, Default)]
    struct StringComponent {
        value: String,
    }

    impl Component for StringComponent {
        const KIND: &'static str = "String";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("value", |c: &Self| &c.value, |c: &mut Self| &mut c.value)]
        }
    }

    /// Claims the same kind name as `StringComponent`
    #[derive(Debug, Clone, Default)]
    struct Impostor {
        value: i32,
    }

    impl Component for Impostor {
        const KIND: &'static str = "String";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("value", |c: &Self| &c.value, |c: &mut Self| &mut c.value)]
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Position {
        at: Vec3,
    }

    impl Component for Position {
        const KIND: &'static str = "Position";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![FieldDef::direct("at", |c: &Self| &c.at, |c: &mut Self| &mut c.at)]
        }
    }

    #[test]
    fn test_register_and_describe() {
        let mut library = ComponentLibrary::new();
        let registered = library.register::<StringComponent>().unwrap();
        let described = library.describe("String").unwrap();

        assert!(Arc::ptr_eq(&registered, &described));
        assert_eq!(described.fields().len(), 1);
        assert_eq!(library.kind_names(), vec!["String"]);
        assert!(library.describe_type::<StringComponent>().is_ok());
    }

    #[test]
    fn test_unknown_kind() {
        let library = ComponentLibrary::new();
        assert!(matches!(
            library.describe("Integer"),
            Err(KeelError::UnknownComponentKind(_))
        ));
        assert!(library.create_default("Integer").is_err());
    }

    #[test]
    fn test_register_fails_fast_without_handler() {
        let mut library = ComponentLibrary::new();
        assert!(matches!(
            library.register::<Position>(),
            Err(KeelError::UnsupportedType(_))
        ));
        assert!(!library.contains("Position"));

        library.register_type_handler::<Vec3, _>(Vec3Handler);
        assert!(library.register::<Position>().is_ok());
    }

    #[derive(Debug, Clone, Default)]
    struct Counter {
        hits: u32,
        glyph: char,
        serial: u64,
    }

    impl Component for Counter {
        const KIND: &'static str = "Counter";

        fn fields() -> Vec<FieldDef<Self>> {
            vec![
                FieldDef::direct("hits", |c: &Self| &c.hits, |c: &mut Self| &mut c.hits),
                FieldDef::direct("glyph", |c: &Self| &c.glyph, |c: &mut Self| &mut c.glyph),
                FieldDef::direct("serial", |c: &Self| &c.serial, |c: &mut Self| &mut c.serial),
            ]
        }
    }

    #[test]
    fn test_unsigned_and_char_fields_are_builtin() {
        let mut library = ComponentLibrary::new();
        let info = library.register::<Counter>().unwrap();
        assert_eq!(info.fields().len(), 3);
    }

    #[test]
    fn test_duplicate_kind_name() {
        let mut library = ComponentLibrary::new();
        library.register::<StringComponent>().unwrap();
        assert!(library.register::<StringComponent>().is_ok());
        assert!(matches!(
            library.register::<Impostor>(),
            Err(KeelError::DuplicateComponentKind { .. })
        ));
        assert!(library.describe_type::<Impostor>().is_err());
    }

    #[test]
    fn test_handler_registration_invalidates_cache() {
        let mut library = ComponentLibrary::new();
        let before = library.register::<StringComponent>().unwrap();
        library.register_type_handler::<Vec3, _>(Vec3Handler);
        let after = library.describe("String").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_concurrent_describe_builds_once() {
        let mut library = ComponentLibrary::new();
        library.register::<StringComponent>().unwrap();
        library.register_type_handler::<Vec3, _>(Vec3Handler);

        let infos: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| library.describe("String").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(infos.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_create_default() {
        let mut library = ComponentLibrary::new();
        library.register::<StringComponent>().unwrap();
        let component = library.create_default("String").unwrap();
        assert_eq!(component.kind(), "String");
    }
}
