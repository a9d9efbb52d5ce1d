//! Component traits and registration-time field tables

use keel_core::{KeelError, Result};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A plain data component that can be attached to an entity.
///
/// Instead of reflecting over struct fields at runtime, a component lists
/// its persistable fields once in [`Component::fields`]. The order of that
/// list is the order fields appear on the wire.
///
/// ```ignore
/// #[derive(Debug, Clone, Default)]
/// struct Health { current: i32, max: i32 }
///
/// impl Component for Health {
///     const KIND: &'static str = "Health";
///
///     fn fields() -> Vec<FieldDef<Self>> {
///         vec![
///             FieldDef::direct("current", |h: &Self| &h.current, |h: &mut Self| &mut h.current),
///             FieldDef::direct("max", |h: &Self| &h.max, |h: &mut Self| &mut h.max),
///         ]
///     }
/// }
/// ```
pub trait Component: Any + Clone + Default + fmt::Debug + Send + Sync {
    /// Kind name used on the wire and for prefab lookups
    const KIND: &'static str;

    /// Persistable fields, in wire order
    fn fields() -> Vec<FieldDef<Self>>;
}

/// Object-safe view of a [`Component`]
pub trait AnyComponent: Any + fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;

    fn clone_boxed(&self) -> Box<dyn AnyComponent>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> AnyComponent for C {
    fn kind(&self) -> &'static str {
        C::KIND
    }

    fn clone_boxed(&self) -> Box<dyn AnyComponent> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Clone for Box<dyn AnyComponent> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

type ReadFn<C> = Arc<dyn Fn(&C) -> Box<dyn Any> + Send + Sync>;
type WriteFn<C> = Arc<dyn Fn(&mut C, Box<dyn Any>) -> Result<()> + Send + Sync>;

/// One way of reading and writing a field: direct access or a getter/setter pair
pub(crate) struct Binding<C> {
    pub(crate) value_type: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) read: ReadFn<C>,
    pub(crate) write: WriteFn<C>,
}

impl<C> Clone for Binding<C> {
    fn clone(&self) -> Self {
        Self {
            value_type: self.value_type,
            type_name: self.type_name,
            read: Arc::clone(&self.read),
            write: Arc::clone(&self.write),
        }
    }
}

/// Declaration of one persistable field of component `C`.
///
/// A field can be bound directly, through a getter/setter pair, or both.
/// When both exist the getter/setter pair is the one used.
pub struct FieldDef<C> {
    name: &'static str,
    direct: Option<Binding<C>>,
    accessors: Option<Binding<C>>,
}

impl<C: 'static> FieldDef<C> {
    /// Bind a field through direct references to it
    pub fn direct<T>(name: &'static str, get: fn(&C) -> &T, get_mut: fn(&mut C) -> &mut T) -> Self
    where
        T: Any + Clone + Send + Sync,
    {
        Self {
            name,
            direct: Some(Binding {
                value_type: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                read: Arc::new(move |c: &C| Box::new(get(c).clone()) as Box<dyn Any>),
                write: Arc::new(move |c: &mut C, value: Box<dyn Any>| -> Result<()> {
                    *get_mut(c) = unbox::<T>(value)?;
                    Ok(())
                }),
            }),
            accessors: None,
        }
    }

    /// Bind a field through a getter/setter pair only
    pub fn property<T>(name: &'static str, getter: fn(&C) -> T, setter: fn(&mut C, T)) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            name,
            direct: None,
            accessors: Some(accessor_binding(getter, setter)),
        }
    }

    /// Add a getter/setter pair to a field; it takes precedence over direct access
    pub fn with_accessors<T>(mut self, getter: fn(&C) -> T, setter: fn(&mut C, T)) -> Self
    where
        T: Any + Send + Sync,
    {
        self.accessors = Some(accessor_binding(getter, setter));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether reads and writes go through a getter/setter pair
    pub fn uses_accessors(&self) -> bool {
        self.accessors.is_some()
    }

    /// The binding metadata is built from
    pub(crate) fn binding(&self) -> Option<&Binding<C>> {
        self.accessors.as_ref().or(self.direct.as_ref())
    }
}

fn accessor_binding<C: 'static, T: Any + Send + Sync>(
    getter: fn(&C) -> T,
    setter: fn(&mut C, T),
) -> Binding<C> {
    Binding {
        value_type: TypeId::of::<T>(),
        type_name: type_name::<T>(),
        read: Arc::new(move |c: &C| Box::new(getter(c)) as Box<dyn Any>),
        write: Arc::new(move |c: &mut C, value: Box<dyn Any>| -> Result<()> {
            setter(c, unbox::<T>(value)?);
            Ok(())
        }),
    }
}

fn unbox<T: Any>(value: Box<dyn Any>) -> Result<T> {
    value
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| KeelError::type_mismatch(type_name::<T>(), "a value of another type"))
}

impl<C> fmt::Debug for FieldDef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("direct", &self.direct.as_ref().map(|b| b.type_name))
            .field("accessors", &self.accessors.as_ref().map(|b| b.type_name))
            .finish()
    }
}
