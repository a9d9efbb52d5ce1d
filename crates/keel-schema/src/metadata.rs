//! Per-kind serialization metadata

use crate::component::{AnyComponent, Component, FieldDef};
use crate::handler::{DynTypeHandler, TypeHandlerRegistry};
use crate::value::FieldRecord;
use keel_core::{KeelError, Result};
use std::any::{type_name, Any};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type ErasedRead = Arc<dyn Fn(&dyn Any) -> Result<Box<dyn Any>> + Send + Sync>;
type ErasedWrite = Arc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<()> + Send + Sync>;

/// A resolved field: its name, declared type, handler, and access bindings
pub struct FieldInfo {
    name: &'static str,
    type_name: &'static str,
    uses_accessors: bool,
    handler: Arc<dyn DynTypeHandler>,
    read: ErasedRead,
    write: ErasedWrite,
}

impl FieldInfo {
    fn resolve<C: Component>(def: &FieldDef<C>, handlers: &TypeHandlerRegistry) -> Result<Self> {
        let binding = def.binding().cloned().ok_or_else(|| {
            KeelError::UnsupportedType(format!("{}.{} has no binding", C::KIND, def.name()))
        })?;
        let handler = handlers.get_by_id(binding.value_type, binding.type_name)?;

        let read = Arc::clone(&binding.read);
        let write = Arc::clone(&binding.write);
        Ok(Self {
            name: def.name(),
            type_name: binding.type_name,
            uses_accessors: def.uses_accessors(),
            handler,
            read: Arc::new(move |component: &dyn Any| {
                component.downcast_ref::<C>().map(|c| (*read)(c)).ok_or_else(mismatch::<C>)
            }),
            write: Arc::new(move |component: &mut dyn Any, value: Box<dyn Any>| -> Result<()> {
                let c = component.downcast_mut::<C>().ok_or_else(mismatch::<C>)?;
                (*write)(c, value)
            }),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rust name of the field's declared type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the field is read and written through a getter/setter pair
    pub fn uses_accessors(&self) -> bool {
        self.uses_accessors
    }

    pub fn handler(&self) -> &dyn DynTypeHandler {
        &*self.handler
    }

    /// Read the field and encode it
    pub fn serialize(&self, component: &dyn AnyComponent) -> Result<FieldRecord> {
        let value = (self.read)(component.as_any())?;
        let encoded = self.handler.encode_any(&*value)?;
        Ok(FieldRecord::new(self.name, encoded))
    }

    /// Encode the field only if it differs from the baseline's value
    pub fn serialize_delta(
        &self,
        component: &dyn AnyComponent,
        baseline: &dyn AnyComponent,
    ) -> Result<Option<FieldRecord>> {
        let value = (self.read)(component.as_any())?;
        let base = (self.read)(baseline.as_any())?;
        if self.handler.equals_any(&*value, &*base)? {
            return Ok(None);
        }
        let encoded = self.handler.encode_any(&*value)?;
        Ok(Some(FieldRecord::new(self.name, encoded)))
    }

    fn equals(&self, a: &dyn AnyComponent, b: &dyn AnyComponent) -> Result<bool> {
        let a = (self.read)(a.as_any())?;
        let b = (self.read)(b.as_any())?;
        self.handler.equals_any(&*a, &*b)
    }
}

fn mismatch<C: Component>() -> KeelError {
    KeelError::ComponentKindMismatch {
        expected: C::KIND.to_string(),
        got: "a component of another type".to_string(),
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("uses_accessors", &self.uses_accessors)
            .finish()
    }
}

/// Serialization metadata for one component kind.
///
/// Built once per kind by [`ComponentLibrary`](crate::ComponentLibrary)
/// and shared read-only afterwards.
pub struct SerializationInfo {
    kind: &'static str,
    type_name: &'static str,
    fields: Vec<FieldInfo>,
    create: fn() -> Box<dyn AnyComponent>,
}

fn create_default<C: Component>() -> Box<dyn AnyComponent> {
    Box::new(C::default())
}

impl SerializationInfo {
    /// Resolve a handler for every declared field of `C`.
    ///
    /// Fails with `UnsupportedType` on the first field whose type has no handler.
    pub fn build<C: Component>(handlers: &TypeHandlerRegistry) -> Result<Self> {
        let defs = C::fields();
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(defs.len());
        for def in &defs {
            if !seen.insert(def.name()) {
                return Err(KeelError::DuplicateField {
                    component: C::KIND.to_string(),
                    field: def.name().to_string(),
                });
            }
            fields.push(FieldInfo::resolve(def, handlers)?);
        }

        Ok(Self {
            kind: C::KIND,
            type_name: type_name::<C>(),
            fields,
            create: create_default::<C>,
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Rust name of the component type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A fresh default instance of this kind
    pub fn create_default(&self) -> Box<dyn AnyComponent> {
        (self.create)()
    }

    fn check_kind(&self, component: &dyn AnyComponent) -> Result<()> {
        if component.kind() == self.kind {
            Ok(())
        } else {
            Err(KeelError::ComponentKindMismatch {
                expected: self.kind.to_string(),
                got: component.kind().to_string(),
            })
        }
    }

    /// Every field, in declaration order
    pub fn serialize(&self, component: &dyn AnyComponent) -> Result<Vec<FieldRecord>> {
        self.check_kind(component)?;
        self.fields.iter().map(|f| f.serialize(component)).collect()
    }

    /// Only the fields whose value differs from `baseline`, in declaration order
    pub fn serialize_delta(
        &self,
        component: &dyn AnyComponent,
        baseline: &dyn AnyComponent,
    ) -> Result<Vec<FieldRecord>> {
        self.check_kind(component)?;
        self.check_kind(baseline)?;
        let mut records = Vec::new();
        for field in &self.fields {
            if let Some(record) = field.serialize_delta(component, baseline)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Field-by-field semantic equality
    pub fn equals(&self, a: &dyn AnyComponent, b: &dyn AnyComponent) -> Result<bool> {
        self.check_kind(a)?;
        self.check_kind(b)?;
        for field in &self.fields {
            if !field.equals(a, b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Apply field records onto an existing instance.
    ///
    /// Fields without a record keep their current value. Every record is
    /// decoded before anything is written, so a bad record leaves `target`
    /// untouched.
    pub fn deserialize_into(&self, records: &[FieldRecord], target: &mut dyn AnyComponent) -> Result<()> {
        self.check_kind(target)?;

        let mut seen = HashSet::new();
        let mut decoded = Vec::with_capacity(records.len());
        for record in records {
            let field = self.field(&record.name).ok_or_else(|| KeelError::UnknownField {
                component: self.kind.to_string(),
                field: record.name.clone(),
            })?;
            if !seen.insert(record.name.as_str()) {
                return Err(KeelError::DuplicateField {
                    component: self.kind.to_string(),
                    field: record.name.clone(),
                });
            }
            decoded.push((field, field.handler.decode_any(&record.value)?));
        }

        let target = target.as_any_mut();
        for (field, value) in decoded {
            (field.write)(&mut *target, value)?;
        }
        Ok(())
    }

    /// A default instance with the records applied
    pub fn deserialize(&self, records: &[FieldRecord]) -> Result<Box<dyn AnyComponent>> {
        let mut component = self.create_default();
        self.deserialize_into(records, &mut *component)?;
        Ok(component)
    }
}

impl fmt::Debug for SerializationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationInfo")
            .field("kind", &self.kind)
            .field("type", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}
