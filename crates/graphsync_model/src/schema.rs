//! Declared type models.
//!
//! A [`TypeCatalog`] describes the record types of both graphs: their
//! fields, the declared type of each field and single inheritance via
//! `extends`. Accessor synthesis and polymorphic dispatch consult it.

use crate::error::{ModelError, ModelResult};
use crate::object::{ObjectRef, TypeName};
use crate::value::{Value, ValueType};
use std::collections::HashMap;

/// Declared field of a type model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub value_type: ValueType,
    /// Whether a reader may be synthesized.
    pub readable: bool,
    /// Whether a writer may be synthesized.
    pub writable: bool,
}

impl FieldDescriptor {
    /// Creates a readable and writable field.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            readable: true,
            writable: true,
        }
    }

    /// Marks the field as having no writer.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    /// Marks the field as having no reader.
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.readable = false;
        self
    }
}

/// Declared shape of one record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeModel {
    name: TypeName,
    extends: Option<TypeName>,
    fields: Vec<FieldDescriptor>,
}

impl TypeModel {
    /// Starts a type model with no fields.
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            fields: Vec::new(),
        }
    }

    /// Declares the supertype.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    /// Declares a readable and writable field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.fields.push(FieldDescriptor::new(name, value_type));
        self
    }

    /// Declares a field from a full descriptor.
    #[must_use]
    pub fn descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    /// Type name.
    pub fn name(&self) -> &TypeName {
        &self.name
    }

    /// Declared supertype, if any.
    pub fn parent(&self) -> Option<&TypeName> {
        self.extends.as_ref()
    }

    /// Fields declared directly on this type.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

/// Registry of declared type models.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<TypeName, TypeModel>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateType`] if the name is taken.
    pub fn declare(&mut self, model: TypeModel) -> ModelResult<()> {
        if self.types.contains_key(model.name()) {
            return Err(ModelError::DuplicateType {
                type_name: model.name().to_string(),
            });
        }
        self.types.insert(model.name().clone(), model);
        Ok(())
    }

    /// Adds a type model, builder style.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DuplicateType`] if the name is taken.
    pub fn with(mut self, model: TypeModel) -> ModelResult<Self> {
        self.declare(model)?;
        Ok(self)
    }

    /// Returns the model of a type.
    pub fn get(&self, type_name: &str) -> Option<&TypeModel> {
        self.types.get(type_name)
    }

    /// Returns true if the type is declared.
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are declared.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The type followed by its supertypes, nearest first.
    ///
    /// Undeclared names yield just themselves. Inheritance cycles are cut
    /// after every declared type has been visited once.
    pub fn lineage(&self, type_name: &str) -> Vec<TypeName> {
        let mut chain = vec![TypeName::new(type_name)];
        let mut current = self.types.get(type_name);
        while let Some(model) = current {
            let Some(parent) = model.parent() else {
                break;
            };
            if chain.len() > self.types.len() || chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = self.types.get(parent);
        }
        chain
    }

    /// Returns true if instances of `from` may be used where `to` is
    /// expected.
    pub fn is_assignable(&self, to: &str, from: &str) -> bool {
        self.lineage(from).iter().any(|t| t == to)
    }

    /// Inheritance-aware version of [`ValueType::is_assignable_from`].
    pub fn is_type_assignable(&self, to: &ValueType, from: &ValueType) -> bool {
        match (to, from) {
            (ValueType::Object(Some(a)), ValueType::Object(Some(b))) => self.is_assignable(a, b),
            (a, b) => a.is_assignable_from(b),
        }
    }

    /// Inheritance-aware version of [`ValueType::accepts`].
    pub fn accepts(&self, value_type: &ValueType, value: &Value) -> bool {
        match (value_type, value) {
            (ValueType::Object(Some(name)), Value::Object(o)) => {
                self.is_assignable(name, o.type_name().as_str())
            }
            (t, v) => t.accepts(v),
        }
    }

    /// Resolves a field on a type or one of its supertypes.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] or [`ModelError::UnknownField`].
    pub fn field(&self, type_name: &str, field: &str) -> ModelResult<&FieldDescriptor> {
        if !self.contains(type_name) {
            return Err(ModelError::unknown_type(type_name));
        }
        self.lineage(type_name)
            .iter()
            .filter_map(|t| self.types.get(t.as_str()))
            .flat_map(|m| m.fields.iter())
            .find(|f| f.name == field)
            .ok_or_else(|| ModelError::unknown_field(type_name, field))
    }

    /// Creates a blank instance of a declared type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownType`] if the type is not declared.
    pub fn instantiate(&self, type_name: &str) -> ModelResult<ObjectRef> {
        let model = self
            .types
            .get(type_name)
            .ok_or_else(|| ModelError::unknown_type(type_name))?;
        Ok(ObjectRef::new(model.name().clone()))
    }
}
