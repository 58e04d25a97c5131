//! Field accessors.
//!
//! Pipes never touch records directly. When an assembler is built, a
//! [`Synthesizer`] produces a reader and writer for each bound field,
//! resolving the field against the declared type once so that translation
//! only pays for the access itself.

use crate::error::{CoreError, CoreResult};
use graphsync_model::{ObjectRef, TypeCatalog, TypeName, Value, ValueType};
use std::sync::Arc;

/// Reads one field of an object.
pub trait DataReader: Send + Sync {
    /// Reads the field from `source`.
    fn read(&self, source: &ObjectRef) -> CoreResult<Value>;

    /// Declared type of the field.
    fn value_type(&self) -> &ValueType;
}

/// Writes one field of an object.
pub trait DataWriter: Send + Sync {
    /// Writes `value` into `target`.
    fn write(&self, target: &ObjectRef, value: Value) -> CoreResult<()>;

    /// Declared type of the field.
    fn value_type(&self) -> &ValueType;
}

/// Produces accessors for declared fields.
pub trait Synthesizer: Send + Sync {
    /// Reader for `field` of `type_name`.
    fn reader(&self, type_name: &TypeName, field: &str) -> CoreResult<Arc<dyn DataReader>>;

    /// Writer for `field` of `type_name`.
    fn writer(&self, type_name: &TypeName, field: &str) -> CoreResult<Arc<dyn DataWriter>>;
}

/// Synthesizer over a [`TypeCatalog`].
///
/// Fields are looked up through the type's lineage. Writers reject values
/// that do not fit the declared field type.
#[derive(Debug, Clone)]
pub struct RecordSynthesizer {
    catalog: Arc<TypeCatalog>,
}

impl RecordSynthesizer {
    /// Creates a synthesizer over `catalog`.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }

    fn descriptor(
        &self,
        type_name: &TypeName,
        field: &str,
        access: &'static str,
    ) -> CoreResult<ValueType> {
        let not_found = || CoreError::PropertyNotFound {
            type_name: type_name.to_string(),
            field: field.to_string(),
            access,
        };
        let descriptor = self.catalog.field(type_name, field).map_err(|_| not_found())?;
        let available = match access {
            "reader" => descriptor.readable,
            _ => descriptor.writable,
        };
        if !available {
            return Err(not_found());
        }
        Ok(descriptor.value_type.clone())
    }
}

impl Synthesizer for RecordSynthesizer {
    fn reader(&self, type_name: &TypeName, field: &str) -> CoreResult<Arc<dyn DataReader>> {
        let value_type = self.descriptor(type_name, field, "reader")?;
        Ok(Arc::new(FieldReader {
            field: field.to_string(),
            value_type,
        }))
    }

    fn writer(&self, type_name: &TypeName, field: &str) -> CoreResult<Arc<dyn DataWriter>> {
        let value_type = self.descriptor(type_name, field, "writer")?;
        Ok(Arc::new(FieldWriter {
            field: field.to_string(),
            value_type,
            catalog: self.catalog.clone(),
        }))
    }
}

struct FieldReader {
    field: String,
    value_type: ValueType,
}

impl DataReader for FieldReader {
    fn read(&self, source: &ObjectRef) -> CoreResult<Value> {
        Ok(source.get(&self.field))
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }
}

struct FieldWriter {
    field: String,
    value_type: ValueType,
    catalog: Arc<TypeCatalog>,
}

impl DataWriter for FieldWriter {
    fn write(&self, target: &ObjectRef, value: Value) -> CoreResult<()> {
        if !self.catalog.accepts(&self.value_type, &value) {
            return Err(graphsync_model::ModelError::type_mismatch(
                self.field.clone(),
                self.value_type.to_string(),
                value.value_type().to_string(),
            )
            .into());
        }
        target.set(self.field.clone(), value);
        Ok(())
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }
}

/// Reader of a virtual field: yields the object itself.
pub(crate) struct SelfReader {
    value_type: ValueType,
}

impl SelfReader {
    pub(crate) fn new(type_name: &TypeName) -> Self {
        Self {
            value_type: ValueType::object(type_name.clone()),
        }
    }
}

impl DataReader for SelfReader {
    fn read(&self, source: &ObjectRef) -> CoreResult<Value> {
        Ok(Value::Object(source.clone()))
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }
}

/// Writer of a virtual field: discards every value.
pub(crate) struct DiscardWriter {
    value_type: ValueType,
}

impl DiscardWriter {
    pub(crate) fn new() -> Self {
        Self {
            value_type: ValueType::Any,
        }
    }
}

impl DataWriter for DiscardWriter {
    fn write(&self, _target: &ObjectRef, _value: Value) -> CoreResult<()> {
        Ok(())
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use graphsync_model::{FieldDescriptor, TypeModel};

    fn synthesizer() -> RecordSynthesizer {
        let catalog = TypeCatalog::new()
            .with(
                TypeModel::new("Base")
                    .field("id", ValueType::Integer)
                    .descriptor(FieldDescriptor::new("version", ValueType::Integer).read_only()),
            )
            .unwrap()
            .with(
                TypeModel::new("Order")
                    .extends("Base")
                    .field("customer", ValueType::object("Customer")),
            )
            .unwrap()
            .with(TypeModel::new("Customer"))
            .unwrap();
        RecordSynthesizer::new(Arc::new(catalog))
    }

    #[test]
    fn inherited_field_round_trip() {
        let s = synthesizer();
        let order = ObjectRef::new("Order");
        let ty = TypeName::from("Order");

        s.writer(&ty, "id").unwrap().write(&order, Value::Integer(9)).unwrap();
        let reader = s.reader(&ty, "id").unwrap();
        assert_eq!(reader.read(&order).unwrap(), Value::Integer(9));
        assert_eq!(reader.value_type(), &ValueType::Integer);
    }

    #[test]
    fn unknown_field_is_configuration_error() {
        let s = synthesizer();
        let err = s.reader(&TypeName::from("Order"), "missing").err().unwrap();
        assert!(matches!(err, CoreError::PropertyNotFound { access: "reader", .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn read_only_field_has_no_writer() {
        let s = synthesizer();
        let ty = TypeName::from("Order");
        assert!(s.reader(&ty, "version").is_ok());
        assert!(matches!(
            s.writer(&ty, "version").err().unwrap(),
            CoreError::PropertyNotFound { access: "writer", .. }
        ));
    }

    #[test]
    fn writer_checks_declared_type() {
        let s = synthesizer();
        let order = ObjectRef::new("Order");
        let writer = s.writer(&TypeName::from("Order"), "customer").unwrap();

        assert!(writer.write(&order, Value::Text("nope".into())).is_err());
        assert!(writer.write(&order, ObjectRef::new("Customer").into()).is_ok());
        assert!(writer.write(&order, Value::Null).is_ok());
        assert!(order.get("customer").is_null());
    }

    #[test]
    fn virtual_accessors() {
        let order = ObjectRef::new("Order").with("id", 1i64);
        let reader = SelfReader::new(&order.type_name());
        assert!(reader.read(&order).unwrap().same(&Value::Object(order.clone())));

        DiscardWriter::new().write(&order, Value::Integer(2)).unwrap();
        assert_eq!(order.get("id"), Value::Integer(1));
    }
}
