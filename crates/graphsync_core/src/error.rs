//! Error types for graphsync core.

use crate::types::Side;
use graphsync_model::ModelError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or inconsistent binding, detected when an assembler is
    /// built.
    Configuration,
    /// A capability key is missing from the registry or maps to the wrong
    /// kind of capability.
    CapabilityResolution,
    /// The instance factory could not produce a required instance.
    InstanceCreation,
    /// The requested operation is not valid for its arguments.
    Structural,
    /// Anything else; indicates a defect in the engine or its setup.
    Unclassified,
}

/// Errors that can occur while building assemblers or translating graphs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error raised by the graph model.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// No accessor can be synthesized for a property.
    #[error("no {access} for property {field} on {type_name}")]
    PropertyNotFound {
        /// Type that was inspected.
        type_name: String,
        /// Requested property.
        field: String,
        /// `reader` or `writer`.
        access: &'static str,
    },

    /// Field types differ and no converter is declared.
    #[error(
        "incompatible types for DTO field {dto_field} ({dto_type}) and entity field {entity_field} ({entity_type}); declare a converter"
    )]
    IncompatibleTypes {
        /// DTO field name.
        dto_field: String,
        /// Declared DTO field type.
        dto_type: String,
        /// Entity field name.
        entity_field: String,
        /// Declared entity field type.
        entity_type: String,
    },

    /// A nested binding lacks the bean key needed to create instances.
    #[error("binding for {field} needs {} {side} bean key", .side.article())]
    MissingBeanKey {
        /// DTO field of the binding.
        field: String,
        /// Side whose key is missing.
        side: Side,
    },

    /// A collection or map binding declares no matcher.
    #[error("binding for {dto_field} needs a matcher to synchronize elements")]
    MissingMatcher {
        /// DTO field of the binding.
        dto_field: String,
    },

    /// A virtual binding declares no converter.
    #[error("virtual binding for {dto_field} needs a converter")]
    MissingConverter {
        /// DTO field of the binding.
        dto_field: String,
    },

    /// Any other malformed binding.
    #[error("invalid binding for {dto_field}: {message}")]
    InvalidBinding {
        /// DTO field of the binding.
        dto_field: String,
        /// What is wrong.
        message: String,
    },

    /// The same DTO field is bound twice for one type pair.
    #[error("duplicate binding for {dto_type}.{dto_field} -> {entity_type}")]
    DuplicateBinding {
        /// DTO type.
        dto_type: String,
        /// Entity type.
        entity_type: String,
        /// DTO field bound twice.
        dto_field: String,
    },

    /// No bindings are registered for a type pair.
    #[error("no bindings registered for {dto_type} -> {entity_type}")]
    BindingsNotFound {
        /// DTO type.
        dto_type: String,
        /// Entity type.
        entity_type: String,
    },

    /// Converter key not present in the registry.
    #[error("converter {key} not found for DTO field {dto_field} / entity field {entity_field}")]
    ConverterNotFound {
        /// DTO field of the binding.
        dto_field: String,
        /// Entity field of the binding.
        entity_field: String,
        /// Registry key.
        key: String,
    },

    /// Registry key maps to something other than a converter.
    #[error("capability {key} for DTO field {dto_field} is a {actual}, not a converter")]
    NotAConverter {
        /// DTO field of the binding.
        dto_field: String,
        /// Registry key.
        key: String,
        /// Kind actually registered.
        actual: &'static str,
    },

    /// Retriever key not present in the registry.
    #[error("retriever {key} not found for entity field {entity_field} / DTO field {dto_field}")]
    RetrieverNotFound {
        /// DTO field of the binding.
        dto_field: String,
        /// Entity field of the binding.
        entity_field: String,
        /// Registry key.
        key: String,
    },

    /// Registry key maps to something other than a retriever.
    #[error("capability {key} for DTO field {dto_field} is a {actual}, not a retriever")]
    NotARetriever {
        /// DTO field of the binding.
        dto_field: String,
        /// Registry key.
        key: String,
        /// Kind actually registered.
        actual: &'static str,
    },

    /// Matcher key not present in the registry.
    #[error("matcher {key} not found for DTO field {dto_field} / entity field {entity_field}")]
    MatcherNotFound {
        /// DTO field of the binding.
        dto_field: String,
        /// Entity field of the binding.
        entity_field: String,
        /// Registry key.
        key: String,
    },

    /// Registry key maps to something other than a matcher.
    #[error("capability {key} for DTO field {dto_field} is a {actual}, not a matcher")]
    NotAMatcher {
        /// DTO field of the binding.
        dto_field: String,
        /// Registry key.
        key: String,
        /// Kind actually registered.
        actual: &'static str,
    },

    /// The factory has nothing registered under a key.
    #[error("unable to create {side} instance with key {key} for {field}")]
    UnableToCreateInstance {
        /// Factory key.
        key: String,
        /// Field or type being materialized.
        field: String,
        /// Side of the graph.
        side: Side,
    },

    /// The factory produced the wrong kind of instance.
    #[error("factory key {key} produced a {actual}, expected a {expected}")]
    UnexpectedInstance {
        /// Factory key.
        key: String,
        /// Kind required.
        expected: &'static str,
        /// Kind produced.
        actual: &'static str,
    },

    /// The factory cannot name the type registered under a key.
    #[error("unable to locate {side} type representation with key {key} for {field}")]
    UnableToLocateRepresentation {
        /// Factory key.
        key: String,
        /// Field being resolved.
        field: String,
        /// Side of the graph.
        side: Side,
    },

    /// A bulk DTO translation was given a non-empty output collection.
    #[error("DTO output collection must be empty")]
    InvalidDtoCollection,

    /// A bulk entity translation was given a non-empty output collection.
    #[error("entity output collection must be empty")]
    InvalidEntityCollection,

    /// An instance does not match the assembler's type.
    #[error("{side} instance of type {actual} is not a {expected}")]
    InvalidInstance {
        /// Side of the graph.
        side: Side,
        /// Type the assembler handles.
        expected: String,
        /// Runtime type of the instance.
        actual: String,
    },

    /// No composite delegate accepts an entity.
    #[error("no assembler for {dto_type} accepts entity type {entity_type}")]
    NoMatchingAssembler {
        /// DTO type of the composite.
        dto_type: String,
        /// Runtime entity type.
        entity_type: String,
    },

    /// The operation is not supported by this assembler.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// What was attempted.
        operation: String,
    },

    /// The assembler or its context has been released.
    #[error("assembler {dto_type} -> {entity_type} has been released")]
    Released {
        /// DTO type.
        dto_type: String,
        /// Entity type.
        entity_type: String,
    },

    /// Nesting went deeper than the configured limit.
    #[error("graph nesting exceeds depth limit {limit}")]
    DepthExceeded {
        /// Configured limit.
        limit: usize,
    },

    /// Failure raised by an external capability.
    #[error("capability failed: {message}")]
    Capability {
        /// Description supplied by the capability.
        message: String,
    },

    /// Unhandled situation; indicates an engine defect.
    #[error("runtime error: {message}")]
    Runtime {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PropertyNotFound { .. }
            | Self::IncompatibleTypes { .. }
            | Self::MissingBeanKey { .. }
            | Self::MissingMatcher { .. }
            | Self::MissingConverter { .. }
            | Self::InvalidBinding { .. }
            | Self::DuplicateBinding { .. }
            | Self::BindingsNotFound { .. } => ErrorKind::Configuration,
            Self::Model(
                ModelError::UnknownType { .. }
                | ModelError::UnknownField { .. }
                | ModelError::DuplicateType { .. },
            ) => ErrorKind::Configuration,
            Self::ConverterNotFound { .. }
            | Self::NotAConverter { .. }
            | Self::RetrieverNotFound { .. }
            | Self::NotARetriever { .. }
            | Self::MatcherNotFound { .. }
            | Self::NotAMatcher { .. } => ErrorKind::CapabilityResolution,
            Self::UnableToCreateInstance { .. }
            | Self::UnexpectedInstance { .. }
            | Self::UnableToLocateRepresentation { .. } => ErrorKind::InstanceCreation,
            Self::InvalidDtoCollection
            | Self::InvalidEntityCollection
            | Self::InvalidInstance { .. }
            | Self::NoMatchingAssembler { .. }
            | Self::Unsupported { .. }
            | Self::Released { .. }
            | Self::DepthExceeded { .. } => ErrorKind::Structural,
            Self::Model(_) | Self::Capability { .. } | Self::Runtime { .. } => {
                ErrorKind::Unclassified
            }
        }
    }

    /// Creates an invalid binding error.
    pub fn invalid_binding(dto_field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBinding {
            dto_field: dto_field.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Creates a capability failure, for use by converters and retrievers.
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability {
            message: message.into(),
        }
    }

    /// Creates a runtime error.
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            CoreError::invalid_binding("name", "bad").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            CoreError::ConverterNotFound {
                dto_field: "a".into(),
                entity_field: "b".into(),
                key: "k".into(),
            }
            .kind(),
            ErrorKind::CapabilityResolution
        );
        assert_eq!(
            CoreError::UnableToCreateInstance {
                key: "k".into(),
                field: "f".into(),
                side: Side::Entity,
            }
            .kind(),
            ErrorKind::InstanceCreation
        );
        assert_eq!(CoreError::InvalidDtoCollection.kind(), ErrorKind::Structural);
        assert_eq!(CoreError::runtime("boom").kind(), ErrorKind::Unclassified);
    }

    #[test]
    fn model_errors_split_by_cause() {
        let unknown: CoreError = ModelError::unknown_field("Order", "x").into();
        assert_eq!(unknown.kind(), ErrorKind::Configuration);

        let mismatch: CoreError = ModelError::type_mismatch("id", "integer", "text").into();
        assert_eq!(mismatch.kind(), ErrorKind::Unclassified);
    }

    #[test]
    fn messages_name_the_binding() {
        let err = CoreError::MissingBeanKey {
            field: "address".into(),
            side: Side::Entity,
        };
        assert_eq!(err.to_string(), "binding for address needs an entity bean key");
        let err = CoreError::MissingBeanKey {
            field: "address".into(),
            side: Side::Dto,
        };
        assert_eq!(err.to_string(), "binding for address needs a dto bean key");
    }
}
