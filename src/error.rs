//! Error types for the graph object model

use crate::schema::AttributeType;
use thiserror::Error;

/// Errors raised by schema construction, entity mutation and key building.
///
/// All of them are local and recoverable: nothing in the model is left
/// half-updated when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A node or edge type name is absent from the metadata snapshot
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// No descriptor for the attribute on the type or its parent chain
    #[error("Attribute '{attribute}' is not declared on {type_name}")]
    AttributeNotDeclared {
        type_name: String,
        attribute: String,
    },

    /// A composite key was given an attribute outside the primary key
    #[error("Attribute '{attribute}' is not part of the primary key of {type_name}")]
    InvalidKeyAttribute {
        type_name: String,
        attribute: String,
    },

    /// The value cannot be stored under the descriptor's scalar kind
    #[error("Invalid value for attribute '{attribute}': expected {expected}, got {actual}")]
    InvalidValue {
        attribute: String,
        expected: AttributeType,
        actual: &'static str,
    },

    /// A type definition violates a schema invariant
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

impl ModelError {
    pub fn not_declared(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        ModelError::AttributeNotDeclared {
            type_name: type_name.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_schema<T: Into<String>>(msg: T) -> Self {
        ModelError::InvalidSchema(msg.into())
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ModelError::TypeNotFound("Persn".to_string());
        assert_eq!(err.to_string(), "Type not found: Persn");

        let err = ModelError::not_declared("Person", "height");
        assert_eq!(
            err.to_string(),
            "Attribute 'height' is not declared on Person"
        );

        let err = ModelError::InvalidValue {
            attribute: "age".to_string(),
            expected: AttributeType::Integer,
            actual: "String",
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for attribute 'age': expected Integer, got String"
        );
    }
}
