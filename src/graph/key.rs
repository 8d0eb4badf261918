//! Composite keys for point lookups

use super::value::AttributeValue;
use crate::config::KeyValidation;
use crate::error::{ModelError, ModelResult};
use crate::schema::NodeType;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Attribute values identifying one node of a node type.
///
/// Which attributes may be set depends on the [`KeyValidation`] the
/// factory was configured with.
#[derive(Debug, Clone)]
pub struct CompositeKey {
    node_type: Arc<NodeType>,
    validation: KeyValidation,
    values: IndexMap<String, AttributeValue>,
}

impl CompositeKey {
    pub(crate) fn new(node_type: Arc<NodeType>, validation: KeyValidation) -> Self {
        CompositeKey {
            node_type,
            validation,
            values: IndexMap::new(),
        }
    }

    pub fn node_type(&self) -> &Arc<NodeType> {
        &self.node_type
    }

    pub fn node_type_name(&self) -> &str {
        self.node_type.name()
    }

    pub fn validation(&self) -> KeyValidation {
        self.validation
    }

    /// Set one key attribute.
    ///
    /// Undeclared names fail with `AttributeNotDeclared`; under
    /// [`KeyValidation::PrimaryKey`] declared names outside the primary key
    /// fail with `InvalidKeyAttribute`. Null is never a valid key value.
    pub fn set_attribute<V: Into<AttributeValue>>(&mut self, name: &str, value: V) -> ModelResult<()> {
        let descriptor = self
            .node_type
            .attribute(name)
            .ok_or_else(|| ModelError::not_declared(self.node_type.name(), name))?;

        if self.validation == KeyValidation::PrimaryKey && !self.node_type.is_primary_key(name) {
            return Err(ModelError::InvalidKeyAttribute {
                type_name: self.node_type.name().to_string(),
                attribute: name.to_string(),
            });
        }

        let value = value.into();
        if value.is_null() {
            return Err(ModelError::InvalidValue {
                attribute: name.to_string(),
                expected: descriptor.attr_type(),
                actual: value.type_name(),
            });
        }

        let value = value.coerce_to(descriptor)?;
        debug!("Key {} set {} = {}", self.node_type.name(), name, value);
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Values in the order they were set
    pub fn values(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Values of the primary key attributes in key order, `None` if any is
    /// missing
    pub fn primary_key_values(&self) -> Option<Vec<&AttributeValue>> {
        self.node_type
            .primary_key_names()
            .map(|name| self.values.get(name))
            .collect()
    }

    /// True when every primary key attribute has a value
    pub fn is_complete(&self) -> bool {
        self.node_type.primary_key_len() > 0 && self.primary_key_values().is_some()
    }

    /// Primary key attributes still without a value
    pub fn missing_attributes(&self) -> Vec<&str> {
        self.node_type
            .primary_key_names()
            .filter(|name| !self.values.contains_key(*name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.node_type.name())?;
        for (i, (name, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}
