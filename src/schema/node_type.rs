//! Node types and their builder

use super::attribute::AttributeDescriptor;
use crate::error::{ModelError, ModelResult};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Numeric id of a node or edge type. Zero means "not assigned by the server".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityTypeId(pub i32);

impl EntityTypeId {
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for EntityTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityTypeId({})", self.0)
    }
}

impl From<i32> for EntityTypeId {
    fn from(id: i32) -> Self {
        EntityTypeId(id)
    }
}

/// Ordered attribute map shared by node and edge types
pub type AttributeMap = IndexMap<String, Arc<AttributeDescriptor>>;

/// Immutable node type.
///
/// The attribute map is the effective one: attributes inherited from the
/// parent are resolved when the type is built, so lookups never walk the
/// parent chain.
#[derive(Debug, Clone)]
pub struct NodeType {
    id: EntityTypeId,
    name: String,
    parent: Option<Arc<NodeType>>,
    attributes: AttributeMap,
    primary_key: IndexSet<String>,
}

impl NodeType {
    pub fn builder(name: impl Into<String>) -> NodeTypeBuilder {
        NodeTypeBuilder::new(name)
    }

    /// Build a type strictly from authoritative lists, as fetched from the
    /// server. Nothing is inherited; empty lists give empty sets.
    pub fn from_descriptors<A, D, K, P>(name: impl Into<String>, attributes: A, primary_key: K) -> ModelResult<NodeType>
    where
        A: IntoIterator<Item = D>,
        D: Into<Arc<AttributeDescriptor>>,
        K: IntoIterator<Item = P>,
        P: AsRef<AttributeDescriptor>,
    {
        NodeTypeBuilder::new(name)
            .with_attributes(attributes)
            .with_primary_key(primary_key)
            .build()
    }

    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type this one was derived from
    pub fn parent(&self) -> Option<&Arc<NodeType>> {
        self.parent.as_ref()
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute descriptors in declaration order
    pub fn attributes(&self) -> impl Iterator<Item = &Arc<AttributeDescriptor>> {
        self.attributes.values()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn primary_key_names(&self) -> impl Iterator<Item = &str> {
        self.primary_key.iter().map(String::as_str)
    }

    /// Descriptors of the primary key attributes, in key order
    pub fn primary_key(&self) -> impl Iterator<Item = &Arc<AttributeDescriptor>> {
        self.primary_key.iter().filter_map(|name| self.attributes.get(name))
    }

    pub fn is_primary_key(&self, name: &str) -> bool {
        self.primary_key.contains(name)
    }

    pub fn primary_key_len(&self) -> usize {
        self.primary_key.len()
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({}", self.name)?;
        if let Some(parent) = &self.parent {
            write!(f, " : {}", parent.name)?;
        }
        write!(f, ")")
    }
}

/// Builder producing an immutable [`NodeType`].
///
/// `parent` merges the parent's attributes and primary key into the type;
/// `with_attributes` and `with_primary_key` replace whatever the builder
/// holds, inherited entries included.
#[derive(Debug, Clone)]
pub struct NodeTypeBuilder {
    id: EntityTypeId,
    name: String,
    parent: Option<Arc<NodeType>>,
    attributes: AttributeMap,
    primary_key: IndexSet<String>,
}

impl NodeTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        NodeTypeBuilder {
            id: EntityTypeId::default(),
            name: name.into(),
            parent: None,
            attributes: AttributeMap::new(),
            primary_key: IndexSet::new(),
        }
    }

    pub fn id(mut self, id: impl Into<EntityTypeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Derive from `parent`; own attributes with the same name win
    pub fn parent(mut self, parent: Arc<NodeType>) -> Self {
        let mut merged = parent.attributes.clone();
        merged.extend(self.attributes.drain(..));
        self.attributes = merged;

        if self.primary_key.is_empty() {
            self.primary_key = parent.primary_key.clone();
        }
        self.parent = Some(parent);
        self
    }

    /// Add one attribute
    pub fn attribute(mut self, descriptor: impl Into<Arc<AttributeDescriptor>>) -> Self {
        let descriptor = descriptor.into();
        self.attributes.insert(descriptor.name().to_string(), descriptor);
        self
    }

    /// Replace the attribute map with exactly `descriptors`
    pub fn with_attributes<A, D>(mut self, descriptors: A) -> Self
    where
        A: IntoIterator<Item = D>,
        D: Into<Arc<AttributeDescriptor>>,
    {
        self.attributes.clear();
        for descriptor in descriptors {
            let descriptor = descriptor.into();
            self.attributes.insert(descriptor.name().to_string(), descriptor);
        }
        self
    }

    /// Add one attribute name to the primary key
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key.insert(name.into());
        self
    }

    /// Replace the primary key with exactly the names of `descriptors`
    pub fn with_primary_key<K, P>(mut self, descriptors: K) -> Self
    where
        K: IntoIterator<Item = P>,
        P: AsRef<AttributeDescriptor>,
    {
        self.primary_key = descriptors
            .into_iter()
            .map(|d| d.as_ref().name().to_string())
            .collect();
        self
    }

    pub fn build(self) -> ModelResult<NodeType> {
        if self.name.is_empty() {
            return Err(ModelError::invalid_schema("node type name cannot be empty"));
        }
        if let Some(missing) = self.primary_key.iter().find(|k| !self.attributes.contains_key(*k)) {
            return Err(ModelError::invalid_schema(format!(
                "primary key attribute '{}' does not belong to node type {}",
                missing, self.name
            )));
        }

        Ok(NodeType {
            id: self.id,
            name: self.name,
            parent: self.parent,
            attributes: self.attributes,
            primary_key: self.primary_key,
        })
    }
}
