//! Graph metadata: one immutable schema snapshot
//!
//! A snapshot owns every node and edge type fetched in one schema session
//! and indexes them by name and by server id. It also keeps a registry of
//! all attribute descriptors, which is how attributes on untyped entities
//! are resolved.

use super::attribute::{AttributeDescriptor, AttributeId};
use super::edge_type::EdgeType;
use super::node_type::{EntityTypeId, NodeType};
use crate::error::{ModelError, ModelResult};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Read-only schema snapshot
#[derive(Debug, Clone, Default)]
pub struct GraphMetadata {
    node_types: IndexMap<String, Arc<NodeType>>,
    edge_types: IndexMap<String, Arc<EdgeType>>,
    node_types_by_id: FxHashMap<EntityTypeId, Arc<NodeType>>,
    edge_types_by_id: FxHashMap<EntityTypeId, Arc<EdgeType>>,
    descriptors: IndexMap<String, Arc<AttributeDescriptor>>,
}

impl GraphMetadata {
    /// Snapshot with no types at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from already-built types
    pub fn new<N, E>(node_types: N, edge_types: E) -> Self
    where
        N: IntoIterator<Item = NodeType>,
        E: IntoIterator<Item = EdgeType>,
    {
        let mut builder = GraphMetadataBuilder::new();
        for node_type in node_types {
            builder = builder.node_type(node_type);
        }
        for edge_type in edge_types {
            builder = builder.edge_type(edge_type);
        }
        builder.build()
    }

    pub fn builder() -> GraphMetadataBuilder {
        GraphMetadataBuilder::new()
    }

    /// Look up a node type by name
    pub fn node_type(&self, name: &str) -> Option<&Arc<NodeType>> {
        self.node_types.get(name)
    }

    /// Look up an edge type by name
    pub fn edge_type(&self, name: &str) -> Option<&Arc<EdgeType>> {
        self.edge_types.get(name)
    }

    /// Like [`node_type`](Self::node_type), failing with `TypeNotFound`
    pub fn require_node_type(&self, name: &str) -> ModelResult<&Arc<NodeType>> {
        self.node_type(name)
            .ok_or_else(|| ModelError::TypeNotFound(name.to_string()))
    }

    /// Like [`edge_type`](Self::edge_type), failing with `TypeNotFound`
    pub fn require_edge_type(&self, name: &str) -> ModelResult<&Arc<EdgeType>> {
        self.edge_type(name)
            .ok_or_else(|| ModelError::TypeNotFound(name.to_string()))
    }

    pub fn node_type_by_id(&self, id: EntityTypeId) -> Option<&Arc<NodeType>> {
        self.node_types_by_id.get(&id)
    }

    pub fn edge_type_by_id(&self, id: EntityTypeId) -> Option<&Arc<EdgeType>> {
        self.edge_types_by_id.get(&id)
    }

    /// Node types in insertion order
    pub fn node_types(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.node_types.values()
    }

    /// Edge types in insertion order
    pub fn edge_types(&self) -> impl Iterator<Item = &Arc<EdgeType>> {
        self.edge_types.values()
    }

    pub fn node_type_count(&self) -> usize {
        self.node_types.len()
    }

    pub fn edge_type_count(&self) -> usize {
        self.edge_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_types.is_empty() && self.edge_types.is_empty()
    }

    /// Descriptor registered under `name` anywhere in the snapshot
    pub fn attribute_descriptor(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.descriptors.get(name)
    }

    pub fn attribute_descriptor_by_id(&self, id: AttributeId) -> Option<&Arc<AttributeDescriptor>> {
        self.descriptors.values().find(|d| d.id() == id)
    }

    pub fn attribute_descriptors(&self) -> impl Iterator<Item = &Arc<AttributeDescriptor>> {
        self.descriptors.values()
    }

    /// Descriptors created on the client that the server has not assigned
    /// an id to yet
    pub fn new_attribute_descriptors(&self) -> Vec<Arc<AttributeDescriptor>> {
        self.descriptors
            .values()
            .filter(|d| d.id().is_local())
            .cloned()
            .collect()
    }
}

/// Collects types and descriptors into a [`GraphMetadata`].
///
/// A later type with an already registered name replaces the earlier one.
#[derive(Debug, Default)]
pub struct GraphMetadataBuilder {
    metadata: GraphMetadata,
}

impl GraphMetadataBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor that may not belong to any type
    pub fn attribute_descriptor(mut self, descriptor: impl Into<Arc<AttributeDescriptor>>) -> Self {
        self.register_descriptor(descriptor.into());
        self
    }

    pub fn node_type(mut self, node_type: impl Into<Arc<NodeType>>) -> Self {
        let node_type = node_type.into();
        for descriptor in node_type.attributes() {
            self.register_descriptor(Arc::clone(descriptor));
        }

        let md = &mut self.metadata;
        if let Some(previous) = md.node_types.get(node_type.name()) {
            warn!("Node type '{}' registered twice, keeping the last definition", node_type.name());
            md.node_types_by_id.remove(&previous.id());
        }
        if node_type.id() != EntityTypeId::default() {
            md.node_types_by_id.insert(node_type.id(), Arc::clone(&node_type));
        }
        md.node_types.insert(node_type.name().to_string(), node_type);
        self
    }

    pub fn edge_type(mut self, edge_type: impl Into<Arc<EdgeType>>) -> Self {
        let edge_type = edge_type.into();
        for descriptor in edge_type.attributes() {
            self.register_descriptor(Arc::clone(descriptor));
        }

        let md = &mut self.metadata;
        if let Some(previous) = md.edge_types.get(edge_type.name()) {
            warn!("Edge type '{}' registered twice, keeping the last definition", edge_type.name());
            md.edge_types_by_id.remove(&previous.id());
        }
        if edge_type.id() != EntityTypeId::default() {
            md.edge_types_by_id.insert(edge_type.id(), Arc::clone(&edge_type));
        }
        md.edge_types.insert(edge_type.name().to_string(), edge_type);
        self
    }

    fn register_descriptor(&mut self, descriptor: Arc<AttributeDescriptor>) {
        match self.metadata.descriptors.get(descriptor.name()) {
            Some(existing) if **existing != *descriptor => {
                debug!(
                    "Attribute '{}' declared with different definitions, registry keeps {}",
                    descriptor.name(),
                    existing
                );
            }
            Some(_) => {}
            None => {
                self.metadata
                    .descriptors
                    .insert(descriptor.name().to_string(), descriptor);
            }
        }
    }

    pub fn build(self) -> GraphMetadata {
        let md = self.metadata;
        info!(
            "Built graph metadata: {} node types, {} edge types, {} attributes",
            md.node_types.len(),
            md.edge_types.len(),
            md.descriptors.len()
        );
        md
    }
}
