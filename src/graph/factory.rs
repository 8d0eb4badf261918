//! Graph object factory
//!
//! The factory is bound to one metadata snapshot and is the only way to
//! create entities and composite keys. It hands out virtual ids and keeps
//! node adjacency consistent when edges are created.

use super::container::Graph;
use super::edge::Edge;
use super::entity::{Entity, EntityCore, GraphObject, TypeBinding};
use super::key::CompositeKey;
use super::node::Node;
use super::types::{EntityKind, VirtualId};
use crate::config::ModelConfig;
use crate::error::ModelResult;
use crate::schema::{DirectionKind, EdgeType, GraphMetadata, NodeType};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Creates entities and keys for one metadata snapshot.
///
/// Cloning keeps the virtual id sequence: entities from a factory and its
/// clones never share a virtual id.
#[derive(Debug, Clone)]
pub struct GraphObjectFactory {
    metadata: Arc<GraphMetadata>,
    config: ModelConfig,
    /// Virtual ids count down from here
    last_virtual_id: Arc<AtomicI64>,
}

impl GraphObjectFactory {
    /// Create a factory with the default config
    pub fn new(metadata: Arc<GraphMetadata>) -> Self {
        Self::with_config(metadata, ModelConfig::default())
    }

    pub fn with_config(metadata: Arc<GraphMetadata>, config: ModelConfig) -> Self {
        GraphObjectFactory {
            metadata,
            config,
            last_virtual_id: Arc::new(AtomicI64::new(0)),
        }
    }

    /// A factory for another snapshot that continues this factory's
    /// virtual id sequence
    pub fn with_metadata(&self, metadata: Arc<GraphMetadata>) -> Self {
        GraphObjectFactory {
            metadata,
            config: self.config.clone(),
            last_virtual_id: Arc::clone(&self.last_virtual_id),
        }
    }

    pub fn metadata(&self) -> &Arc<GraphMetadata> {
        &self.metadata
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn next_virtual_id(&self) -> VirtualId {
        VirtualId(self.last_virtual_id.fetch_sub(1, Ordering::Relaxed) - 1)
    }

    fn core(&self, kind: EntityKind, binding: TypeBinding) -> EntityCore {
        EntityCore::new(kind, self.next_virtual_id(), binding, Arc::clone(&self.metadata))
    }

    /// Create a node with no type; attributes resolve through the
    /// snapshot's descriptor registry
    pub fn create_node(&self) -> Node {
        let node = Node::new(self.core(EntityKind::Node, TypeBinding::Untyped));
        debug!("Created untyped node {}", node.virtual_id());
        node
    }

    pub fn create_node_of_type(&self, node_type: &Arc<NodeType>) -> Node {
        let node = Node::new(self.core(EntityKind::Node, TypeBinding::Node(Arc::clone(node_type))));
        debug!("Created {} node {}", node_type.name(), node.virtual_id());
        node
    }

    /// Create a node of the type registered under `name`
    pub fn create_node_of_type_named(&self, name: &str) -> ModelResult<Node> {
        let node_type = Arc::clone(self.metadata.require_node_type(name)?);
        Ok(self.create_node_of_type(&node_type))
    }

    /// Create an untyped edge and register it with its endpoints.
    ///
    /// The edge is always appended to `from`'s adjacency, and to `to`'s
    /// only when `to` is a different node.
    pub fn create_edge(&self, from: &Node, to: &Node, direction: DirectionKind) -> Edge {
        let edge = Edge::new(self.core(EntityKind::Edge, TypeBinding::Untyped), direction);
        self.link(&edge, from, to);
        edge
    }

    /// Create an edge of `edge_type`, taking its direction kind
    pub fn create_edge_with_type(&self, from: &Node, to: &Node, edge_type: Arc<EdgeType>) -> Edge {
        let direction = edge_type.direction();
        let edge = Edge::new(self.core(EntityKind::Edge, TypeBinding::Edge(edge_type)), direction);
        self.link(&edge, from, to);
        edge
    }

    pub fn create_edge_of_type_named(&self, from: &Node, to: &Node, name: &str) -> ModelResult<Edge> {
        let edge_type = Arc::clone(self.metadata.require_edge_type(name)?);
        Ok(self.create_edge_with_type(from, to, edge_type))
    }

    fn link(&self, edge: &Edge, from: &Node, to: &Node) {
        edge.connect(from, to);
        from.push_edge(edge.clone());
        if to.virtual_id() != from.virtual_id() {
            to.push_edge(edge.clone());
        }
        debug!(
            "Created edge {} from {} to {}",
            edge.virtual_id(),
            from.virtual_id(),
            to.virtual_id()
        );
    }

    /// Create an empty entity of `kind`.
    ///
    /// Meant for materializing server data: the entity is untyped, edges
    /// have no endpoints and no adjacency is registered.
    pub fn create_entity(&self, kind: EntityKind) -> Entity {
        let core = self.core(kind, TypeBinding::Untyped);
        match kind {
            EntityKind::Node => Entity::Node(Node::new(core)),
            EntityKind::Edge => Entity::Edge(Edge::new(core, DirectionKind::default())),
            EntityKind::Graph => Entity::Graph(Graph::new(core, String::new())),
        }
    }

    /// Create an empty key for the node type registered under `name`.
    ///
    /// Fails with `TypeNotFound` if the snapshot has no such node type.
    pub fn create_composite_key(&self, node_type_name: &str) -> ModelResult<CompositeKey> {
        let node_type = self.metadata.require_node_type(node_type_name)?;
        debug!("Created composite key for {}", node_type_name);
        Ok(CompositeKey::new(Arc::clone(node_type), self.config.key_validation))
    }

    pub fn create_graph(&self, name: impl Into<String>) -> Graph {
        let graph = Graph::new(self.core(EntityKind::Graph, TypeBinding::Untyped), name);
        debug!("Created graph '{}' {}", graph.name(), graph.virtual_id());
        graph
    }
}
