//! Node entity and its adjacency

use super::edge::Edge;
use super::entity::{EntityCore, GraphObject, TypeBinding};
use super::handle::{Shared, WeakShared};
use super::types::{Direction, VirtualId};
use crate::error::ModelResult;
use crate::schema::{DirectionKind, NodeType};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) core: EntityCore,
    /// Incident edges; a self-loop appears once
    pub(crate) edges: Vec<Edge>,
    /// Nodes fetched together with this one, kept alive with it
    neighborhood: Vec<Node>,
}

/// A node handle.
///
/// Cloning the handle does not clone the node: all clones see the same
/// attributes and adjacency.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Node {
    shared: Shared<NodeData>,
}

impl Node {
    pub(crate) fn new(core: EntityCore) -> Self {
        Node {
            shared: Shared::new(
                core.virtual_id(),
                NodeData {
                    core,
                    edges: Vec::new(),
                    neighborhood: Vec::new(),
                },
            ),
        }
    }

    pub(crate) fn from_shared(shared: Shared<NodeData>) -> Self {
        Node { shared }
    }

    pub(crate) fn downgrade(&self) -> WeakShared<NodeData> {
        self.shared.downgrade()
    }

    pub fn node_type(&self) -> Option<Arc<NodeType>> {
        self.core().node_type().cloned()
    }

    /// Bind a type to a node that was created untyped.
    ///
    /// Attributes already set must be declared on the new type.
    pub fn set_node_type(&self, node_type: Arc<NodeType>) -> ModelResult<()> {
        self.core_mut().rebind(TypeBinding::Node(node_type))
    }

    /// Append `edge` to the adjacency unless it is already there
    pub(crate) fn attach_edge(&self, edge: &Edge) {
        let mut data = self.shared.write();
        if !data.edges.contains(edge) {
            data.edges.push(edge.clone());
        }
    }

    /// Own the nodes materialized by a traversal fetch rooted here, since
    /// edges only hold their endpoints weakly
    pub(crate) fn retain_neighborhood(&self, nodes: Vec<Node>) {
        self.shared.write().neighborhood = nodes;
    }

    pub(crate) fn push_edge(&self, edge: Edge) {
        self.shared.write().edges.push(edge);
    }

    /// All incident edges in creation order
    pub fn edges(&self) -> Vec<Edge> {
        self.shared.read().edges.clone()
    }

    pub fn edge_count(&self) -> usize {
        self.shared.read().edges.len()
    }

    pub fn edges_for_direction_kind(&self, kind: DirectionKind) -> Vec<Edge> {
        self.edges()
            .into_iter()
            .filter(|e| e.direction() == kind)
            .collect()
    }

    /// Incident edges of the named type (any type when `None`), seen from
    /// this node in the given direction. A self-loop is both outbound and
    /// inbound.
    pub fn edges_for_edge_type(&self, edge_type: Option<&str>, direction: Direction) -> Vec<Edge> {
        let me = self.virtual_id();
        self.edges()
            .into_iter()
            .filter(|e| match edge_type {
                Some(name) => e.type_name().as_deref() == Some(name),
                None => true,
            })
            .filter(|e| match direction {
                Direction::Any => true,
                Direction::Outbound => e.from_virtual_id() == Some(me),
                Direction::Inbound => e.to_virtual_id() == Some(me),
            })
            .collect()
    }

    /// Nodes at the other end of each incident edge. A self-loop yields
    /// this node.
    pub fn neighbors(&self) -> Vec<Node> {
        let me = self.virtual_id();
        self.edges()
            .iter()
            .filter_map(|e| {
                let (from, to) = (e.from()?, e.to()?);
                Some(if from.virtual_id() == me { to } else { from })
            })
            .collect()
    }
}

impl GraphObject for Node {
    fn virtual_id(&self) -> VirtualId {
        self.shared.virtual_id()
    }

    fn core(&self) -> MappedRwLockReadGuard<'_, EntityCore> {
        RwLockReadGuard::map(self.shared.read(), |d| &d.core)
    }

    fn core_mut(&self) -> MappedRwLockWriteGuard<'_, EntityCore> {
        RwLockWriteGuard::map(self.shared.write(), |d| &mut d.core)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("virtual_id", &self.virtual_id().as_i64())
            .finish()
    }
}
