//! Graph entity: a named collection of nodes and edges

use super::edge::Edge;
use super::entity::{EntityCore, GraphObject};
use super::handle::Shared;
use super::node::Node;
use super::types::VirtualId;
use crate::schema::DirectionKind;
use indexmap::IndexMap;
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;

#[derive(Debug)]
pub(crate) struct GraphData {
    core: EntityCore,
    name: String,
    nodes: IndexMap<VirtualId, Node>,
    edges: IndexMap<VirtualId, Edge>,
}

/// A graph handle.
///
/// Membership is local bookkeeping: adding a node does not change the
/// node, and removing one only drops it (and its incident edges) from
/// this collection.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Graph {
    shared: Shared<GraphData>,
}

impl Graph {
    pub(crate) fn new(core: EntityCore, name: impl Into<String>) -> Self {
        Graph {
            shared: Shared::new(
                core.virtual_id(),
                GraphData {
                    core,
                    name: name.into(),
                    nodes: IndexMap::new(),
                    edges: IndexMap::new(),
                },
            ),
        }
    }

    pub fn name(&self) -> String {
        self.shared.read().name.clone()
    }

    /// Name a graph built by `create_entity`
    pub fn set_name(&self, name: impl Into<String>) {
        self.shared.write().name = name.into();
    }

    /// Returns false if the node was already a member
    pub fn add_node(&self, node: &Node) -> bool {
        let mut data = self.shared.write();
        data.nodes.insert(node.virtual_id(), node.clone()).is_none()
    }

    /// Returns false if the edge was already a member
    pub fn add_edge(&self, edge: &Edge) -> bool {
        let mut data = self.shared.write();
        data.edges.insert(edge.virtual_id(), edge.clone()).is_none()
    }

    /// Remove a node and every member edge incident to it
    pub fn remove_node(&self, node: &Node) -> Option<Node> {
        let id = node.virtual_id();
        let mut data = self.shared.write();
        let removed = data.nodes.shift_remove(&id)?;
        data.edges.retain(|_, e| match e.vertices() {
            Some((from, to)) => from != id && to != id,
            None => true,
        });
        Some(removed)
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.shared.read().nodes.contains_key(&node.virtual_id())
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.shared.read().nodes.values().cloned().collect()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.shared.read().edges.values().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.shared.read().nodes.len()
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
}

impl GraphObject for Graph {
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

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("virtual_id", &self.virtual_id().as_i64())
            .finish()
    }
}
