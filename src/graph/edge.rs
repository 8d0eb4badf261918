//! Edge entity

use super::entity::{EntityCore, GraphObject, TypeBinding};
use super::handle::{Shared, WeakShared};
use super::node::{Node, NodeData};
use super::types::VirtualId;
use crate::error::ModelResult;
use crate::schema::{DirectionKind, EdgeType};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub(crate) struct EdgeData {
    core: EntityCore,
    direction: DirectionKind,
    // Nodes own their adjacency; the edge only refers back
    from: Option<WeakShared<NodeData>>,
    to: Option<WeakShared<NodeData>>,
}

/// An edge handle
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    shared: Shared<EdgeData>,
}

impl Edge {
    pub(crate) fn new(core: EntityCore, direction: DirectionKind) -> Self {
        Edge {
            shared: Shared::new(
                core.virtual_id(),
                EdgeData {
                    core,
                    direction,
                    from: None,
                    to: None,
                },
            ),
        }
    }

    pub fn direction(&self) -> DirectionKind {
        self.shared.read().direction
    }

    pub(crate) fn set_direction(&self, direction: DirectionKind) {
        self.shared.write().direction = direction;
    }

    pub fn edge_type(&self) -> Option<Arc<EdgeType>> {
        self.core().edge_type().cloned()
    }

    /// Bind a type to an edge that was created untyped.
    ///
    /// The edge takes the type's direction kind.
    pub fn set_edge_type(&self, edge_type: Arc<EdgeType>) -> ModelResult<()> {
        let mut data = self.shared.write();
        let direction = edge_type.direction();
        data.core.rebind(TypeBinding::Edge(edge_type))?;
        data.direction = direction;
        Ok(())
    }

    /// Set both endpoints.
    ///
    /// Only the edge is touched; the nodes' adjacency is left to the caller.
    pub fn connect(&self, from: &Node, to: &Node) {
        let mut data = self.shared.write();
        data.from = Some(from.downgrade());
        data.to = Some(to.downgrade());
    }

    /// The from-endpoint, if set and still alive
    pub fn from(&self) -> Option<Node> {
        let data = self.shared.read();
        data.from.as_ref()?.upgrade().map(Node::from_shared)
    }

    /// The to-endpoint, if set and still alive
    pub fn to(&self) -> Option<Node> {
        let data = self.shared.read();
        data.to.as_ref()?.upgrade().map(Node::from_shared)
    }

    pub fn from_virtual_id(&self) -> Option<VirtualId> {
        self.shared.read().from.as_ref().map(WeakShared::virtual_id)
    }

    pub fn to_virtual_id(&self) -> Option<VirtualId> {
        self.shared.read().to.as_ref().map(WeakShared::virtual_id)
    }

    /// Virtual ids of both endpoints, known even after the nodes are dropped
    pub fn vertices(&self) -> Option<(VirtualId, VirtualId)> {
        let data = self.shared.read();
        match (&data.from, &data.to) {
            (Some(from), Some(to)) => Some((from.virtual_id(), to.virtual_id())),
            _ => None,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        matches!(self.vertices(), Some((from, to)) if from == to)
    }
}

impl GraphObject for Edge {
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

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Edge")
            .field("virtual_id", &self.virtual_id().as_i64())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::{EntityKind, GraphObject, GraphObjectFactory};
    use crate::schema::{AttributeDescriptor, AttributeType, DirectionKind, EdgeType, GraphMetadata};
    use std::sync::Arc;

    fn factory() -> GraphObjectFactory {
        let since = AttributeDescriptor::with_id(4, "since", AttributeType::Integer);
        let knows = EdgeType::builder("KNOWS", DirectionKind::Bidirectional)
            .attribute(since)
            .build()
            .unwrap();
        GraphObjectFactory::new(Arc::new(GraphMetadata::new(Vec::new(), vec![knows])))
    }

    #[test]
    fn test_endpoints_are_weak() {
        let f = factory();
        let a = f.create_node();
        let b = f.create_node();
        let edge = f.create_edge(&a, &b, DirectionKind::Directed);
        let (a_id, b_id) = (a.virtual_id(), b.virtual_id());

        assert_eq!(edge.from().unwrap(), a);
        assert_eq!(edge.to().unwrap(), b);

        drop(a);
        drop(b);
        assert!(edge.from().is_none());
        assert_eq!(edge.vertices(), Some((a_id, b_id)));
    }

    #[test]
    fn test_connect_leaves_adjacency_alone() {
        let f = factory();
        let a = f.create_node();
        let b = f.create_node();
        let edge = f.create_entity(EntityKind::Edge).into_edge().unwrap();
        assert!(edge.vertices().is_none());

        edge.connect(&a, &b);
        assert_eq!(edge.from_virtual_id(), Some(a.virtual_id()));
        assert_eq!(a.edge_count(), 0);
        assert_eq!(b.edge_count(), 0);
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn test_set_edge_type_takes_direction() {
        let f = factory();
        let knows = Arc::clone(f.metadata().edge_type("KNOWS").unwrap());
        let edge = f.create_entity(EntityKind::Edge).into_edge().unwrap();
        edge.set_attribute("since", 2020).unwrap();

        edge.set_edge_type(knows).unwrap();
        assert_eq!(edge.direction(), DirectionKind::Bidirectional);
        assert_eq!(edge.type_name().as_deref(), Some("KNOWS"));
        assert!(edge.is_attribute_set("since"));
    }
}
