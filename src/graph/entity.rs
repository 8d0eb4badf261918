//! State shared by nodes, edges and graphs
//!
//! Every entity carries an [`EntityCore`]: identity, commit state, the type
//! it is bound to and its attribute values. [`GraphObject`] exposes the core
//! through the entity's lock, and [`Entity`] is the tagged union the
//! factory and connections pass around.

use super::container::Graph;
use super::edge::Edge;
use super::node::Node;
use super::types::{EntityId, EntityKind, EntityState, VirtualId};
use super::value::AttributeValue;
use crate::error::{ModelError, ModelResult};
use crate::schema::{AttributeDescriptor, EdgeType, GraphMetadata, NodeType};
use indexmap::{IndexMap, IndexSet};
use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};
use std::sync::Arc;

/// The type an entity's attributes are resolved against
#[derive(Debug, Clone)]
pub(crate) enum TypeBinding {
    Node(Arc<NodeType>),
    Edge(Arc<EdgeType>),
    /// Resolved through the snapshot's descriptor registry
    Untyped,
}

impl TypeBinding {
    fn attribute(&self, metadata: &GraphMetadata, name: &str) -> Option<Arc<AttributeDescriptor>> {
        match self {
            TypeBinding::Node(t) => t.attribute(name).cloned(),
            TypeBinding::Edge(t) => t.attribute(name).cloned(),
            TypeBinding::Untyped => metadata.attribute_descriptor(name).cloned(),
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            TypeBinding::Node(t) => Some(t.name()),
            TypeBinding::Edge(t) => Some(t.name()),
            TypeBinding::Untyped => None,
        }
    }
}

/// An attribute value together with its descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    descriptor: Arc<AttributeDescriptor>,
    value: AttributeValue,
}

impl Attribute {
    pub fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

#[derive(Debug)]
pub struct EntityCore {
    kind: EntityKind,
    virtual_id: VirtualId,
    entity_id: Option<EntityId>,
    version: u64,
    state: EntityState,
    binding: TypeBinding,
    metadata: Arc<GraphMetadata>,
    attributes: IndexMap<String, Attribute>,
    modified: IndexSet<String>,
}

impl EntityCore {
    pub(crate) fn new(
        kind: EntityKind,
        virtual_id: VirtualId,
        binding: TypeBinding,
        metadata: Arc<GraphMetadata>,
    ) -> Self {
        EntityCore {
            kind,
            virtual_id,
            entity_id: None,
            version: 0,
            state: EntityState::New,
            binding,
            metadata,
            attributes: IndexMap::new(),
            modified: IndexSet::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn virtual_id(&self) -> VirtualId {
        self.virtual_id
    }

    /// Durable id, known only after a commit
    pub fn entity_id(&self) -> Option<EntityId> {
        self.entity_id
    }

    /// Number of commits this entity has gone through
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == EntityState::New
    }

    pub fn metadata(&self) -> &Arc<GraphMetadata> {
        &self.metadata
    }

    pub fn node_type(&self) -> Option<&Arc<NodeType>> {
        match &self.binding {
            TypeBinding::Node(t) => Some(t),
            _ => None,
        }
    }

    pub fn edge_type(&self) -> Option<&Arc<EdgeType>> {
        match &self.binding {
            TypeBinding::Edge(t) => Some(t),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.binding.name()
    }

    /// Resolve `name` to the descriptor it is stored under
    pub fn descriptor(&self, name: &str) -> ModelResult<Arc<AttributeDescriptor>> {
        self.binding
            .attribute(&self.metadata, name)
            .ok_or_else(|| self.not_declared(name))
    }

    fn not_declared(&self, name: &str) -> ModelError {
        let owner = match self.binding.name() {
            Some(type_name) => type_name.to_string(),
            None => format!("untyped {}", self.kind),
        };
        ModelError::not_declared(owner, name)
    }

    pub fn set_attribute(&mut self, name: &str, value: AttributeValue) -> ModelResult<()> {
        let descriptor = self.descriptor(name)?;
        let value = value.coerce_to(&descriptor)?;

        self.attributes
            .insert(name.to_string(), Attribute { descriptor, value });
        self.modified.insert(name.to_string());
        if self.state == EntityState::Clean {
            self.state = EntityState::Modified;
        }
        Ok(())
    }

    /// `Ok(None)` when the attribute is declared but was never set
    pub fn get_attribute(&self, name: &str) -> ModelResult<Option<&AttributeValue>> {
        match self.attributes.get(name) {
            Some(attr) => Ok(Some(&attr.value)),
            None => self.descriptor(name).map(|_| None),
        }
    }

    /// True when the attribute holds a non-null value
    pub fn is_attribute_set(&self, name: &str) -> bool {
        self.attributes.get(name).is_some_and(|a| !a.is_null())
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Names set since the last commit, in the order they were first set
    pub fn modified_attributes(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(String::as_str)
    }

    /// Record a successful commit.
    ///
    /// The virtual id never changes; the durable id is stored alongside.
    pub fn mark_committed(&mut self, entity_id: EntityId) {
        self.entity_id = Some(entity_id);
        self.version += 1;
        self.state = EntityState::Clean;
        self.modified.clear();
    }

    pub fn mark_deleted(&mut self) {
        self.state = EntityState::Deleted;
        self.modified.clear();
    }

    /// Bring a freshly materialized entity to the server's state
    pub(crate) fn load_committed(&mut self, entity_id: EntityId, version: u64) {
        self.entity_id = Some(entity_id);
        self.version = version;
        self.state = EntityState::Clean;
        self.modified.clear();
    }

    /// Bind a new type. Every stored attribute must be declared on it.
    pub(crate) fn rebind(&mut self, binding: TypeBinding) -> ModelResult<()> {
        let mut rebound = IndexMap::with_capacity(self.attributes.len());
        for (name, attr) in &self.attributes {
            let descriptor = binding.attribute(&self.metadata, name).ok_or_else(|| {
                ModelError::not_declared(binding.name().unwrap_or("untyped entity"), name.as_str())
            })?;
            let value = attr.value.clone().coerce_to(&descriptor)?;
            rebound.insert(name.clone(), Attribute { descriptor, value });
        }
        self.attributes = rebound;
        self.binding = binding;
        Ok(())
    }
}

/// Common behavior of every entity handle.
///
/// The provided methods lock the entity for the duration of the call only.
pub trait GraphObject {
    fn virtual_id(&self) -> VirtualId;

    /// Read access to the entity core
    fn core(&self) -> MappedRwLockReadGuard<'_, EntityCore>;

    /// Write access to the entity core
    fn core_mut(&self) -> MappedRwLockWriteGuard<'_, EntityCore>;

    fn kind(&self) -> EntityKind {
        self.core().kind()
    }

    fn entity_id(&self) -> Option<EntityId> {
        self.core().entity_id()
    }

    fn version(&self) -> u64 {
        self.core().version()
    }

    fn state(&self) -> EntityState {
        self.core().state()
    }

    fn is_new(&self) -> bool {
        self.core().is_new()
    }

    fn type_name(&self) -> Option<String> {
        self.core().type_name().map(str::to_string)
    }

    /// Set an attribute declared on the entity's type.
    ///
    /// Fails with `AttributeNotDeclared` for unknown names and with
    /// `InvalidValue` when the value does not fit the descriptor.
    fn set_attribute<V>(&self, name: &str, value: V) -> ModelResult<()>
    where
        V: Into<AttributeValue>,
        Self: Sized,
    {
        self.core_mut().set_attribute(name, value.into())
    }

    fn get_attribute(&self, name: &str) -> ModelResult<Option<AttributeValue>> {
        self.core().get_attribute(name).map(|v| v.cloned())
    }

    fn is_attribute_set(&self, name: &str) -> bool {
        self.core().is_attribute_set(name)
    }

    fn attributes(&self) -> Vec<Attribute> {
        self.core().attributes().cloned().collect()
    }

    fn modified_attributes(&self) -> Vec<String> {
        self.core().modified_attributes().map(str::to_string).collect()
    }

    fn mark_committed(&self, entity_id: EntityId) {
        self.core_mut().mark_committed(entity_id)
    }

    fn mark_deleted(&self) {
        self.core_mut().mark_deleted()
    }
}

/// Any entity the factory can create
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Entity {
    Node(Node),
    Edge(Edge),
    Graph(Graph),
}

impl Entity {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Entity::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Entity::Edge(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            Entity::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Entity::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn into_edge(self) -> Option<Edge> {
        match self {
            Entity::Edge(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_graph(self) -> Option<Graph> {
        match self {
            Entity::Graph(g) => Some(g),
            _ => None,
        }
    }
}

impl GraphObject for Entity {
    fn virtual_id(&self) -> VirtualId {
        match self {
            Entity::Node(n) => n.virtual_id(),
            Entity::Edge(e) => e.virtual_id(),
            Entity::Graph(g) => g.virtual_id(),
        }
    }

    fn core(&self) -> MappedRwLockReadGuard<'_, EntityCore> {
        match self {
            Entity::Node(n) => n.core(),
            Entity::Edge(e) => e.core(),
            Entity::Graph(g) => g.core(),
        }
    }

    fn core_mut(&self) -> MappedRwLockWriteGuard<'_, EntityCore> {
        match self {
            Entity::Node(n) => n.core_mut(),
            Entity::Edge(e) => e.core_mut(),
            Entity::Graph(g) => g.core_mut(),
        }
    }
}

impl From<Node> for Entity {
    fn from(node: Node) -> Self {
        Entity::Node(node)
    }
}

impl From<Edge> for Entity {
    fn from(edge: Edge) -> Self {
        Entity::Edge(edge)
    }
}

impl From<Graph> for Entity {
    fn from(graph: Graph) -> Self {
        Entity::Graph(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;

    fn person_core() -> EntityCore {
        let name = AttributeDescriptor::with_id(1, "name", AttributeType::String);
        let age = AttributeDescriptor::with_id(2, "age", AttributeType::Integer);
        let person = Arc::new(
            NodeType::from_descriptors("Person", vec![name.clone(), age], [&name]).unwrap(),
        );
        let md = Arc::new(GraphMetadata::builder().node_type(Arc::clone(&person)).build());
        EntityCore::new(EntityKind::Node, VirtualId(-1), TypeBinding::Node(person), md)
    }

    #[test]
    fn test_set_and_get_attribute() {
        let mut core = person_core();
        core.set_attribute("name", AttributeValue::from("john")).unwrap();
        core.set_attribute("age", AttributeValue::from(40)).unwrap();

        assert_eq!(core.get_attribute("name").unwrap(), Some(&AttributeValue::from("john")));
        assert_eq!(core.get_attribute("age").unwrap(), Some(&AttributeValue::Integer(40)));
        assert_eq!(core.state(), EntityState::New);
    }

    #[test]
    fn test_unset_null_and_undeclared_differ() {
        let mut core = person_core();
        assert_eq!(core.get_attribute("age").unwrap(), None);

        core.set_attribute("age", AttributeValue::Null).unwrap();
        assert_eq!(core.get_attribute("age").unwrap(), Some(&AttributeValue::Null));
        assert!(!core.is_attribute_set("age"));

        let err = core.get_attribute("height").unwrap_err();
        assert_eq!(err, ModelError::not_declared("Person", "height"));
    }

    #[test]
    fn test_commit_lifecycle() {
        let mut core = person_core();
        core.set_attribute("name", AttributeValue::from("ann")).unwrap();
        assert_eq!(core.modified_attributes().collect::<Vec<_>>(), vec!["name"]);

        core.mark_committed(EntityId(9));
        assert_eq!(core.state(), EntityState::Clean);
        assert_eq!(core.entity_id(), Some(EntityId(9)));
        assert_eq!(core.version(), 1);
        assert_eq!(core.virtual_id(), VirtualId(-1));
        assert_eq!(core.modified_attributes().count(), 0);

        core.set_attribute("age", AttributeValue::from(30)).unwrap();
        assert_eq!(core.state(), EntityState::Modified);

        core.mark_deleted();
        assert_eq!(core.state(), EntityState::Deleted);
    }

    #[test]
    fn test_invalid_value_leaves_entity_untouched() {
        let mut core = person_core();
        assert!(core.set_attribute("age", AttributeValue::from("old")).is_err());
        assert_eq!(core.get_attribute("age").unwrap(), None);
        assert_eq!(core.modified_attributes().count(), 0);
    }

    #[test]
    fn test_untyped_resolves_through_registry() {
        let person = person_core();
        let md = Arc::clone(person.metadata());
        let mut untyped = EntityCore::new(EntityKind::Node, VirtualId(-2), TypeBinding::Untyped, md);

        untyped.set_attribute("age", AttributeValue::from(5)).unwrap();
        let err = untyped.set_attribute("wings", AttributeValue::from(2)).unwrap_err();
        assert_eq!(err.to_string(), "Attribute 'wings' is not declared on untyped Node");
    }
}
