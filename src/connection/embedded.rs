//! EmbeddedConnection: in-process stand-in for a graph server
//!
//! Keeps committed entities in memory, enforces primary key uniqueness and
//! edge endpoint resolution on commit, and materializes fetched entities
//! through a factory bound to its snapshot. Useful for tests and for
//! applications that want the object model without a server.

use super::{CommitSummary, Connection, ConnectionError, ConnectionResult, FetchOptions};
use crate::config::{KeyValidation, ModelConfig};
use crate::graph::{
    AttributeValue, CompositeKey, Edge, Entity, EntityId, EntityKind, GraphObject, GraphObjectFactory, Node,
    VirtualId,
};
use crate::schema::{DirectionKind, GraphMetadata, SchemaDocument};
use async_trait::async_trait;
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Insert,
    Update,
    Delete,
}

/// Node type name and the primary key values
type KeyIndex = (String, Vec<KeyValue>);

/// Attribute value usable as an index key. Floats compare by bit pattern
/// with every NaN folded into one, so a NaN key finds itself.
#[derive(Debug, Clone)]
struct KeyValue(AttributeValue);

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        same_key_value(&self.0, &other.0)
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_key_value(&self.0, state);
    }
}

fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

fn same_key_value(a: &AttributeValue, b: &AttributeValue) -> bool {
    use AttributeValue as V;
    match (a, b) {
        (V::Float(x), V::Float(y)) => float_bits(f64::from(*x)) == float_bits(f64::from(*y)),
        (V::Double(x), V::Double(y)) => float_bits(*x) == float_bits(*y),
        (V::Array(xs), V::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_key_value(x, y))
        }
        _ => a == b,
    }
}

fn hash_key_value<H: Hasher>(value: &AttributeValue, state: &mut H) {
    use AttributeValue as V;
    std::mem::discriminant(value).hash(state);
    match value {
        V::Boolean(b) => b.hash(state),
        V::Byte(i) => i.hash(state),
        V::Char(c) => c.hash(state),
        V::Short(i) => i.hash(state),
        V::Integer(i) => i.hash(state),
        V::Long(i) => i.hash(state),
        V::Float(f) => float_bits(f64::from(*f)).hash(state),
        V::Double(f) => float_bits(*f).hash(state),
        V::Number(n) => n.hash(state),
        V::String(s) | V::Clob(s) => s.hash(state),
        V::Date(d) => d.hash(state),
        V::Time(t) => t.hash(state),
        V::TimeStamp(ts) => ts.hash(state),
        V::Blob(b) => b.hash(state),
        V::Array(items) => {
            items.len().hash(state);
            for item in items {
                hash_key_value(item, state);
            }
        }
        V::Null => {}
    }
}

/// Server-side copy of a committed entity
#[derive(Debug, Clone)]
struct StoredEntity {
    kind: EntityKind,
    type_name: Option<String>,
    name: Option<String>,
    direction: DirectionKind,
    endpoints: Option<(EntityId, EntityId)>,
    attributes: IndexMap<String, AttributeValue>,
    key: Option<KeyIndex>,
    version: u64,
}

impl StoredEntity {
    fn capture(entity: &Entity) -> ConnectionResult<Self> {
        let (direction, name) = match entity {
            Entity::Node(_) => (DirectionKind::default(), None),
            Entity::Edge(edge) => (edge.direction(), None),
            Entity::Graph(graph) => (DirectionKind::default(), Some(graph.name())),
        };

        let core = entity.core();
        let key = match core.node_type() {
            Some(node_type) if node_type.primary_key_len() > 0 => {
                let mut values = Vec::with_capacity(node_type.primary_key_len());
                for attribute in node_type.primary_key_names() {
                    match core.get_attribute(attribute)? {
                        Some(value) if !value.is_null() => values.push(KeyValue(value.clone())),
                        _ => {
                            return Err(ConnectionError::MissingKey {
                                type_name: node_type.name().to_string(),
                                attribute: attribute.to_string(),
                            })
                        }
                    }
                }
                Some((node_type.name().to_string(), values))
            }
            _ => None,
        };

        Ok(StoredEntity {
            kind: core.kind(),
            type_name: core.type_name().map(str::to_string),
            name,
            direction,
            endpoints: None,
            attributes: core
                .attributes()
                .map(|a| (a.name().to_string(), a.value().clone()))
                .collect(),
            key,
            version: 0,
        })
    }

    fn matches(&self, key: &CompositeKey) -> bool {
        self.kind == EntityKind::Node
            && self.type_name.as_deref() == Some(key.node_type_name())
            && key.values().all(|(name, value)| {
                self.attributes
                    .get(name)
                    .is_some_and(|stored| same_key_value(stored, value))
            })
    }
}

#[derive(Debug, Clone, Default)]
struct EntityStore {
    last_id: u64,
    entities: FxHashMap<EntityId, StoredEntity>,
    keys: FxHashMap<KeyIndex, EntityId>,
    /// Virtual ids known to denote a committed entity, so an edge can be
    /// inserted after the handle of its endpoint is gone
    committed: FxHashMap<VirtualId, EntityId>,
    /// Node id to incident edge ids; a self-loop is listed once
    adjacency: FxHashMap<EntityId, Vec<EntityId>>,
}

impl EntityStore {
    fn allocate_id(&mut self) -> EntityId {
        self.last_id += 1;
        EntityId(self.last_id)
    }

    /// Store `record` under `id`, replacing the previous version
    fn put(&mut self, id: EntityId, record: StoredEntity) -> ConnectionResult<()> {
        if let Some(previous) = self.entities.get(&id) {
            if let Some(key) = &previous.key {
                self.keys.remove(key);
            }
        }
        if let Some(key) = &record.key {
            match self.keys.get(key) {
                Some(owner) if *owner != id => {
                    let rendered: Vec<String> = key.1.iter().map(|v| v.0.to_string()).collect();
                    return Err(ConnectionError::DuplicateKey {
                        type_name: key.0.clone(),
                        key: format!("[{}]", rendered.join(", ")),
                    });
                }
                _ => {
                    self.keys.insert(key.clone(), id);
                }
            }
        }
        self.entities.insert(id, record);
        Ok(())
    }

    fn link(&mut self, edge: EntityId, from: EntityId, to: EntityId) {
        self.adjacency.entry(from).or_default().push(edge);
        if to != from {
            self.adjacency.entry(to).or_default().push(edge);
        }
    }

    /// Remove an entity. Removing a node removes its edges as well.
    fn remove(&mut self, id: EntityId) -> Option<StoredEntity> {
        let record = self.entities.remove(&id)?;
        self.committed.retain(|_, committed| *committed != id);
        if let Some(key) = &record.key {
            self.keys.remove(key);
        }
        if let Some((from, to)) = record.endpoints {
            for end in [from, to] {
                if let Some(edges) = self.adjacency.get_mut(&end) {
                    edges.retain(|e| *e != id);
                }
            }
        }
        if let Some(edges) = self.adjacency.remove(&id) {
            for edge in edges {
                self.remove(edge);
            }
        }
        Some(record)
    }

    fn find(&self, key: &CompositeKey) -> ConnectionResult<Option<EntityId>> {
        let missing = key.missing_attributes();
        if key.is_empty() || (key.validation() == KeyValidation::PrimaryKey && !missing.is_empty()) {
            return Err(ConnectionError::MissingKey {
                type_name: key.node_type_name().to_string(),
                attribute: missing.first().copied().unwrap_or_default().to_string(),
            });
        }

        if let Some(values) = key.primary_key_values().filter(|v| !v.is_empty()) {
            let index: KeyIndex = (
                key.node_type_name().to_string(),
                values.into_iter().cloned().map(KeyValue).collect(),
            );
            return Ok(self
                .keys
                .get(&index)
                .copied()
                .filter(|id| self.entities.get(id).is_some_and(|r| r.matches(key))));
        }

        // no usable primary key: scan
        Ok(self
            .entities
            .iter()
            .filter(|(_, record)| record.matches(key))
            .map(|(id, _)| *id)
            .min())
    }
}

/// Result of validating a batch against a copy of the store
struct Applied {
    store: EntityStore,
    outcomes: Vec<(Entity, Option<EntityId>)>,
    summary: CommitSummary,
}

#[derive(Debug)]
struct EmbeddedState {
    published: Arc<GraphMetadata>,
    factory: GraphObjectFactory,
    staged: Vec<(Operation, Entity)>,
    store: EntityStore,
}

impl EmbeddedState {
    fn refresh(&mut self) {
        if Arc::ptr_eq(&self.published, self.factory.metadata()) {
            debug!("Graph metadata already current");
            return;
        }
        self.factory = self.factory.with_metadata(Arc::clone(&self.published));
        info!(
            "Refreshed graph metadata: {} node types, {} edge types",
            self.published.node_type_count(),
            self.published.edge_type_count()
        );
    }

    fn stage(&mut self, op: Operation, entity: Entity) {
        debug!("Staged {:?} of {} {}", op, entity.kind(), entity.virtual_id());
        self.staged.push((op, entity));
    }

    fn commit(&mut self) -> ConnectionResult<CommitSummary> {
        let batch = std::mem::take(&mut self.staged);
        let applied = match self.apply(&batch) {
            Ok(applied) => applied,
            Err(e) => {
                warn!("Commit of {} staged operations failed: {}", batch.len(), e);
                return Err(e);
            }
        };

        self.store = applied.store;
        for (entity, outcome) in applied.outcomes {
            match outcome {
                Some(id) => entity.mark_committed(id),
                None => entity.mark_deleted(),
            }
        }

        let summary = applied.summary;
        info!(
            "Committed {} inserted, {} updated, {} deleted",
            summary.inserted, summary.updated, summary.deleted
        );
        Ok(summary)
    }

    /// Validate and apply `batch` to a copy of the store. Nothing is
    /// changed unless every operation succeeds.
    fn apply(&self, batch: &[(Operation, Entity)]) -> ConnectionResult<Applied> {
        let mut next = self.store.clone();

        let mut assigned: FxHashMap<VirtualId, EntityId> = FxHashMap::default();
        for (_, entity) in batch.iter().filter(|(op, _)| *op == Operation::Insert) {
            if entity.entity_id().is_some() || assigned.contains_key(&entity.virtual_id()) {
                return Err(ConnectionError::AlreadyCommitted(entity.virtual_id()));
            }
            assigned.insert(entity.virtual_id(), next.allocate_id());
        }
        let id_of = |entity: &Entity| {
            entity
                .entity_id()
                .or_else(|| assigned.get(&entity.virtual_id()).copied())
        };
        let unknown = |entity: &Entity| {
            ConnectionError::UnknownEntity(format!("{} {}", entity.kind(), entity.virtual_id()))
        };

        let mut new_edges = Vec::new();
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut summary = CommitSummary::default();

        for (op, entity) in batch {
            match op {
                Operation::Insert => {
                    let id = id_of(entity).ok_or_else(|| unknown(entity))?;
                    let mut record = StoredEntity::capture(entity)?;
                    record.version = 1;
                    if let Entity::Edge(edge) = entity {
                        let endpoints = resolve_endpoints(edge, &assigned, &next.committed)?;
                        record.endpoints = Some(endpoints);
                        new_edges.push((id, edge.virtual_id(), endpoints));
                    }
                    next.put(id, record)?;
                    next.committed.insert(entity.virtual_id(), id);
                    summary.inserted += 1;
                    outcomes.push((entity.clone(), Some(id)));
                }
                Operation::Update => {
                    let id = id_of(entity).ok_or_else(|| unknown(entity))?;
                    let previous = next.entities.get(&id).ok_or_else(|| unknown(entity))?;
                    let mut record = StoredEntity::capture(entity)?;
                    record.version = previous.version + 1;
                    record.endpoints = previous.endpoints;
                    next.put(id, record)?;
                    next.committed.insert(entity.virtual_id(), id);
                    summary.updated += 1;
                    outcomes.push((entity.clone(), Some(id)));
                }
                Operation::Delete => {
                    match id_of(entity) {
                        Some(id) => {
                            next.remove(id).ok_or_else(|| unknown(entity))?;
                            summary.deleted += 1;
                        }
                        None => warn!(
                            "Deleting {} {} which was never committed",
                            entity.kind(),
                            entity.virtual_id()
                        ),
                    }
                    outcomes.push((entity.clone(), None));
                }
            }
        }

        for (edge_id, edge_vid, (from, to)) in new_edges {
            if !next.entities.contains_key(&edge_id) {
                continue;
            }
            if !next.entities.contains_key(&from) || !next.entities.contains_key(&to) {
                return Err(ConnectionError::UnresolvedEndpoint(edge_vid));
            }
            next.link(edge_id, from, to);
        }

        Ok(Applied {
            store: next,
            outcomes,
            summary,
        })
    }

    fn fetch(&self, key: &CompositeKey, options: &FetchOptions) -> ConnectionResult<Option<Entity>> {
        let Some(root_id) = self.store.find(key)? else {
            debug!("No entity for key {}", key);
            return Ok(None);
        };

        let root = self.materialize_node(root_id)?;
        if options.traversal_depth > 0 {
            self.expand(root_id, &root, options)?;
        }
        debug!("Fetched {} for key {}", root_id, key);
        Ok(Some(Entity::Node(root)))
    }

    /// Build a fresh, clean entity from the stored copy
    fn materialize(&self, id: EntityId) -> ConnectionResult<Entity> {
        let record = self
            .store
            .entities
            .get(&id)
            .ok_or_else(|| ConnectionError::UnknownEntity(id.to_string()))?;
        let metadata = self.factory.metadata();
        let type_name = record.type_name.as_deref();

        let entity = self.factory.create_entity(record.kind);
        match &entity {
            Entity::Node(node) => {
                if let Some(node_type) = type_name.and_then(|n| metadata.node_type(n)) {
                    node.set_node_type(Arc::clone(node_type))?;
                }
            }
            Entity::Edge(edge) => match type_name.and_then(|n| metadata.edge_type(n)) {
                Some(edge_type) => edge.set_edge_type(Arc::clone(edge_type))?,
                None => edge.set_direction(record.direction),
            },
            Entity::Graph(graph) => graph.set_name(record.name.clone().unwrap_or_default()),
        }
        for (name, value) in &record.attributes {
            entity.set_attribute(name, value.clone())?;
        }
        entity.core_mut().load_committed(id, record.version);
        Ok(entity)
    }

    fn materialize_node(&self, id: EntityId) -> ConnectionResult<Node> {
        self.materialize(id)?
            .into_node()
            .ok_or_else(|| ConnectionError::UnknownEntity(format!("{} is not a node", id)))
    }

    fn materialize_edge(&self, id: EntityId) -> ConnectionResult<Edge> {
        self.materialize(id)?
            .into_edge()
            .ok_or_else(|| ConnectionError::UnknownEntity(format!("{} is not an edge", id)))
    }

    /// Materialize the neighborhood of `root` breadth first, one edge hop
    /// per level of traversal depth
    fn expand(&self, root_id: EntityId, root: &Node, options: &FetchOptions) -> ConnectionResult<()> {
        let unlimited = |n: usize| if n == 0 { usize::MAX } else { n };
        let node_limit = unlimited(options.fetch_size);
        let edge_limit = unlimited(options.edge_limit);

        let mut nodes: FxHashMap<EntityId, Node> = FxHashMap::default();
        nodes.insert(root_id, root.clone());
        let mut seen_edges: FxHashSet<EntityId> = FxHashSet::default();
        let mut frontier = vec![root_id];

        for _ in 0..options.traversal_depth {
            let mut next_frontier = Vec::new();
            for node_id in frontier {
                let incident = self.store.adjacency.get(&node_id).map(Vec::as_slice).unwrap_or_default();
                for &edge_id in incident.iter().take(edge_limit) {
                    if seen_edges.contains(&edge_id) {
                        continue;
                    }
                    let Some((from_id, to_id)) = self.store.entities.get(&edge_id).and_then(|r| r.endpoints) else {
                        continue;
                    };

                    let mut unseen: Vec<EntityId> = [from_id, to_id]
                        .into_iter()
                        .filter(|id| !nodes.contains_key(id))
                        .collect();
                    unseen.dedup();
                    if nodes.len() + unseen.len() > node_limit {
                        continue;
                    }
                    for id in unseen {
                        nodes.insert(id, self.materialize_node(id)?);
                        next_frontier.push(id);
                    }

                    let edge = self.materialize_edge(edge_id)?;
                    let (Some(from), Some(to)) = (nodes.get(&from_id), nodes.get(&to_id)) else {
                        continue;
                    };
                    edge.connect(from, to);
                    from.attach_edge(&edge);
                    if from_id != to_id {
                        to.attach_edge(&edge);
                    }
                    seen_edges.insert(edge_id);
                }
            }
            frontier = next_frontier;
        }

        nodes.remove(&root_id);
        root.retain_neighborhood(nodes.into_values().collect());
        Ok(())
    }
}

/// Durable ids of an edge's endpoints: about to be inserted by the same
/// commit, or committed earlier. An endpoint whose handle was dropped is
/// still found through its virtual id.
fn resolve_endpoints(
    edge: &Edge,
    assigned: &FxHashMap<VirtualId, EntityId>,
    committed: &FxHashMap<VirtualId, EntityId>,
) -> ConnectionResult<(EntityId, EntityId)> {
    let unresolved = || ConnectionError::UnresolvedEndpoint(edge.virtual_id());
    let (from_vid, to_vid) = edge.vertices().ok_or_else(unresolved)?;
    let resolve = |vid: VirtualId, node: Option<Node>| {
        assigned
            .get(&vid)
            .copied()
            .or_else(|| node.and_then(|n| n.entity_id()))
            .or_else(|| committed.get(&vid).copied())
    };
    let from = resolve(from_vid, edge.from()).ok_or_else(unresolved)?;
    let to = resolve(to_vid, edge.to()).ok_or_else(unresolved)?;
    Ok((from, to))
}

/// In-process connection holding committed entities in memory.
///
/// Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct EmbeddedConnection {
    state: Arc<Mutex<EmbeddedState>>,
}

impl EmbeddedConnection {
    /// Create a connection serving `metadata` with the default config
    pub fn new(metadata: GraphMetadata) -> Self {
        Self::with_config(metadata, ModelConfig::default())
    }

    pub fn with_config(metadata: GraphMetadata, config: ModelConfig) -> Self {
        let metadata = Arc::new(metadata);
        let factory = GraphObjectFactory::with_config(Arc::clone(&metadata), config);
        Self {
            state: Arc::new(Mutex::new(EmbeddedState {
                published: metadata,
                factory,
                staged: Vec::new(),
                store: EntityStore::default(),
            })),
        }
    }

    pub fn from_schema(document: &SchemaDocument, config: ModelConfig) -> ConnectionResult<Self> {
        let metadata = document.into_metadata(&config)?;
        Ok(Self::with_config(metadata, config))
    }

    pub fn from_schema_json(json: &str, config: ModelConfig) -> ConnectionResult<Self> {
        let document =
            SchemaDocument::from_json_str(json).map_err(|e| ConnectionError::SchemaDocument(e.to_string()))?;
        Self::from_schema(&document, config)
    }

    pub fn from_schema_yaml(yaml: &str, config: ModelConfig) -> ConnectionResult<Self> {
        let document =
            SchemaDocument::from_yaml_str(yaml).map_err(|e| ConnectionError::SchemaDocument(e.to_string()))?;
        Self::from_schema(&document, config)
    }

    /// Publish a new schema. Callers see it after
    /// `get_graph_metadata(true)`.
    pub async fn publish_metadata(&self, metadata: GraphMetadata) {
        let mut state = self.state.lock().await;
        state.published = Arc::new(metadata);
        info!("Published new graph metadata");
    }

    /// Drop everything staged since the last commit; returns how many
    /// operations were dropped
    pub async fn rollback(&self) -> usize {
        let mut state = self.state.lock().await;
        let dropped = std::mem::take(&mut state.staged).len();
        debug!("Rolled back {} staged operations", dropped);
        dropped
    }

    pub async fn staged_count(&self) -> usize {
        self.state.lock().await.staged.len()
    }

    /// Number of committed entities
    pub async fn entity_count(&self) -> usize {
        self.state.lock().await.store.entities.len()
    }
}

#[async_trait]
impl Connection for EmbeddedConnection {
    async fn get_graph_metadata(&self, refresh: bool) -> ConnectionResult<Arc<GraphMetadata>> {
        let mut state = self.state.lock().await;
        if refresh {
            state.refresh();
        }
        Ok(Arc::clone(state.factory.metadata()))
    }

    async fn insert_entity(&self, entity: Entity) -> ConnectionResult<()> {
        self.state.lock().await.stage(Operation::Insert, entity);
        Ok(())
    }

    async fn update_entity(&self, entity: Entity) -> ConnectionResult<()> {
        self.state.lock().await.stage(Operation::Update, entity);
        Ok(())
    }

    async fn delete_entity(&self, entity: Entity) -> ConnectionResult<()> {
        self.state.lock().await.stage(Operation::Delete, entity);
        Ok(())
    }

    async fn commit(&self) -> ConnectionResult<CommitSummary> {
        self.state.lock().await.commit()
    }

    async fn get_entity(&self, key: &CompositeKey, options: &FetchOptions) -> ConnectionResult<Option<Entity>> {
        self.state.lock().await.fetch(key, options)
    }

    async fn object_factory(&self) -> ConnectionResult<GraphObjectFactory> {
        Ok(self.state.lock().await.factory.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EntityState;

    const SCHEMA: &str = r#"
attributes:
  - { id: 1, name: name, type: string }
  - { id: 2, name: age, type: integer }
node_types:
  - { id: 10, name: Person, attributes: [name, age], primary_key: [name] }
edge_types:
  - { id: 20, name: KNOWS, direction: Directed, from: Person, to: Person }
"#;

    fn connection() -> EmbeddedConnection {
        EmbeddedConnection::from_schema_yaml(SCHEMA, ModelConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_commit_assigns_durable_ids() {
        let conn = connection();
        let factory = conn.object_factory().await.unwrap();
        let p = factory.create_node_of_type_named("Person").unwrap();
        p.set_attribute("name", "john").unwrap();

        conn.insert_entity(p.clone().into()).await.unwrap();
        let summary = conn.commit().await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(p.state(), EntityState::Clean);
        assert_eq!(p.entity_id(), Some(EntityId(1)));
        assert!(p.virtual_id() < VirtualId(0));
        assert_eq!(conn.staged_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_changes() {
        let conn = connection();
        let factory = conn.object_factory().await.unwrap();
        let p = factory.create_node_of_type_named("Person").unwrap();
        p.set_attribute("age", 3).unwrap();

        conn.insert_entity(p.clone().into()).await.unwrap();
        let err = conn.commit().await.unwrap_err();
        assert!(matches!(err, ConnectionError::MissingKey { ref attribute, .. } if attribute == "name"));
        assert_eq!(p.state(), EntityState::New);
        assert_eq!(p.entity_id(), None);
        assert_eq!(conn.staged_count().await, 0);
        assert_eq!(conn.entity_count().await, 0);
    }

    #[tokio::test]
    async fn test_nan_key_is_found_and_unique() {
        let yaml = "attributes:\n  - { id: 1, name: reading, type: Double }\n\
                    node_types:\n  - { id: 10, name: Sample, attributes: [reading], primary_key: [reading] }\n";
        let conn = EmbeddedConnection::from_schema_yaml(yaml, ModelConfig::default()).unwrap();
        let factory = conn.object_factory().await.unwrap();
        let sample = |reading: f64| {
            let node = factory.create_node_of_type_named("Sample").unwrap();
            node.set_attribute("reading", reading).unwrap();
            node
        };

        let nan = sample(f64::NAN);
        conn.insert_entity(nan.clone().into()).await.unwrap();
        conn.commit().await.unwrap();

        let mut key = factory.create_composite_key("Sample").unwrap();
        key.set_attribute("reading", f64::NAN).unwrap();
        let found = conn.get_entity(&key, &FetchOptions::node_only()).await.unwrap().unwrap();
        assert_eq!(found.entity_id(), nan.entity_id());

        conn.insert_entity(sample(-f64::NAN).into()).await.unwrap();
        assert!(matches!(
            conn.commit().await.unwrap_err(),
            ConnectionError::DuplicateKey { ref type_name, .. } if type_name == "Sample"
        ));
        assert_eq!(conn.entity_count().await, 1);
    }

    #[test]
    fn test_key_value_equality() {
        use crate::graph::Decimal;
        use std::collections::hash_map::DefaultHasher;
        let hash = |v: &KeyValue| {
            let mut hasher = DefaultHasher::new();
            v.hash(&mut hasher);
            hasher.finish()
        };

        let short = KeyValue(AttributeValue::Number(Decimal::new(15, 1)));
        let wide = KeyValue(AttributeValue::Number(Decimal::new(150_000, 5)));
        assert_eq!(short, wide);
        assert_eq!(hash(&short), hash(&wide));

        let nans = KeyValue(AttributeValue::Array(vec![AttributeValue::Float(f32::NAN)]));
        assert_eq!(nans, nans.clone());
        assert_ne!(KeyValue(AttributeValue::Long(1)), KeyValue(AttributeValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_rollback_drops_staged() {
        let conn = connection();
        let factory = conn.object_factory().await.unwrap();
        conn.insert_entity(factory.create_node().into()).await.unwrap();
        assert_eq!(conn.rollback().await, 1);
        assert_eq!(conn.commit().await.unwrap(), CommitSummary::default());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_published_schema() {
        let conn = connection();
        let before = conn.get_graph_metadata(false).await.unwrap();
        assert!(before.node_type("Company").is_none());

        let doc = SchemaDocument::from_yaml_str("node_types:\n  - { name: Company }\n").unwrap();
        conn.publish_metadata(doc.into_metadata(&ModelConfig::default()).unwrap()).await;

        let cached = conn.get_graph_metadata(false).await.unwrap();
        assert!(Arc::ptr_eq(&before, &cached));
        let fresh = conn.get_graph_metadata(true).await.unwrap();
        assert!(fresh.node_type("Company").is_some());
    }
}
