//! Edge types, direction kinds and the edge type builder

use super::attribute::AttributeDescriptor;
use super::node_type::{AttributeMap, EntityTypeId, NodeType};
use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether an edge is directed, undirected or bidirectional.
///
/// Discriminants match the server's direction ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionKind {
    #[default]
    Undirected = 0,
    Directed = 1,
    Bidirectional = 2,
}

impl DirectionKind {
    pub fn as_value(&self) -> i32 {
        *self as i32
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(DirectionKind::Undirected),
            1 => Some(DirectionKind::Directed),
            2 => Some(DirectionKind::Bidirectional),
            _ => None,
        }
    }

    /// Parse a direction name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "undirected" => Some(DirectionKind::Undirected),
            "directed" => Some(DirectionKind::Directed),
            "bidirectional" => Some(DirectionKind::Bidirectional),
            _ => None,
        }
    }
}

impl fmt::Display for DirectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DirectionKind::Undirected => "Undirected",
            DirectionKind::Directed => "Directed",
            DirectionKind::Bidirectional => "Bidirectional",
        };
        write!(f, "{}", name)
    }
}

/// Immutable edge type with endpoint constraints
#[derive(Debug, Clone)]
pub struct EdgeType {
    id: EntityTypeId,
    name: String,
    parent: Option<Arc<EdgeType>>,
    direction: DirectionKind,
    from_node_type: Option<Arc<NodeType>>,
    to_node_type: Option<Arc<NodeType>>,
    attributes: AttributeMap,
}

impl EdgeType {
    pub fn builder(name: impl Into<String>, direction: DirectionKind) -> EdgeTypeBuilder {
        EdgeTypeBuilder::new(name, direction)
    }

    /// Build a type strictly from authoritative lists.
    ///
    /// The endpoint types are stored as given; checking them against a
    /// metadata snapshot is up to the caller.
    pub fn from_descriptors<A, D>(
        name: impl Into<String>,
        direction: DirectionKind,
        parent: Option<Arc<EdgeType>>,
        attributes: A,
        from_node_type: Option<Arc<NodeType>>,
        to_node_type: Option<Arc<NodeType>>,
    ) -> ModelResult<EdgeType>
    where
        A: IntoIterator<Item = D>,
        D: Into<Arc<AttributeDescriptor>>,
    {
        let mut builder = EdgeTypeBuilder::new(name, direction);
        if let Some(parent) = parent {
            builder = builder.parent(parent);
        }
        builder
            .with_attributes(attributes)
            .endpoints(from_node_type, to_node_type)
            .build()
    }

    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<EdgeType>> {
        self.parent.as_ref()
    }

    pub fn direction(&self) -> DirectionKind {
        self.direction
    }

    pub fn from_node_type(&self) -> Option<&Arc<NodeType>> {
        self.from_node_type.as_ref()
    }

    pub fn to_node_type(&self) -> Option<&Arc<NodeType>> {
        self.to_node_type.as_ref()
    }

    pub fn attribute(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Arc<AttributeDescriptor>> {
        self.attributes.values()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from_node_type.as_ref().map_or("*", |t| t.name());
        let to = self.to_node_type.as_ref().map_or("*", |t| t.name());
        write!(f, "EdgeType({}: {} -> {}, {})", self.name, from, to, self.direction)
    }
}

/// Builder producing an immutable [`EdgeType`].
///
/// Same replacement rules as the node type builder: `parent` merges,
/// `with_attributes` replaces.
#[derive(Debug, Clone)]
pub struct EdgeTypeBuilder {
    id: EntityTypeId,
    name: String,
    parent: Option<Arc<EdgeType>>,
    direction: DirectionKind,
    from_node_type: Option<Arc<NodeType>>,
    to_node_type: Option<Arc<NodeType>>,
    attributes: AttributeMap,
}

impl EdgeTypeBuilder {
    pub fn new(name: impl Into<String>, direction: DirectionKind) -> Self {
        EdgeTypeBuilder {
            id: EntityTypeId::default(),
            name: name.into(),
            parent: None,
            direction,
            from_node_type: None,
            to_node_type: None,
            attributes: AttributeMap::new(),
        }
    }

    pub fn id(mut self, id: impl Into<EntityTypeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Derive from `parent`; own attributes with the same name win
    pub fn parent(mut self, parent: Arc<EdgeType>) -> Self {
        let mut merged = parent.attributes.clone();
        merged.extend(self.attributes.drain(..));
        self.attributes = merged;
        self.parent = Some(parent);
        self
    }

    pub fn endpoints(mut self, from: Option<Arc<NodeType>>, to: Option<Arc<NodeType>>) -> Self {
        self.from_node_type = from;
        self.to_node_type = to;
        self
    }

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

    pub fn build(self) -> ModelResult<EdgeType> {
        if self.name.is_empty() {
            return Err(ModelError::invalid_schema("edge type name cannot be empty"));
        }

        Ok(EdgeType {
            id: self.id,
            name: self.name,
            parent: self.parent,
            direction: self.direction,
            from_node_type: self.from_node_type,
            to_node_type: self.to_node_type,
            attributes: self.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;

    fn node_type(name: &str) -> Arc<NodeType> {
        Arc::new(NodeType::builder(name).build().unwrap())
    }

    #[test]
    fn test_direction_values() {
        assert_eq!(DirectionKind::Undirected.as_value(), 0);
        assert_eq!(DirectionKind::Directed.as_value(), 1);
        assert_eq!(DirectionKind::Bidirectional.as_value(), 2);
        assert_eq!(DirectionKind::from_value(1), Some(DirectionKind::Directed));
        assert_eq!(DirectionKind::from_value(7), None);
        assert_eq!(DirectionKind::from_name("BIDIRECTIONAL"), Some(DirectionKind::Bidirectional));
    }

    #[test]
    fn test_from_descriptors_stores_endpoints_verbatim() {
        let person = node_type("Person");
        let company = node_type("Company");
        let since = AttributeDescriptor::with_id(20, "since", AttributeType::Date);

        let works_at = EdgeType::from_descriptors(
            "WORKS_AT",
            DirectionKind::Directed,
            None,
            vec![since],
            Some(Arc::clone(&person)),
            Some(Arc::clone(&company)),
        )
        .unwrap();

        assert_eq!(works_at.direction(), DirectionKind::Directed);
        assert_eq!(works_at.from_node_type().unwrap().name(), "Person");
        assert_eq!(works_at.to_node_type().unwrap().name(), "Company");
        assert_eq!(works_at.attribute_names().collect::<Vec<_>>(), vec!["since"]);
        assert_eq!(
            format!("{}", works_at),
            "EdgeType(WORKS_AT: Person -> Company, Directed)"
        );
    }

    #[test]
    fn test_replacement_discards_parent_attributes() {
        let weight = AttributeDescriptor::with_id(21, "weight", AttributeType::Double);
        let base = Arc::new(
            EdgeType::builder("LINK", DirectionKind::Undirected)
                .attribute(weight)
                .build()
                .unwrap(),
        );

        let inherited = EdgeType::builder("SOFT_LINK", DirectionKind::Undirected)
            .parent(Arc::clone(&base))
            .build()
            .unwrap();
        assert!(inherited.has_attribute("weight"));

        let label = AttributeDescriptor::with_id(22, "label", AttributeType::String);
        let replaced = EdgeType::from_descriptors(
            "HARD_LINK",
            DirectionKind::Bidirectional,
            Some(base),
            vec![label],
            None,
            None,
        )
        .unwrap();
        assert_eq!(replaced.attribute_names().collect::<Vec<_>>(), vec!["label"]);
        assert_eq!(replaced.parent().unwrap().name(), "LINK");
        assert!(replaced.from_node_type().is_none());
    }
}
