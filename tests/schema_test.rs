//! Integration tests for schema construction
//!
//! Builder replacement semantics, metadata snapshots and schema documents.

use graph_model::schema::{DirectionKind, EdgeTypeBuilder, EntityTypeId, NodeTypeBuilder};
use graph_model::{
    AttributeDescriptor, AttributeType, EdgeType, GraphMetadata, ModelConfig, ModelError, NodeType, SchemaDocument,
};
use std::sync::Arc;

fn descriptors() -> (AttributeDescriptor, AttributeDescriptor, AttributeDescriptor) {
    (
        AttributeDescriptor::with_id(1, "name", AttributeType::String),
        AttributeDescriptor::with_id(2, "age", AttributeType::Integer),
        AttributeDescriptor::with_id(3, "email", AttributeType::String),
    )
}

#[test]
fn test_node_builder_replaces_not_merges() {
    let (name, age, email) = descriptors();
    let base = Arc::new(NodeType::from_descriptors("Base", vec![email.clone()], [&email]).unwrap());

    let person = NodeTypeBuilder::new("Person")
        .parent(base)
        .with_attributes(vec![name.clone(), age.clone()])
        .with_primary_key([&name])
        .build()
        .unwrap();

    assert_eq!(person.attribute_names().collect::<Vec<_>>(), vec!["name", "age"]);
    assert_eq!(person.primary_key_names().collect::<Vec<_>>(), vec!["name"]);
    assert!(!person.has_attribute("email"));
}

#[test]
fn test_empty_lists_yield_empty_sets() {
    let (_, _, email) = descriptors();
    let base = Arc::new(NodeType::from_descriptors("Base", vec![email.clone()], [&email]).unwrap());

    let bare = NodeTypeBuilder::new("Bare")
        .parent(base)
        .with_attributes(Vec::<AttributeDescriptor>::new())
        .with_primary_key(Vec::<AttributeDescriptor>::new())
        .build()
        .unwrap();
    assert_eq!(bare.attribute_count(), 0);
    assert_eq!(bare.primary_key_len(), 0);
}

#[test]
fn test_primary_key_outside_attributes_rejected() {
    let (name, age, _) = descriptors();
    let err = NodeType::from_descriptors("Person", vec![age], [&name]).unwrap_err();
    assert!(matches!(err, ModelError::InvalidSchema(_)));
}

#[test]
fn test_edge_builder_stores_endpoints_verbatim() {
    let (name, _, email) = descriptors();
    let person = Arc::new(NodeType::from_descriptors("Person", vec![name.clone()], [&name]).unwrap());
    let base = Arc::new(EdgeType::builder("RELATED", DirectionKind::Undirected).attribute(email).build().unwrap());
    let since = AttributeDescriptor::with_id(4, "since", AttributeType::Date);

    let knows = EdgeType::from_descriptors(
        "KNOWS",
        DirectionKind::Directed,
        Some(base),
        vec![since],
        Some(Arc::clone(&person)),
        Some(person),
    )
    .unwrap();

    assert_eq!(knows.attribute_names().collect::<Vec<_>>(), vec!["since"]);
    assert_eq!(knows.parent().unwrap().name(), "RELATED");
    assert_eq!(knows.direction(), DirectionKind::Directed);
    assert_eq!(knows.from_node_type().unwrap().name(), "Person");
    assert_eq!(knows.to_node_type().unwrap().name(), "Person");

    let loose = EdgeTypeBuilder::new("LINK", DirectionKind::Bidirectional).build().unwrap();
    assert!(loose.from_node_type().is_none());
}

#[test]
fn test_metadata_lookups() {
    let (name, _, _) = descriptors();
    let person = NodeType::builder("Person")
        .id(10)
        .attribute(name.clone())
        .primary_key("name")
        .build()
        .unwrap();
    let knows = EdgeType::builder("KNOWS", DirectionKind::Directed).id(20).build().unwrap();
    let metadata = GraphMetadata::new(vec![person], vec![knows]);

    assert_eq!(metadata.node_type("Person").unwrap().id(), EntityTypeId(10));
    assert!(metadata.node_type("KNOWS").is_none());
    assert_eq!(metadata.edge_type_by_id(EntityTypeId(20)).unwrap().name(), "KNOWS");
    assert!(matches!(
        metadata.require_edge_type("LIKES"),
        Err(ModelError::TypeNotFound(_))
    ));
    assert_eq!(metadata.attribute_descriptor("name").unwrap().id(), name.id());
}

#[test]
fn test_yaml_schema_document() {
    let yaml = r#"
attributes:
  - { id: 1, name: name, type: String }
  - { id: 2, name: price, type: Number }
  - { id: 3, name: tags, type: String, is_array: true }
node_types:
  - { id: 10, name: Product, attributes: [name, price, tags], primary_key: [name] }
  - { id: 11, name: Book, parent: Product }
edge_types:
  - { id: 20, name: SIMILAR, direction: Bidirectional, from: Product, to: Product }
"#;
    let config = ModelConfig::from_yaml_str("number_precision: 8\nnumber_scale: 2\n").unwrap();
    let metadata = SchemaDocument::from_yaml_str(yaml).unwrap().into_metadata(&config).unwrap();

    let book = metadata.node_type("Book").unwrap();
    assert_eq!(book.attribute_names().collect::<Vec<_>>(), vec!["name", "price", "tags"]);
    assert_eq!(book.primary_key_names().collect::<Vec<_>>(), vec!["name"]);
    assert_eq!(book.attribute("price").unwrap().precision(), Some(8));
    assert!(book.attribute("tags").unwrap().is_array());

    let similar = metadata.edge_type("SIMILAR").unwrap();
    assert_eq!(similar.direction(), DirectionKind::Bidirectional);
    assert_eq!(similar.to_node_type().unwrap().name(), "Product");
}

#[test]
fn test_document_with_unknown_parent_rejected() {
    let json = r#"{"node_types": [{"name": "Book", "parent": "Product"}]}"#;
    let err = SchemaDocument::from_json_str(json)
        .unwrap()
        .into_metadata(&ModelConfig::default())
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidSchema(_)));
}
