//! Integration tests for the embedded connection
//!
//! Commit lifecycle, key uniqueness, atomic failure, endpoint resolution and
//! fetch-by-key with traversal depth.

use graph_model::{
    Connection, ConnectionError, EmbeddedConnection, Entity, EntityId, EntityState, FetchOptions, GraphObject,
    KeyValidation, ModelConfig, ModelError, Node,
};

const SCHEMA: &str = r#"
attributes:
  - { id: 1, name: name, type: String }
  - { id: 2, name: age, type: Integer }
  - { id: 3, name: since, type: Integer }
node_types:
  - { id: 10, name: Person, attributes: [name, age], primary_key: [name] }
edge_types:
  - { id: 20, name: KNOWS, direction: Directed, from: Person, to: Person, attributes: [since] }
"#;

fn connection() -> EmbeddedConnection {
    EmbeddedConnection::from_schema_yaml(SCHEMA, ModelConfig::default()).unwrap()
}

async fn person(conn: &EmbeddedConnection, name: &str, age: i32) -> Node {
    let factory = conn.object_factory().await.unwrap();
    let node = factory.create_node_of_type_named("Person").unwrap();
    node.set_attribute("name", name).unwrap();
    node.set_attribute("age", age).unwrap();
    node
}

#[tokio::test]
async fn test_insert_commit_and_fetch() {
    let conn = connection();
    let john = person(&conn, "john", 40).await;
    let virtual_id = john.virtual_id();

    conn.insert_entity(john.clone().into()).await.unwrap();
    assert_eq!(john.state(), EntityState::New);
    let summary = conn.commit().await.unwrap();
    assert_eq!(summary.total(), 1);
    assert_eq!(john.state(), EntityState::Clean);
    assert_eq!(john.virtual_id(), virtual_id);
    assert_eq!(john.version(), 1);

    let factory = conn.object_factory().await.unwrap();
    let mut key = factory.create_composite_key("Person").unwrap();
    key.set_attribute("name", "john").unwrap();

    let fetched = conn
        .get_entity(&key, &FetchOptions::node_only())
        .await
        .unwrap()
        .unwrap()
        .into_node()
        .unwrap();
    assert_eq!(fetched.entity_id(), john.entity_id());
    assert_ne!(fetched.virtual_id(), john.virtual_id());
    assert_eq!(fetched.state(), EntityState::Clean);
    assert_eq!(fetched.get_attribute("age").unwrap().unwrap().as_i64(), Some(40));
    assert_eq!(fetched.type_name().as_deref(), Some("Person"));

    key.set_attribute("name", "mary").unwrap();
    assert!(conn.get_entity(&key, &FetchOptions::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_bumps_version() {
    let conn = connection();
    let john = person(&conn, "john", 40).await;
    conn.insert_entity(john.clone().into()).await.unwrap();
    conn.commit().await.unwrap();

    john.set_attribute("age", 41).unwrap();
    assert_eq!(john.state(), EntityState::Modified);
    conn.update_entity(john.clone().into()).await.unwrap();
    let summary = conn.commit().await.unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(john.state(), EntityState::Clean);
    assert_eq!(john.version(), 2);
    assert!(john.modified_attributes().is_empty());
}

#[tokio::test]
async fn test_duplicate_key_fails_atomically() {
    let conn = connection();
    let first = person(&conn, "john", 40).await;
    conn.insert_entity(first.into()).await.unwrap();
    conn.commit().await.unwrap();

    let mary = person(&conn, "mary", 30).await;
    let dup = person(&conn, "john", 50).await;
    conn.insert_entity(mary.clone().into()).await.unwrap();
    conn.insert_entity(dup.clone().into()).await.unwrap();

    let err = conn.commit().await.unwrap_err();
    assert!(matches!(err, ConnectionError::DuplicateKey { ref type_name, .. } if type_name == "Person"));
    assert_eq!(mary.state(), EntityState::New);
    assert_eq!(mary.entity_id(), None);
    assert_eq!(dup.state(), EntityState::New);
    assert_eq!(conn.entity_count().await, 1);
    assert_eq!(conn.staged_count().await, 0);

    // the same objects can be restaged once fixed
    dup.set_attribute("name", "jack").unwrap();
    conn.insert_entity(mary.clone().into()).await.unwrap();
    conn.insert_entity(dup.clone().into()).await.unwrap();
    assert_eq!(conn.commit().await.unwrap().inserted, 2);
    assert_eq!(mary.state(), EntityState::Clean);
}

#[tokio::test]
async fn test_edge_endpoints_must_resolve() {
    let conn = connection();
    let factory = conn.object_factory().await.unwrap();
    let john = person(&conn, "john", 40).await;
    let mary = person(&conn, "mary", 30).await;
    let knows = factory.create_edge_of_type_named(&john, &mary, "KNOWS").unwrap();

    conn.insert_entity(john.clone().into()).await.unwrap();
    conn.insert_entity(knows.clone().into()).await.unwrap();
    let err = conn.commit().await.unwrap_err();
    assert!(matches!(err, ConnectionError::UnresolvedEndpoint(vid) if vid == knows.virtual_id()));
    assert_eq!(john.state(), EntityState::New);

    conn.insert_entity(knows.clone().into()).await.unwrap();
    conn.insert_entity(john.clone().into()).await.unwrap();
    conn.insert_entity(mary.clone().into()).await.unwrap();
    let summary = conn.commit().await.unwrap();
    assert_eq!(summary.inserted, 3);
    assert!(knows.entity_id().is_some());
}

#[tokio::test]
async fn test_edge_to_dropped_committed_endpoint() {
    let conn = connection();
    let factory = conn.object_factory().await.unwrap();
    let a = person(&conn, "a", 1).await;
    let b = person(&conn, "b", 2).await;
    conn.insert_entity(a.clone().into()).await.unwrap();
    conn.insert_entity(b.clone().into()).await.unwrap();
    conn.commit().await.unwrap();

    let knows = factory.create_edge_of_type_named(&a, &b, "KNOWS").unwrap();
    let late = factory.create_edge_of_type_named(&a, &b, "KNOWS").unwrap();
    drop(b);
    assert!(knows.to().is_none());

    conn.insert_entity(knows.clone().into()).await.unwrap();
    assert_eq!(conn.commit().await.unwrap().inserted, 1);
    assert_eq!(knows.entity_id(), Some(EntityId(3)));

    let mut key = factory.create_composite_key("Person").unwrap();
    key.set_attribute("name", "b").unwrap();
    let b = conn.get_entity(&key, &FetchOptions::default()).await.unwrap().unwrap();
    assert_eq!(b.as_node().unwrap().edge_count(), 1);

    // once the endpoint is deleted its old virtual id no longer resolves
    conn.delete_entity(b).await.unwrap();
    conn.commit().await.unwrap();
    conn.insert_entity(late.clone().into()).await.unwrap();
    assert!(matches!(
        conn.commit().await.unwrap_err(),
        ConnectionError::UnresolvedEndpoint(vid) if vid == late.virtual_id()
    ));
}

#[tokio::test]
async fn test_fetch_follows_traversal_depth() {
    let conn = connection();
    let factory = conn.object_factory().await.unwrap();
    let a = person(&conn, "a", 1).await;
    let b = person(&conn, "b", 2).await;
    let c = person(&conn, "c", 3).await;
    let ab = factory.create_edge_of_type_named(&a, &b, "KNOWS").unwrap();
    ab.set_attribute("since", 2001).unwrap();
    let bc = factory.create_edge_of_type_named(&b, &c, "KNOWS").unwrap();
    let aa = factory.create_edge_of_type_named(&a, &a, "KNOWS").unwrap();
    let entities: [Entity; 6] = [a.into(), b.into(), c.into(), ab.into(), bc.into(), aa.into()];
    for entity in entities {
        conn.insert_entity(entity).await.unwrap();
    }
    conn.commit().await.unwrap();

    let mut key = factory.create_composite_key("Person").unwrap();
    key.set_attribute("name", "a").unwrap();
    let fetch = |depth: usize| {
        let conn = conn.clone();
        let key = key.clone();
        async move {
            conn.get_entity(&key, &FetchOptions::default().with_traversal_depth(depth))
                .await
                .unwrap()
                .unwrap()
                .into_node()
                .unwrap()
        }
    };

    let root = fetch(0).await;
    assert_eq!(root.edge_count(), 0);

    let root = fetch(1).await;
    assert_eq!(root.edge_count(), 2);
    let neighbors: Vec<String> = root
        .neighbors()
        .iter()
        .map(|n| n.get_attribute("name").unwrap().unwrap().as_str().unwrap().to_string())
        .collect();
    assert!(neighbors.contains(&"a".to_string()));
    assert!(neighbors.contains(&"b".to_string()));
    let b = root.neighbors().into_iter().find(|n| n != &root).unwrap();
    assert_eq!(b.edge_count(), 1);
    let edge = b.edges().remove(0);
    assert_eq!(edge.get_attribute("since").unwrap().unwrap().as_i64(), Some(2001));
    assert_eq!(edge.state(), EntityState::Clean);

    let root = fetch(2).await;
    let b = root.neighbors().into_iter().find(|n| n != &root).unwrap();
    assert_eq!(b.edge_count(), 2);
}

#[tokio::test]
async fn test_delete_node_removes_its_edges() {
    let conn = connection();
    let factory = conn.object_factory().await.unwrap();
    let john = person(&conn, "john", 40).await;
    let mary = person(&conn, "mary", 30).await;
    let knows = factory.create_edge_of_type_named(&john, &mary, "KNOWS").unwrap();
    let entities: [Entity; 3] = [john.clone().into(), mary.clone().into(), knows.into()];
    for entity in entities {
        conn.insert_entity(entity).await.unwrap();
    }
    conn.commit().await.unwrap();
    assert_eq!(conn.entity_count().await, 3);

    conn.delete_entity(mary.clone().into()).await.unwrap();
    let summary = conn.commit().await.unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(mary.state(), EntityState::Deleted);
    assert_eq!(conn.entity_count().await, 1);

    let mut key = factory.create_composite_key("Person").unwrap();
    key.set_attribute("name", "john").unwrap();
    let root = conn.get_entity(&key, &FetchOptions::default()).await.unwrap().unwrap();
    assert_eq!(root.as_node().unwrap().edge_count(), 0);
}

#[tokio::test]
async fn test_second_insert_is_rejected() {
    let conn = connection();
    let john = person(&conn, "john", 40).await;
    conn.insert_entity(john.clone().into()).await.unwrap();
    conn.insert_entity(john.clone().into()).await.unwrap();
    assert!(matches!(
        conn.commit().await.unwrap_err(),
        ConnectionError::AlreadyCommitted(_)
    ));

    conn.insert_entity(john.clone().into()).await.unwrap();
    conn.commit().await.unwrap();
    assert_eq!(john.entity_id(), Some(EntityId(1)));

    conn.insert_entity(john.into()).await.unwrap();
    assert!(matches!(
        conn.commit().await.unwrap_err(),
        ConnectionError::AlreadyCommitted(_)
    ));
}

#[tokio::test]
async fn test_key_lookup_requires_primary_key() {
    let conn = connection();
    let john = person(&conn, "john", 40).await;
    conn.insert_entity(john.into()).await.unwrap();
    conn.commit().await.unwrap();

    let factory = conn.object_factory().await.unwrap();
    let empty = factory.create_composite_key("Person").unwrap();
    assert!(matches!(
        conn.get_entity(&empty, &FetchOptions::default()).await,
        Err(ConnectionError::MissingKey { .. })
    ));

    let declared = EmbeddedConnection::from_schema_yaml(
        SCHEMA,
        ModelConfig::default().with_key_validation(KeyValidation::Declared),
    )
    .unwrap();
    let john = person(&declared, "john", 40).await;
    declared.insert_entity(john.clone().into()).await.unwrap();
    declared.commit().await.unwrap();

    let factory = declared.object_factory().await.unwrap();
    let mut by_age = factory.create_composite_key("Person").unwrap();
    by_age.set_attribute("age", 40).unwrap();
    let found = declared.get_entity(&by_age, &FetchOptions::node_only()).await.unwrap().unwrap();
    assert_eq!(found.entity_id(), john.entity_id());
}

#[tokio::test]
async fn test_unknown_schema_reference() {
    let yaml = "node_types:\n  - { name: Person, attributes: [name] }\n";
    let err = EmbeddedConnection::from_schema_yaml(yaml, ModelConfig::default()).unwrap_err();
    assert!(matches!(err, ConnectionError::Model(ModelError::InvalidSchema(_))));

    let err = EmbeddedConnection::from_schema_yaml("node_types: 7", ModelConfig::default()).unwrap_err();
    assert!(matches!(err, ConnectionError::SchemaDocument(_)));
}
