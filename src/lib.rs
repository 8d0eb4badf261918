//! Graph Model
//!
//! Client-side object model for a remote graph database: an immutable
//! schema snapshot, a factory that creates nodes, edges, graphs and
//! composite keys against it, and the connection contract used to commit
//! and fetch them.
//!
//! # Layout
//!
//! - [`schema`]: attribute descriptors, node and edge types, the
//!   [`GraphMetadata`] snapshot and its serializable [`SchemaDocument`] form
//! - [`graph`]: entities, attribute values, composite keys and the
//!   [`GraphObjectFactory`]
//! - [`connection`]: the async [`Connection`] trait and an in-process
//!   [`EmbeddedConnection`]
//! - [`config`]: model settings loaded from YAML
//!
//! ## Example Usage
//!
//! ```rust
//! use graph_model::{AttributeDescriptor, AttributeType, GraphMetadata, GraphObject, GraphObjectFactory, NodeType};
//! use graph_model::schema::DirectionKind;
//! use std::sync::Arc;
//!
//! let name = AttributeDescriptor::with_id(1, "name", AttributeType::String);
//! let person = NodeType::from_descriptors("Person", vec![name.clone()], [&name]).unwrap();
//! let factory = GraphObjectFactory::new(Arc::new(GraphMetadata::new(vec![person], Vec::new())));
//!
//! let john = factory.create_node_of_type_named("Person").unwrap();
//! john.set_attribute("name", "john").unwrap();
//! let mary = factory.create_node_of_type_named("Person").unwrap();
//! let knows = factory.create_edge(&john, &mary, DirectionKind::Directed);
//!
//! assert_eq!(john.edges(), vec![knows.clone()]);
//! assert_eq!(mary.edges(), vec![knows]);
//! assert!(john.virtual_id().as_i64() < 0);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod error;
pub mod graph;
pub mod schema;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigResult, KeyValidation, ModelConfig};

pub use connection::{
    CommitSummary, Connection, ConnectionError, ConnectionResult, EmbeddedConnection, FetchOptions,
};

pub use error::{ModelError, ModelResult};

pub use graph::{
    Attribute, AttributeValue, CompositeKey, Decimal, Direction, Edge, Entity, EntityId, EntityKind, EntityState,
    Graph, GraphObject, GraphObjectFactory, Node, VirtualId,
};

pub use schema::{
    AttributeDescriptor, AttributeType, EdgeType, GraphMetadata, NodeType, SchemaDocument,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
