//! Graph object model
//!
//! Entities built against a metadata snapshot:
//! - Nodes with typed attributes and an adjacency of incident edges
//! - Edges referring weakly to their endpoints
//! - Graphs collecting nodes and edges under a name
//! - Composite keys for point lookups
//!
//! All of them are created through [`GraphObjectFactory`].

pub mod container;
pub mod edge;
pub mod entity;
pub mod factory;
mod handle;
pub mod key;
pub mod node;
pub mod types;
pub mod value;

// Re-export main types
pub use container::Graph;
pub use edge::Edge;
pub use entity::{Attribute, Entity, EntityCore, GraphObject};
pub use factory::GraphObjectFactory;
pub use key::CompositeKey;
pub use node::Node;
pub use types::{Direction, EntityId, EntityKind, EntityState, VirtualId};
pub use value::{AttributeValue, Decimal, ParseDecimalError};
