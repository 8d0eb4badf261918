//! Schema layer: attribute descriptors, node and edge types, metadata snapshots
//!
//! Types are immutable once built. Inheritance from a parent type is
//! resolved by the builders, so a built type already carries its effective
//! attribute set.

pub mod attribute;
pub mod document;
pub mod edge_type;
pub mod metadata;
pub mod node_type;

pub use attribute::{
    AttributeDescriptor, AttributeId, AttributeType, DEFAULT_NUMBER_PRECISION, DEFAULT_NUMBER_SCALE,
};
pub use document::{AttributeSpec, EdgeTypeSpec, NodeTypeSpec, SchemaDocument};
pub use edge_type::{DirectionKind, EdgeType, EdgeTypeBuilder};
pub use metadata::{GraphMetadata, GraphMetadataBuilder};
pub use node_type::{AttributeMap, EntityTypeId, NodeType, NodeTypeBuilder};
