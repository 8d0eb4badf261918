//! Connection contract
//!
//! The object model never talks to a server itself. A [`Connection`]
//! supplies the metadata snapshot, stages inserts, updates and deletes,
//! commits them and fetches entities by composite key.

pub mod embedded;

pub use embedded::EmbeddedConnection;

use crate::error::ModelError;
use crate::graph::{CompositeKey, Entity, GraphObjectFactory, VirtualId};
use crate::schema::GraphMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a connection
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Another entity of the type already has this primary key
    #[error("Duplicate key for {type_name}: {key}")]
    DuplicateKey { type_name: String, key: String },

    /// A primary key attribute has no value
    #[error("Missing key attribute '{attribute}' for {type_name}")]
    MissingKey { type_name: String, attribute: String },

    /// An edge endpoint is neither committed nor part of the same commit
    #[error("Edge {0} has an endpoint that is neither committed nor part of this commit")]
    UnresolvedEndpoint(VirtualId),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Entity {0} is already committed")]
    AlreadyCommitted(VirtualId),

    #[error("Schema document error: {0}")]
    SchemaDocument(String),
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Options for fetching entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Maximum number of nodes materialized by one fetch, 0 for no limit
    pub fetch_size: usize,
    /// Number of edge hops to follow from the fetched node
    pub traversal_depth: usize,
    /// Maximum number of edges followed per node, 0 for no limit
    pub edge_limit: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            fetch_size: 1000,
            traversal_depth: 3,
            edge_limit: 0,
        }
    }
}

impl FetchOptions {
    /// Fetch only the node itself
    pub fn node_only() -> Self {
        Self::default().with_traversal_depth(0)
    }

    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn with_traversal_depth(mut self, traversal_depth: usize) -> Self {
        self.traversal_depth = traversal_depth;
        self
    }

    pub fn with_edge_limit(mut self, edge_limit: usize) -> Self {
        self.edge_limit = edge_limit;
        self
    }
}

/// What a commit changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }
}

/// Interface the object model needs from a graph database session.
///
/// Staging calls have no effect until [`commit`](Connection::commit). A
/// failed commit leaves every staged entity in the state it had before.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Current schema snapshot; `refresh` fetches a new one first
    async fn get_graph_metadata(&self, refresh: bool) -> ConnectionResult<Arc<GraphMetadata>>;

    /// Stage a new entity
    async fn insert_entity(&self, entity: Entity) -> ConnectionResult<()>;

    /// Stage changes of a committed entity
    async fn update_entity(&self, entity: Entity) -> ConnectionResult<()>;

    /// Stage removal of an entity
    async fn delete_entity(&self, entity: Entity) -> ConnectionResult<()>;

    /// Apply everything staged since the last commit
    async fn commit(&self) -> ConnectionResult<CommitSummary>;

    /// Point lookup by composite key
    async fn get_entity(&self, key: &CompositeKey, options: &FetchOptions) -> ConnectionResult<Option<Entity>>;

    /// A factory bound to the current snapshot
    async fn object_factory(&self) -> ConnectionResult<GraphObjectFactory> {
        let metadata = self.get_graph_metadata(false).await?;
        Ok(GraphObjectFactory::new(metadata))
    }
}
