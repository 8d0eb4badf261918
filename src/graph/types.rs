//! Identity and state types shared by every entity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-local identity assigned by a factory at creation.
///
/// Always negative; never sent to or received from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct VirtualId(pub i64);

impl VirtualId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for VirtualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualId({})", self.0)
    }
}

impl From<i64> for VirtualId {
    fn from(id: i64) -> Self {
        VirtualId(id)
    }
}

/// Durable id assigned by the server on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    pub fn new(id: u64) -> Self {
        EntityId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        EntityId(id)
    }
}

/// Entity kind tag. Discriminants are the server's kind ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Node = 2,
    Edge = 3,
    Graph = 4,
}

impl EntityKind {
    pub fn as_value(&self) -> i32 {
        *self as i32
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            2 => Some(EntityKind::Node),
            3 => Some(EntityKind::Edge),
            4 => Some(EntityKind::Graph),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "Node",
            EntityKind::Edge => "Edge",
            EntityKind::Graph => "Graph",
        };
        write!(f, "{}", name)
    }
}

/// Commit state of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Created locally, never committed
    New,
    /// Committed, then changed locally
    Modified,
    /// Removed by a committed delete
    Deleted,
    /// Matches the server copy
    Clean,
}

/// Which incident edges an adjacency query returns, relative to the node
/// being asked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Any,
    /// The node is the edge's from-endpoint
    Outbound,
    /// The node is the edge's to-endpoint
    Inbound,
}
