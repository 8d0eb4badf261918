//! Serializable schema description
//!
//! A [`SchemaDocument`] is the wire-neutral shape of a schema fetch: a flat
//! list of attribute descriptors, node types and edge types that refer to
//! each other by name. [`SchemaDocument::into_metadata`] turns it into an
//! immutable [`GraphMetadata`] snapshot using the type builders.

use super::attribute::{AttributeDescriptor, AttributeType};
use super::edge_type::{DirectionKind, EdgeType};
use super::metadata::GraphMetadata;
use super::node_type::NodeType;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Server id; absent for attributes defined on the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    /// Scalar kind name, e.g. `String` or `timestamp`
    #[serde(rename = "type")]
    pub attr_type: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Names of own attributes
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Names of primary key attributes; empty inherits the parent's key
    #[serde(default)]
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTypeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub direction: DirectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Complete schema description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
    #[serde(default)]
    pub node_types: Vec<NodeTypeSpec>,
    #[serde(default)]
    pub edge_types: Vec<EdgeTypeSpec>,
}

impl SchemaDocument {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build the snapshot described by this document.
    ///
    /// Parents may be declared before or after their children. Unknown
    /// attribute, parent or endpoint names, duplicate names and parent
    /// cycles fail with `InvalidSchema`.
    pub fn into_metadata(&self, config: &ModelConfig) -> ModelResult<GraphMetadata> {
        let descriptors = self.build_descriptors(config)?;

        let node_specs = index_by_name(&self.node_types, |s| &s.name, "node type")?;
        let mut nodes: IndexMap<String, Arc<NodeType>> = IndexMap::new();
        for name in node_specs.keys() {
            resolve_node_type(name, &node_specs, &descriptors, &mut nodes, &mut IndexSet::new())?;
        }

        let edge_specs = index_by_name(&self.edge_types, |s| &s.name, "edge type")?;
        let mut edges: IndexMap<String, Arc<EdgeType>> = IndexMap::new();
        for name in edge_specs.keys() {
            resolve_edge_type(name, &edge_specs, &descriptors, &nodes, &mut edges, &mut IndexSet::new())?;
        }

        let mut builder = GraphMetadata::builder();
        for descriptor in descriptors.into_values() {
            builder = builder.attribute_descriptor(descriptor);
        }
        for node_type in nodes.into_values() {
            builder = builder.node_type(node_type);
        }
        for edge_type in edges.into_values() {
            builder = builder.edge_type(edge_type);
        }
        Ok(builder.build())
    }

    fn build_descriptors(&self, config: &ModelConfig) -> ModelResult<IndexMap<String, Arc<AttributeDescriptor>>> {
        let mut descriptors = IndexMap::with_capacity(self.attributes.len());
        for spec in &self.attributes {
            let attr_type = AttributeType::from_type_name(&spec.attr_type);
            if attr_type == AttributeType::Invalid {
                return Err(ModelError::invalid_schema(format!(
                    "attribute '{}' has unknown type '{}'",
                    spec.name, spec.attr_type
                )));
            }

            let mut descriptor = match spec.id {
                Some(id) => AttributeDescriptor::with_id(id, spec.name.as_str(), attr_type),
                None => AttributeDescriptor::new(spec.name.as_str(), attr_type),
            };
            if spec.is_array {
                descriptor = descriptor.array();
            }
            descriptor = descriptor.with_precision(
                spec.precision.unwrap_or(config.number_precision),
                spec.scale.unwrap_or(config.number_scale),
            );

            if descriptors.insert(spec.name.clone(), Arc::new(descriptor)).is_some() {
                return Err(ModelError::invalid_schema(format!(
                    "attribute '{}' declared twice",
                    spec.name
                )));
            }
        }
        Ok(descriptors)
    }
}

fn index_by_name<'a, T>(
    specs: &'a [T],
    name_of: impl Fn(&T) -> &String,
    what: &str,
) -> ModelResult<IndexMap<&'a str, &'a T>> {
    let mut index = IndexMap::with_capacity(specs.len());
    for spec in specs {
        let name = name_of(spec);
        if index.insert(name.as_str(), spec).is_some() {
            return Err(ModelError::invalid_schema(format!("{} '{}' declared twice", what, name)));
        }
    }
    Ok(index)
}

fn lookup_descriptors(
    owner: &str,
    names: &[String],
    descriptors: &IndexMap<String, Arc<AttributeDescriptor>>,
) -> ModelResult<Vec<Arc<AttributeDescriptor>>> {
    names
        .iter()
        .map(|name| {
            descriptors.get(name).cloned().ok_or_else(|| {
                ModelError::invalid_schema(format!("{} refers to unknown attribute '{}'", owner, name))
            })
        })
        .collect()
}

fn resolve_node_type(
    name: &str,
    specs: &IndexMap<&str, &NodeTypeSpec>,
    descriptors: &IndexMap<String, Arc<AttributeDescriptor>>,
    built: &mut IndexMap<String, Arc<NodeType>>,
    visiting: &mut IndexSet<String>,
) -> ModelResult<Arc<NodeType>> {
    if let Some(node_type) = built.get(name) {
        return Ok(Arc::clone(node_type));
    }
    let spec = specs
        .get(name)
        .ok_or_else(|| ModelError::invalid_schema(format!("unknown node type '{}'", name)))?;
    if !visiting.insert(name.to_string()) {
        return Err(ModelError::invalid_schema(format!(
            "node type '{}' is its own ancestor",
            name
        )));
    }

    let parent = match &spec.parent {
        Some(parent) => Some(resolve_node_type(parent, specs, descriptors, built, visiting)?),
        None => None,
    };

    let mut builder = NodeType::builder(spec.name.as_str());
    if let Some(id) = spec.id {
        builder = builder.id(id);
    }
    for descriptor in lookup_descriptors(&spec.name, &spec.attributes, descriptors)? {
        builder = builder.attribute(descriptor);
    }
    // own key first so the parent's key is only inherited when none is given
    for key in &spec.primary_key {
        builder = builder.primary_key(key.as_str());
    }
    if let Some(parent) = parent {
        builder = builder.parent(parent);
    }

    let node_type = Arc::new(builder.build()?);
    debug!("Resolved {}", node_type);
    built.insert(spec.name.clone(), Arc::clone(&node_type));
    Ok(node_type)
}

fn resolve_edge_type(
    name: &str,
    specs: &IndexMap<&str, &EdgeTypeSpec>,
    descriptors: &IndexMap<String, Arc<AttributeDescriptor>>,
    nodes: &IndexMap<String, Arc<NodeType>>,
    built: &mut IndexMap<String, Arc<EdgeType>>,
    visiting: &mut IndexSet<String>,
) -> ModelResult<Arc<EdgeType>> {
    if let Some(edge_type) = built.get(name) {
        return Ok(Arc::clone(edge_type));
    }
    let spec = specs
        .get(name)
        .ok_or_else(|| ModelError::invalid_schema(format!("unknown edge type '{}'", name)))?;
    if !visiting.insert(name.to_string()) {
        return Err(ModelError::invalid_schema(format!(
            "edge type '{}' is its own ancestor",
            name
        )));
    }

    let parent = match &spec.parent {
        Some(parent) => Some(resolve_edge_type(parent, specs, descriptors, nodes, built, visiting)?),
        None => None,
    };
    let endpoint = |endpoint: &Option<String>| -> ModelResult<Option<Arc<NodeType>>> {
        match endpoint {
            Some(node_name) => nodes.get(node_name).cloned().map(Some).ok_or_else(|| {
                ModelError::invalid_schema(format!(
                    "edge type '{}' refers to unknown node type '{}'",
                    spec.name, node_name
                ))
            }),
            None => Ok(None),
        }
    };

    let mut builder = EdgeType::builder(spec.name.as_str(), spec.direction)
        .endpoints(endpoint(&spec.from)?, endpoint(&spec.to)?);
    if let Some(id) = spec.id {
        builder = builder.id(id);
    }
    for descriptor in lookup_descriptors(&spec.name, &spec.attributes, descriptors)? {
        builder = builder.attribute(descriptor);
    }
    if let Some(parent) = parent {
        builder = builder.parent(parent);
    }

    let edge_type = Arc::new(builder.build()?);
    debug!("Resolved {}", edge_type);
    built.insert(spec.name.clone(), Arc::clone(&edge_type));
    Ok(edge_type)
}
