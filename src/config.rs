//! Model configuration
//!
//! Settings that change how the factory validates keys and how schema
//! documents fill in defaults. Loaded from YAML or built in code.

use crate::schema::{DEFAULT_NUMBER_PRECISION, DEFAULT_NUMBER_SCALE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Config errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Which attributes a composite key accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValidation {
    /// Only attributes in the node type's primary key
    #[default]
    PrimaryKey,
    /// Any attribute declared on the node type
    Declared,
}

/// Configuration for the graph object model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Composite key strictness
    pub key_validation: KeyValidation,
    /// Precision for `Number` attributes declared without one
    pub number_precision: u16,
    /// Scale for `Number` attributes declared without one
    pub number_scale: u16,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            key_validation: KeyValidation::PrimaryKey,
            number_precision: DEFAULT_NUMBER_PRECISION,
            number_scale: DEFAULT_NUMBER_SCALE,
        }
    }
}

impl ModelConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn with_key_validation(mut self, key_validation: KeyValidation) -> Self {
        self.key_validation = key_validation;
        self
    }
}
