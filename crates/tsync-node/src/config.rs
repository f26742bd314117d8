//! Node configuration.

use crate::error::{NodeError, Result};
use serde::{Deserialize, Serialize};
use tsync_core::Classification;

/// Configuration for a field node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique node identifier; doubles as the LWW tie-break key.
    pub node_id: String,
    /// Classification applied to reports that do not name one.
    pub default_classification: Classification,
    /// Prefix for the actor id written into audit entries.
    pub actor_prefix: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: String::new(),
            default_classification: Classification::Unclassified,
            actor_prefix: "node_".to_string(),
        }
    }
}

impl NodeConfig {
    /// Defaults for the given node id.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            ..Default::default()
        }
    }

    /// Reject configurations a node cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(NodeError::Config("node id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Actor id recorded in this node's audit entries.
    pub fn actor_id(&self) -> String {
        format!("{}{}", self.actor_prefix, self.node_id)
    }
}

/// Builder for node configuration.
pub struct NodeConfigBuilder {
    config: NodeConfig,
}

impl NodeConfigBuilder {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            config: NodeConfig::new(node_id),
        }
    }

    pub fn default_classification(mut self, classification: Classification) -> Self {
        self.config.default_classification = classification;
        self
    }

    pub fn actor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.actor_prefix = prefix.into();
        self
    }

    pub fn build(self) -> NodeConfig {
        self.config
    }
}
