//! Node type registry.
//!
//! Maps the type tag found in a compact representation back to a factory
//! that builds the node from its settings. The built-in leaf nodes are
//! always registered; plugins can add their own tags.

use crate::error::LoadError;
use crate::graph::node::{AnyNode, Settings};
use crate::graph::nodes::{CollectorNode, NoopNode, ValueSourceNode};
use std::collections::HashMap;

/// Builds a node from its settings.
pub type NodeFactory = Box<dyn Fn(&Settings) -> Result<AnyNode, String> + Send + Sync>;

pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// A registry with only the built-in node types.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(NoopNode::TYPE_TAG, |_| Ok(NoopNode::new().into()));
        registry.register(ValueSourceNode::TYPE_TAG, |settings| {
            ValueSourceNode::from_settings(settings).map(Into::into)
        });
        registry.register(CollectorNode::TYPE_TAG, |_| Ok(CollectorNode::new().into()));
        registry
    }

    /// Register (or replace) a factory for a type tag.
    pub fn register<F>(&mut self, type_tag: impl Into<String>, factory: F)
    where
        F: Fn(&Settings) -> Result<AnyNode, String> + Send + Sync + 'static,
    {
        self.factories.insert(type_tag.into(), Box::new(factory));
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.factories.contains_key(type_tag)
    }

    /// Build a node. `entry` is only used in error messages.
    pub fn create(
        &self,
        type_tag: &str,
        entry: &str,
        settings: &Settings,
    ) -> Result<AnyNode, LoadError> {
        let factory = self
            .factories
            .get(type_tag)
            .ok_or_else(|| LoadError::UnknownNodeType(type_tag.to_string()))?;
        factory(settings).map_err(|message| LoadError::InvalidSettings {
            entry: entry.to_string(),
            message,
        })
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
