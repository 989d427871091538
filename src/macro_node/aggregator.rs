//! Port aggregation.
//!
//! Every port of every internal node becomes a port of the macro. The alias
//! key is `"{node}_{port}"` and the label `"{node}: {label}"`, where `node` is
//! the internal node's un-suffixed name. A node that belongs to a nested macro
//! is exposed through that macro instead: its name and its own alias take the
//! place of the node name and port. Maps are built once per instance and
//! shared read-only afterwards.

use crate::error::{MacroError, Result};
use crate::graph::id::NodeId;
use crate::graph::node::NodeSlot;
use crate::graph::port::{Port, PortDirection};
use crate::graph::store::Graph;
use crate::macro_node::loader::Subgraph;
use std::collections::HashMap;

/// Where an alias points to.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasTarget {
    /// The real internal node.
    pub node: NodeId,
    /// The internal node's own port key.
    pub port: String,
    /// The port as the macro exposes it.
    pub spec: Port,
}

pub fn alias_key(node_name: &str, port_key: &str) -> String {
    format!("{}_{}", node_name, port_key)
}

pub fn alias_label(node_name: &str, port_label: &str) -> String {
    format!("{}: {}", node_name, port_label)
}

/// Ordered alias key -> internal endpoint map for one direction.
#[derive(Debug, Clone)]
pub struct AliasMap {
    direction: PortDirection,
    entries: Vec<(String, AliasTarget)>,
    index: HashMap<String, usize>,
}

impl AliasMap {
    /// Aggregate the ports of a sorted subgraph, in subgraph then port order.
    pub fn aggregate(graph: &Graph, subgraph: &Subgraph, direction: PortDirection) -> Result<Self> {
        let mut map = Self {
            direction,
            entries: Vec::new(),
            index: HashMap::new(),
        };

        for &node in subgraph.nodes() {
            let slot = graph.node(node)?;
            let ports = match direction {
                PortDirection::Input => &slot.ports_in,
                PortDirection::Output => &slot.ports_out,
            };

            for port in ports {
                let (owner, port_key, port_label) = exposed_as(graph, slot, node, port, direction);
                let key = alias_key(&owner, &port_key);
                if map.index.contains_key(&key) {
                    return Err(MacroError::DuplicateAlias { key });
                }
                let spec = Port::new(key.clone(), alias_label(&owner, &port_label))
                    .optional(port.is_optional())
                    .kind(port.port_kind());
                map.index.insert(key.clone(), map.entries.len());
                map.entries.push((
                    key,
                    AliasTarget {
                        node,
                        port: port.key().to_string(),
                        spec,
                    },
                ));
            }
        }

        tracing::trace!(
            "Aggregated {} {} aliases over {} nodes",
            map.entries.len(),
            direction,
            subgraph.len()
        );
        Ok(map)
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn get(&self, key: &str) -> Option<&AliasTarget> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    /// Reverse lookup: the alias exposing an internal node's port.
    pub fn key_for(&self, node: NodeId, port: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, target)| target.node == node && target.port == port)
            .map(|(key, _)| key.as_str())
    }

    /// The ports the macro exposes, in aggregation order.
    pub fn ports(&self) -> Vec<Port> {
        self.entries
            .iter()
            .map(|(_, target)| target.spec.clone())
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasTarget)> {
        self.entries.iter().map(|(key, target)| (key.as_str(), target))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owner name, port key and port label under which a node's port is exposed.
fn exposed_as(
    graph: &Graph,
    slot: &NodeSlot,
    node: NodeId,
    port: &Port,
    direction: PortDirection,
) -> (String, String, String) {
    let nested = slot
        .reporter
        .macro_id()
        .filter(|&id| graph.is_macro_visible(id))
        .and_then(|id| graph.macro_instance(id).ok())
        .and_then(|inner| {
            let map = match direction {
                PortDirection::Input => inner.ports_in(),
                PortDirection::Output => inner.ports_out(),
            };
            let target = map.get(map.key_for(node, port.key())?)?;
            Some((
                inner.name().to_string(),
                target.spec.key().to_string(),
                target.spec.label().to_string(),
            ))
        });
    nested.unwrap_or_else(|| {
        (
            slot.display_name(),
            port.key().to_string(),
            port.label().to_string(),
        )
    })
}
