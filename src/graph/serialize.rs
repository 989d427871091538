//! Conversion between a live `Graph` and its compact representation.
//!
//! Serialization walks nodes in topological order and asks each one for its
//! entry (see `macro_node::reporter`). Deserialization rebuilds nodes through
//! the registry, macros through the macro construction procedure, and then
//! replays every descriptor through `Graph::connect`, which resolves macro
//! endpoints on the way.

use crate::config::EngineConfig;
use crate::error::{LoadError, MacroError, Result, ResultExt};
use crate::graph::compact::{split_display, CompactGraph, Descriptor};
use crate::graph::id::{NodeId, NodeRef};
use crate::graph::store::Graph;
use crate::macro_node::instance::{MacroInstance, MacroParams, MACRO_TYPE_TAG};
use crate::macro_node::loader::read_definition;
use crate::macro_node::reporter::report;
use std::collections::HashMap;
use std::path::Path;

impl Graph {
    /// Compact representation of the component containing `start`.
    pub fn to_compact(&self, start: impl Into<NodeRef>) -> Result<CompactGraph> {
        let start = match start.into() {
            NodeRef::Node(id) => id,
            NodeRef::Macro(id) => self.macro_instance(id)?.representative(),
        };
        let component = self.discover(start);
        self.compact_nodes(&component)
    }

    /// Compact representation of every live node.
    pub fn to_compact_all(&self) -> Result<CompactGraph> {
        let live: Vec<NodeId> = self.nodes().map(|(id, _)| id).collect();
        self.compact_nodes(&live)
    }

    fn compact_nodes(&self, nodes: &[NodeId]) -> Result<CompactGraph> {
        let mut compact = CompactGraph::default();
        for node in self.topological_order(nodes)? {
            let Some(entry) = report(self, node)? else {
                continue;
            };
            if compact.nodes.contains_key(&entry.display) {
                return Err(MacroError::Serialization(format!(
                    "two nodes share the entry '{}'",
                    entry.display
                )));
            }
            compact.nodes.insert(entry.display, entry.settings);
            compact.inputs.extend(entry.inputs);
        }
        Ok(compact)
    }

    /// Build a new graph from a compact representation.
    pub fn from_compact(compact: &CompactGraph, config: EngineConfig) -> Result<Graph> {
        let mut graph = Graph::with_config(config);
        graph.extend_from_compact(compact, None)?;
        Ok(graph)
    }

    /// Add the contents of a compact representation to this graph.
    ///
    /// `base_dir` is used to resolve relative macro definition handles.
    /// Returns the created entries in entry order. On failure the graph is
    /// left as it was.
    pub fn extend_from_compact(
        &mut self,
        compact: &CompactGraph,
        base_dir: Option<&Path>,
    ) -> Result<Vec<NodeRef>> {
        let mark = self.mark();
        self.extend_inner(compact, base_dir)
            .inspect_err(|_| self.rollback(mark))
    }

    fn extend_inner(&mut self, compact: &CompactGraph, base_dir: Option<&Path>) -> Result<Vec<NodeRef>> {
        let mut created = Vec::with_capacity(compact.nodes.len());
        let mut local: HashMap<&str, NodeRef> = HashMap::new();

        for (entry, settings) in &compact.nodes {
            let (name, type_tag) =
                split_display(entry).ok_or_else(|| LoadError::InvalidEntry(entry.clone()))?;

            let node = if type_tag == MACRO_TYPE_TAG {
                let params = MacroParams::from_settings(entry, settings)?;
                let id = MacroInstance::build(self, params, base_dir)
                    .with_context(|| format!("Failed to build macro '{}'", entry))?;
                NodeRef::Macro(id)
            } else {
                let mut settings = settings.clone();
                let compute_on = settings
                    .remove("compute_on")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                let node = self.registry().create(type_tag, entry, &settings)?;
                let id = self.add_node(name, node);
                self.node_mut(id)?.compute_on = compute_on;
                NodeRef::Node(id)
            };
            local.insert(entry.as_str(), node);
            created.push(node);
        }

        for input in &compact.inputs {
            let descriptor: Descriptor = input.parse().map_err(LoadError::InvalidDescriptor)?;
            let lookup = |display: &str| {
                local.get(display).copied().ok_or_else(|| {
                    LoadError::InvalidDescriptor(format!("unknown node '{}' in '{}'", display, input))
                })
            };
            let emit = lookup(&descriptor.emit_display)?;
            let recv = lookup(&descriptor.recv_display)?;
            self.connect(emit, &descriptor.emit_port, recv, &descriptor.recv_port)
                .with_context(|| format!("Failed to connect '{}'", input))?;
        }

        Ok(created)
    }

    /// Load a graph document from disk.
    pub fn load_file(path: impl AsRef<Path>, config: EngineConfig) -> Result<Graph> {
        let path = path.as_ref();
        let compact = read_definition(path)?;
        let mut graph = Graph::with_config(config);
        graph.extend_from_compact(&compact, path.parent())?;
        tracing::info!(
            "Loaded graph {:?}: {} nodes, {} macros",
            path,
            graph.nodes().count(),
            graph.macros().count()
        );
        Ok(graph)
    }

    /// Save every live node to disk; the encoding follows the extension.
    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.to_compact_all()?.save(path)
    }
}
