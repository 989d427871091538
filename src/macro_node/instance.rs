//! Macro instances.
//!
//! Building an instance loads its definition into the enclosing graph, builds
//! the input and output alias maps, renames every internal node with the
//! instance suffix and assigns the settings reporters. The instance itself
//! owns no connection; it only remembers which real nodes it stands for.

use crate::error::{LoadError, Result};
use crate::graph::compact::format_display;
use crate::graph::id::{MacroId, NodeId};
use crate::graph::node::{Settings, SettingsReporter};
use crate::graph::port::{Port, PortDirection};
use crate::graph::store::Graph;
use crate::macro_node::aggregator::AliasMap;
use crate::macro_node::loader::{load_subgraph, Subgraph};
use crate::macro_node::suffix::InstanceSuffix;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reserved type tag of macro entries in the compact representation.
pub const MACRO_TYPE_TAG: &str = "Macro";

/// Construction parameters of a macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroParams {
    /// Definition handle, kept verbatim for serialization.
    pub path: PathBuf,
    /// Display name; defaults to `"Macro: {file stem}"`.
    pub name: Option<String>,
    /// Forwarded verbatim to every internal node.
    pub compute_on: String,
    /// Explicit instance suffix; a fresh one is drawn when absent.
    pub suffix: Option<InstanceSuffix>,
}

impl MacroParams {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            compute_on: String::new(),
            suffix: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_compute_on(mut self, compute_on: impl Into<String>) -> Self {
        self.compute_on = compute_on.into();
        self
    }

    pub fn with_suffix(mut self, suffix: InstanceSuffix) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Parameters from a `Macro` entry of a compact representation.
    pub fn from_settings(entry: &str, settings: &Settings) -> std::result::Result<Self, LoadError> {
        let parsed: MacroSettings = serde_json::from_value(serde_json::Value::Object(settings.clone()))
            .map_err(|e| LoadError::InvalidSettings {
                entry: entry.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            path: PathBuf::from(parsed.path),
            name: Some(parsed.name).filter(|name| !name.is_empty()),
            compute_on: parsed.compute_on,
            suffix: None,
        })
    }
}

/// What a macro reports about itself when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSettings {
    pub path: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub compute_on: String,
}

impl MacroSettings {
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::new();
        settings.insert("path".to_string(), self.path.clone().into());
        settings.insert("name".to_string(), self.name.clone().into());
        if !self.compute_on.is_empty() {
            settings.insert("compute_on".to_string(), self.compute_on.clone().into());
        }
        settings
    }
}

/// `"Macro: {file stem}"`.
pub fn default_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Macro: {}", stem)
}

/// A loaded subgraph presented as one node.
#[derive(Debug, Clone)]
pub struct MacroInstance {
    path: PathBuf,
    name: String,
    compute_on: String,
    suffix: InstanceSuffix,
    subgraph: Subgraph,
    pub(crate) ports_in: Arc<AliasMap>,
    pub(crate) ports_out: Arc<AliasMap>,
    representative: NodeId,
}

impl MacroInstance {
    /// Build an instance into `graph`.
    ///
    /// `base_dir` is the directory of the including definition, if any.
    /// On failure the graph is left as it was.
    pub fn build(graph: &mut Graph, params: MacroParams, base_dir: Option<&Path>) -> Result<MacroId> {
        let mark = graph.mark();
        Self::build_into(graph, params, base_dir).inspect_err(|_| graph.rollback(mark))
    }

    fn build_into(graph: &mut Graph, params: MacroParams, base_dir: Option<&Path>) -> Result<MacroId> {
        let subgraph = load_subgraph(graph, &params.path, base_dir)?;
        let representative = subgraph
            .first()
            .ok_or_else(|| LoadError::Empty(params.path.clone()))?;

        // Aliases use the names as written in the definition.
        let ports_in = AliasMap::aggregate(graph, &subgraph, PortDirection::Input)?;
        let ports_out = AliasMap::aggregate(graph, &subgraph, PortDirection::Output)?;

        let suffix = params.suffix.unwrap_or_else(InstanceSuffix::next);
        let id = graph.next_macro_id();
        for &node in subgraph.nodes() {
            let slot = graph.node_mut(node)?;
            slot.name = suffix.apply(&slot.name);
            slot.reporter = SettingsReporter::Silent(id);
            slot.compute_on = params.compute_on.clone();
        }
        graph.node_mut(representative)?.reporter = SettingsReporter::Representative(id);

        let name = params.name.unwrap_or_else(|| default_name(&params.path));
        tracing::info!(
            "Built macro '{}' from {:?}: {} nodes, {} inputs, {} outputs, suffix {}",
            name,
            params.path,
            subgraph.len(),
            ports_in.len(),
            ports_out.len(),
            suffix
        );

        let instance = MacroInstance {
            path: params.path,
            name,
            compute_on: params.compute_on,
            suffix,
            subgraph,
            ports_in: Arc::new(ports_in),
            ports_out: Arc::new(ports_out),
            representative,
        };
        graph.insert_macro(instance);
        graph.macro_mut(id)?.ensure_unique_name()?;
        Ok(id)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn compute_on(&self) -> &str {
        &self.compute_on
    }

    pub fn suffix(&self) -> InstanceSuffix {
        self.suffix
    }

    pub fn subgraph(&self) -> &Subgraph {
        &self.subgraph
    }

    /// The real internal nodes, in topological order.
    pub fn nodes(&self) -> &[NodeId] {
        self.subgraph.nodes()
    }

    /// The internal node that serializes on behalf of the whole macro.
    pub fn representative(&self) -> NodeId {
        self.representative
    }

    pub fn ports_in(&self) -> &AliasMap {
        &self.ports_in
    }

    pub fn ports_out(&self) -> &AliasMap {
        &self.ports_out
    }

    /// Exposed input ports.
    pub fn input_ports(&self) -> Vec<Port> {
        self.ports_in.ports()
    }

    /// Exposed output ports.
    pub fn output_ports(&self) -> Vec<Port> {
        self.ports_out.ports()
    }

    /// `"{name} [Macro]"`.
    pub fn display(&self) -> String {
        format_display(&self.name, MACRO_TYPE_TAG)
    }

    pub fn settings(&self) -> MacroSettings {
        MacroSettings {
            path: self.path.to_string_lossy().into_owned(),
            name: self.name.clone(),
            compute_on: self.compute_on.clone(),
        }
    }
}
