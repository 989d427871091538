//! Test data builders for graphs and definitions

use flowmacro::graph::nodes::{CollectorNode, ValueSourceNode};
use flowmacro::graph::{CompactGraph, Executor, Graph, MacroId, NodeId, Packet, Settings};
use flowmacro::macro_node::MacroParams;
use serde_json::Value;
use std::path::Path;

/// Builder for compact graph definitions
#[derive(Default)]
pub struct DefinitionBuilder {
    compact: CompactGraph,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node entry with no settings
    pub fn node(self, name: &str, type_tag: &str) -> Self {
        self.node_with(name, type_tag, Settings::new())
    }

    pub fn node_with(mut self, name: &str, type_tag: &str, settings: Settings) -> Self {
        self.compact
            .nodes
            .insert(format!("{} [{}]", name, type_tag), settings);
        self
    }

    /// Add a macro entry pointing at a definition
    pub fn macro_entry(self, name: &str, path: &str) -> Self {
        let mut settings = Settings::new();
        settings.insert("path".to_string(), Value::from(path));
        settings.insert("name".to_string(), Value::from(name));
        self.node_with(name, "Macro", settings)
    }

    /// Add a connection descriptor
    pub fn input(mut self, descriptor: &str) -> Self {
        self.compact.inputs.push(descriptor.to_string());
        self
    }

    pub fn build(self) -> CompactGraph {
        self.compact
    }

    pub fn to_json(self) -> String {
        self.compact
            .to_json_string()
            .expect("Failed to encode definition")
    }
}

/// `source -> macro -> sink` around one macro instance
pub struct MacroHarness {
    pub graph: Graph,
    pub source: NodeId,
    pub macro_id: MacroId,
    pub sink: NodeId,
}

impl MacroHarness {
    /// Wire a source and a sink through the macro's `in_key` and `out_key`
    pub fn new(definition: &Path, data: Vec<Packet>, in_key: &str, out_key: &str) -> Self {
        let mut graph = Graph::with_config(super::test_config());
        let source = graph.add_node("source", ValueSourceNode::new(data));
        let sink = graph.add_node("sink", CollectorNode::new());
        let macro_id = graph
            .add_macro(MacroParams::new(definition))
            .expect("Failed to build macro");

        graph
            .connect(source, "any", macro_id, in_key)
            .expect("Failed to connect source");
        graph
            .connect(macro_id, out_key, sink, "any")
            .expect("Failed to connect sink");

        Self {
            graph,
            source,
            macro_id,
            sink,
        }
    }

    /// Run to completion and return what the sink received
    pub fn run(&mut self) -> Vec<Packet> {
        Executor::run_to_completion(&mut self.graph).expect("Run failed");
        self.graph
            .collector_state(self.sink)
            .expect("sink is a collector")
            .to_vec()
    }
}

/// Push `data` through a single noop macro and return the sink's state
pub fn run_single_test(data: Vec<Packet>) -> Vec<Packet> {
    MacroHarness::new(&super::noop_definition(), data, "Noop_any", "Noop_any").run()
}
