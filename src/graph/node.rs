//! Node abstraction for the graph.
//!
//! Two-layer design:
//! - **`NodePlugin` trait**: for user-defined node types registered at runtime.
//! - **`BuiltinNode` enum**: for the built-in leaf nodes, dispatched by match.
//!
//! `AnyNode` wraps either variant so the graph can handle both uniformly.
//! `NodeSlot` is what the graph store keeps per node: the behavior plus the
//! structural state (name, ports, connections, settings reporter).

use crate::graph::connection::EndpointRewrite;
use crate::graph::id::{ConnectionId, MacroId};
use crate::graph::nodes::{CollectorNode, NoopNode, ValueSourceNode};
use crate::graph::packet::{Packet, PortQueues};
use crate::graph::port::Port;
use crate::macro_node::suffix::strip_instance_suffixes;

/// Node settings as they appear in the compact representation.
pub type Settings = serde_json::Map<String, serde_json::Value>;

/// Context passed to `on_data` each tick.
pub struct NodeContext<'a> {
    /// Packets waiting on each input port.
    pub inputs: &'a mut PortQueues,
    /// Packets emitted this tick, tagged with the output port key.
    pub outputs: &'a mut Vec<(String, Packet)>,
    /// Monotonic tick counter.
    pub tick: u64,
}

impl NodeContext<'_> {
    pub fn emit(&mut self, port: &str, packet: Packet) {
        self.outputs.push((port.to_string(), packet));
    }
}

/// What a node reports after processing a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// May produce more output.
    Active,
    /// Will never produce output on its own again.
    Finished,
}

/// Trait for pluggable/user-defined nodes.
pub trait NodePlugin: Send {
    /// Type tag used in the compact representation.
    fn type_tag(&self) -> &str;

    fn ports_in(&self) -> Vec<Port>;

    fn ports_out(&self) -> Vec<Port>;

    /// Node-specific settings, serialized next to the node's display key.
    fn settings(&self) -> Settings {
        Settings::new()
    }

    /// Called once before the first tick.
    fn on_start(&mut self) {}

    /// Called every tick to process data.
    fn on_data(&mut self, ctx: &mut NodeContext) -> NodeStatus;

    /// Called once after the last tick.
    fn on_stop(&mut self) {}
}

/// Enum dispatch for built-in nodes.
pub enum BuiltinNode {
    Noop(NoopNode),
    ValueSource(ValueSourceNode),
    Collector(CollectorNode),
}

impl BuiltinNode {
    pub fn type_tag(&self) -> &str {
        match self {
            BuiltinNode::Noop(n) => n.type_tag(),
            BuiltinNode::ValueSource(n) => n.type_tag(),
            BuiltinNode::Collector(n) => n.type_tag(),
        }
    }

    pub fn ports_in(&self) -> Vec<Port> {
        match self {
            BuiltinNode::Noop(n) => n.ports_in(),
            BuiltinNode::ValueSource(n) => n.ports_in(),
            BuiltinNode::Collector(n) => n.ports_in(),
        }
    }

    pub fn ports_out(&self) -> Vec<Port> {
        match self {
            BuiltinNode::Noop(n) => n.ports_out(),
            BuiltinNode::ValueSource(n) => n.ports_out(),
            BuiltinNode::Collector(n) => n.ports_out(),
        }
    }

    pub fn settings(&self) -> Settings {
        match self {
            BuiltinNode::Noop(_) => Settings::new(),
            BuiltinNode::ValueSource(n) => n.settings(),
            BuiltinNode::Collector(_) => Settings::new(),
        }
    }

    pub fn on_start(&mut self) {
        match self {
            BuiltinNode::Noop(_) => {}
            BuiltinNode::ValueSource(n) => n.on_start(),
            BuiltinNode::Collector(n) => n.on_start(),
        }
    }

    pub fn on_data(&mut self, ctx: &mut NodeContext) -> NodeStatus {
        match self {
            BuiltinNode::Noop(n) => n.on_data(ctx),
            BuiltinNode::ValueSource(n) => n.on_data(ctx),
            BuiltinNode::Collector(n) => n.on_data(ctx),
        }
    }
}

/// Wrapper that holds either a built-in node (enum dispatch) or a plugin (trait object).
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl AnyNode {
    pub fn type_tag(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.type_tag(),
            AnyNode::Plugin(n) => n.type_tag(),
        }
    }

    pub fn ports_in(&self) -> Vec<Port> {
        match self {
            AnyNode::Builtin(n) => n.ports_in(),
            AnyNode::Plugin(n) => n.ports_in(),
        }
    }

    pub fn ports_out(&self) -> Vec<Port> {
        match self {
            AnyNode::Builtin(n) => n.ports_out(),
            AnyNode::Plugin(n) => n.ports_out(),
        }
    }

    pub fn settings(&self) -> Settings {
        match self {
            AnyNode::Builtin(n) => n.settings(),
            AnyNode::Plugin(n) => n.settings(),
        }
    }

    pub fn on_start(&mut self) {
        match self {
            AnyNode::Builtin(n) => n.on_start(),
            AnyNode::Plugin(n) => n.on_start(),
        }
    }

    pub fn on_data(&mut self, ctx: &mut NodeContext) -> NodeStatus {
        match self {
            AnyNode::Builtin(n) => n.on_data(ctx),
            AnyNode::Plugin(n) => n.on_data(ctx),
        }
    }

    pub fn on_stop(&mut self) {
        if let AnyNode::Plugin(n) = self {
            n.on_stop();
        }
    }

    /// The collector behind this node, if it is one.
    pub fn as_collector(&self) -> Option<&CollectorNode> {
        match self {
            AnyNode::Builtin(BuiltinNode::Collector(n)) => Some(n),
            _ => None,
        }
    }
}

impl From<NoopNode> for AnyNode {
    fn from(node: NoopNode) -> Self {
        AnyNode::Builtin(BuiltinNode::Noop(node))
    }
}

impl From<ValueSourceNode> for AnyNode {
    fn from(node: ValueSourceNode) -> Self {
        AnyNode::Builtin(BuiltinNode::ValueSource(node))
    }
}

impl From<CollectorNode> for AnyNode {
    fn from(node: CollectorNode) -> Self {
        AnyNode::Builtin(BuiltinNode::Collector(node))
    }
}

/// How a node describes itself when the enclosing graph is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsReporter {
    /// Own settings and own incoming connections.
    #[default]
    Own,
    /// Stands in for the whole macro: macro settings plus all external inputs.
    Representative(MacroId),
    /// Internal macro node that contributes nothing.
    Silent(MacroId),
}

impl SettingsReporter {
    /// The macro this node reports on behalf of, if any.
    pub fn macro_id(self) -> Option<MacroId> {
        match self {
            SettingsReporter::Own => None,
            SettingsReporter::Representative(id) | SettingsReporter::Silent(id) => Some(id),
        }
    }
}

/// A node and its per-graph structural state.
pub struct NodeSlot {
    pub node: AnyNode,
    /// Unique name; carries one instance suffix per enclosing macro.
    pub name: String,
    /// Scheduling hint, forwarded verbatim.
    pub compute_on: String,
    pub ports_in: Vec<Port>,
    pub ports_out: Vec<Port>,
    pub inputs: Vec<ConnectionId>,
    pub outputs: Vec<ConnectionId>,
    pub reporter: SettingsReporter,
    /// Applied in order to a connection handed to `remove_input_by_connection`.
    pub removal_rewrites: Vec<EndpointRewrite>,
    /// Whether this node has been deleted (slot is empty).
    pub deleted: bool,
}

impl NodeSlot {
    pub fn new(name: impl Into<String>, node: AnyNode) -> Self {
        let ports_in = node.ports_in();
        let ports_out = node.ports_out();
        Self {
            node,
            name: name.into(),
            compute_on: String::new(),
            ports_in,
            ports_out,
            inputs: Vec::new(),
            outputs: Vec::new(),
            reporter: SettingsReporter::Own,
            removal_rewrites: Vec::new(),
            deleted: false,
        }
    }

    pub fn type_tag(&self) -> &str {
        self.node.type_tag()
    }

    /// Name with every macro instance suffix removed.
    pub fn display_name(&self) -> String {
        strip_instance_suffixes(&self.name).into_owned()
    }

    /// Human-facing identity, `"<name> [<Type>]"`.
    pub fn display(&self) -> String {
        format!("{} [{}]", self.display_name(), self.type_tag())
    }
}
