//! Settings reporting.
//!
//! When the enclosing graph is serialized each node is asked for its entry
//! through its `SettingsReporter`. Ordinary nodes report themselves; the
//! representative of a macro reports the macro boundary; every other internal
//! node reports nothing. Connection descriptors are rendered from the
//! outside view: an endpoint inside a visible macro shows as the macro's
//! display identity and alias key.

use crate::error::Result;
use crate::graph::compact::Descriptor;
use crate::graph::connection::{Connection, Side};
use crate::graph::id::{MacroId, NodeId, NodeRef};
use crate::graph::node::{NodeSlot, Settings, SettingsReporter};
use crate::graph::store::Graph;

/// One entry of the compact representation plus its incoming descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsReport {
    pub display: String,
    pub settings: Settings,
    pub inputs: Vec<String>,
}

/// Ask a node for its entry. `None` for silent macro internals.
pub fn report(graph: &Graph, node: NodeId) -> Result<Option<SettingsReport>> {
    let slot = graph.node(node)?;
    match slot.reporter {
        SettingsReporter::Own => Ok(Some(SettingsReport {
            display: slot.display(),
            settings: own_settings(slot),
            inputs: graph
                .input_connections(node)
                .into_iter()
                .map(|conn| describe_connection(graph, conn))
                .collect(),
        })),
        SettingsReporter::Representative(id) => report_macro(graph, id).map(Some),
        SettingsReporter::Silent(_) => Ok(None),
    }
}

fn own_settings(slot: &NodeSlot) -> Settings {
    let mut settings = slot.node.settings();
    if !slot.compute_on.is_empty() {
        settings.insert("compute_on".to_string(), slot.compute_on.clone().into());
    }
    settings
}

/// The macro entry and every connection entering it from outside.
fn report_macro(graph: &Graph, id: MacroId) -> Result<SettingsReport> {
    let instance = graph.macro_instance(id)?;
    let suffix = instance.suffix();

    let mut inputs = Vec::new();
    for &node in instance.nodes() {
        for conn in graph.input_connections(node) {
            let external = conn
                .emit_node()
                .and_then(|emit| graph.node(emit).ok())
                .is_some_and(|emitter| !suffix.is_member(&emitter.name));
            if external {
                inputs.push(describe_connection(graph, conn));
            }
        }
    }

    Ok(SettingsReport {
        display: instance.display(),
        settings: instance.settings().to_settings(),
        inputs,
    })
}

/// The visible macro a node belongs to, if any.
fn visible_owner(graph: &Graph, slot: &NodeSlot) -> Option<MacroId> {
    slot.reporter
        .macro_id()
        .filter(|&id| graph.is_macro_visible(id))
}

/// Render a live connection as `"<src>.<port> -> <dst>.<port>"`.
pub fn describe_connection(graph: &Graph, conn: &Connection) -> String {
    let (emit_display, emit_port) = describe_emit(graph, conn);
    let (recv_display, recv_port) = describe_recv(graph, conn);
    Descriptor::new(emit_display, emit_port, recv_display, recv_port).to_string()
}

fn describe_emit(graph: &Graph, conn: &Connection) -> (String, String) {
    // The step recorded when the connection was declared against a macro.
    let declared = conn.rewrites_for(Side::Emit).rev().find_map(|step| {
        let id = step.macro_id().filter(|&id| graph.is_macro_visible(id))?;
        let instance = graph.macro_instance(id).ok()?;
        Some((instance.display(), step.from.port.clone()))
    });
    if let Some(found) = declared {
        return found;
    }
    describe_endpoint(graph, conn.emit.node, &conn.emit.port, Side::Emit)
}

fn describe_recv(graph: &Graph, conn: &Connection) -> (String, String) {
    describe_endpoint(graph, conn.recv.node, &conn.recv.port, Side::Recv)
}

fn describe_endpoint(graph: &Graph, node: NodeRef, port: &str, side: Side) -> (String, String) {
    match node {
        NodeRef::Node(id) => {
            let Ok(slot) = graph.node(id) else {
                return (id.to_string(), port.to_string());
            };
            let aliased = visible_owner(graph, slot).and_then(|mid| {
                let instance = graph.macro_instance(mid).ok()?;
                let map = match side {
                    Side::Emit => instance.ports_out(),
                    Side::Recv => instance.ports_in(),
                };
                let key = map.key_for(id, port)?;
                Some((instance.display(), key.to_string()))
            });
            aliased.unwrap_or_else(|| (slot.display(), port.to_string()))
        }
        NodeRef::Macro(id) => {
            let display = graph
                .macro_instance(id)
                .map(|m| m.display())
                .unwrap_or_else(|_| id.to_string());
            (display, port.to_string())
        }
    }
}
