//! Connection redirection.
//!
//! Callers connect to and from a macro through its alias keys. Every call is
//! rewritten to the real internal node and port before the graph's native
//! operation sees it, so no live connection ever ends at a macro.

use crate::error::{MacroError, Result};
use crate::graph::compact::format_display;
use crate::graph::connection::{Connection, Endpoint, EndpointRewrite, Side};
use crate::graph::error::GraphError;
use crate::graph::id::{ConnectionId, MacroId, NodeRef};
use crate::graph::node::SettingsReporter;
use crate::graph::port::PortDirection;
use crate::graph::store::Graph;
use crate::macro_node::aggregator::{AliasMap, AliasTarget};
use crate::macro_node::instance::{MacroInstance, MACRO_TYPE_TAG};
use crate::macro_node::suffix::InstanceSuffix;
use std::collections::HashSet;
use std::sync::Arc;

/// Mutable view of one macro inside its enclosing graph.
pub struct MacroHandle<'g> {
    graph: &'g mut Graph,
    id: MacroId,
    ports_in: Arc<AliasMap>,
    ports_out: Arc<AliasMap>,
    suffix: InstanceSuffix,
}

impl<'g> MacroHandle<'g> {
    pub(crate) fn new(graph: &'g mut Graph, id: MacroId) -> Result<Self> {
        let instance = graph.macro_instance(id)?;
        let ports_in = Arc::clone(&instance.ports_in);
        let ports_out = Arc::clone(&instance.ports_out);
        let suffix = instance.suffix();
        Ok(Self {
            graph,
            id,
            ports_in,
            ports_out,
            suffix,
        })
    }

    pub fn id(&self) -> MacroId {
        self.id
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub fn instance(&self) -> Result<&MacroInstance> {
        Ok(self.graph.macro_instance(self.id)?)
    }

    pub fn name(&self) -> String {
        self.instance()
            .map(|m| m.name().to_string())
            .unwrap_or_default()
    }

    fn lookup(&self, direction: PortDirection, key: &str) -> Result<AliasTarget> {
        let map = match direction {
            PortDirection::Input => &self.ports_in,
            PortDirection::Output => &self.ports_out,
        };
        map.get(key).cloned().ok_or_else(|| MacroError::UnknownPort {
            macro_name: self.name(),
            direction,
            key: key.to_string(),
        })
    }

    /// Connect an external emitter to one of the macro's input aliases.
    ///
    /// The connection is made natively on the internal node. An emitter that
    /// is itself a macro goes through its own output redirection.
    pub fn connect_input(
        &mut self,
        emit: impl Into<NodeRef>,
        emit_port: &str,
        key: &str,
    ) -> Result<ConnectionId> {
        let target = self.lookup(PortDirection::Input, key)?;
        tracing::debug!(
            "Macro {:?}: input '{}' -> {:?}.{}",
            self.id,
            key,
            target.node,
            target.port
        );

        let id = self
            .graph
            .add_input(emit, emit_port, target.node, &target.port)?;
        self.ensure_unique_name()?;
        Ok(id)
    }

    /// Resolve a connection that leaves the macro through an output alias,
    /// then register it natively.
    pub fn accept_output_connection(&mut self, mut conn: Connection) -> Result<ConnectionId> {
        if conn.emit.node != NodeRef::Macro(self.id) {
            return Err(GraphError::MacroEndpoint(self.id).into());
        }
        let key = conn.emit.port.clone();
        let target = self.lookup(PortDirection::Output, &key)?;

        let step = EndpointRewrite {
            side: Side::Emit,
            from: Endpoint::new(self.id, key),
            to: Endpoint::new(target.node, target.port),
        };
        conn.rewrite(step.clone());
        self.graph.validate_connection(&conn)?;

        let recv = conn
            .recv_node()
            .ok_or(GraphError::MacroEndpoint(self.id))?;
        let rewrites = &mut self.graph.node_mut(recv)?.removal_rewrites;
        if !rewrites.contains(&step) {
            tracing::trace!("Recorded removal rewrite on {:?}: {:?}", recv, step);
            rewrites.push(step);
        }

        let id = self.graph.register_connection(conn)?;
        self.ensure_unique_name()?;
        Ok(id)
    }

    /// Remove a connection arriving at one of the macro's input aliases.
    pub fn disconnect_input(&mut self, mut conn: Connection) -> Result<()> {
        if conn.recv.node != NodeRef::Macro(self.id) {
            return Err(GraphError::MacroEndpoint(self.id).into());
        }
        let key = conn.recv.port.clone();
        let target = self.lookup(PortDirection::Input, &key)?;

        let internal = target.node;
        conn.rewrite(EndpointRewrite {
            side: Side::Recv,
            from: Endpoint::new(self.id, key),
            to: Endpoint::new(target.node, target.port),
        });
        self.graph.remove_input_by_connection(internal, &conn)?;
        Ok(())
    }

    /// Remove every input whose emitter lies outside this instance.
    /// Returns how many were removed.
    pub fn disconnect_all_inputs(&mut self) -> Result<usize> {
        let nodes = self.instance()?.nodes().to_vec();
        let mut external = Vec::new();
        for node in nodes {
            for &cid in &self.graph.node(node)?.inputs {
                let Some(emit) = self.graph.connection(cid).and_then(Connection::emit_node) else {
                    continue;
                };
                let emitter = self.graph.node(emit)?;
                if !self.suffix.is_member(&emitter.name) {
                    external.push(cid);
                }
            }
        }

        let count = external.len();
        for cid in external {
            self.graph.remove_connection(cid);
        }
        tracing::debug!("Macro {:?}: removed {} external inputs", self.id, count);
        Ok(count)
    }

    /// Make the display names of all visible macros in the naming scope unique.
    ///
    /// The scope is the whole enclosing graph, or the definition being
    /// loaded. Ordinary nodes keep their names. Among colliding macros the
    /// one built first keeps its name; later ones get `" (2)"`, `" (3)"`, ...
    /// appended.
    pub fn ensure_unique_name(&mut self) -> Result<()> {
        if !self.graph.is_macro_visible(self.id) {
            return Ok(());
        }
        let scope = self.graph.name_scope();

        let mut taken: HashSet<String> = self
            .graph
            .nodes()
            .filter(|(id, slot)| {
                id.index() >= scope.nodes && slot.reporter == SettingsReporter::Own
            })
            .map(|(_, slot)| slot.display())
            .collect();
        let macros: Vec<MacroId> = self
            .graph
            .macros()
            .map(|(id, _)| id)
            .filter(|&id| id.index() >= scope.macros && self.graph.is_macro_visible(id))
            .collect();

        for id in macros {
            let base = self.graph.macro_instance(id)?.name().to_string();
            let mut candidate = base.clone();
            let mut n = 2;
            while taken.contains(&format_display(&candidate, MACRO_TYPE_TAG)) {
                candidate = format!("{} ({})", base, n);
                n += 1;
            }
            if candidate != base {
                tracing::warn!(
                    "Macro name '{}' already used in this graph, renaming to '{}'",
                    base,
                    candidate
                );
                self.graph.macro_instance_mut(id)?.set_name(candidate.clone());
            }
            taken.insert(format_display(&candidate, MACRO_TYPE_TAG));
        }
        Ok(())
    }
}
