//! The graph store.
//!
//! `Graph` owns every node slot, every live connection and every macro
//! instance of an enclosing graph. Nodes and macros are addressed by index
//! (`NodeId`, `MacroId`); removed entries leave a tombstone so ids stay stable.
//!
//! The native operations here (`add_input`, `register_connection`,
//! `remove_input_by_connection`, ...) only ever see real nodes. Whenever a
//! caller names a macro endpoint, the call is routed through the macro's
//! redirector first (see `macro_node::redirect`).

use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::compiler::GraphCompiler;
use crate::graph::connection::Connection;
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::id::{ConnectionId, MacroId, NodeId, NodeRef};
use crate::graph::node::{AnyNode, NodeSlot, SettingsReporter};
use crate::graph::packet::Packet;
use crate::graph::port::{find_port, PortDirection};
use crate::graph::registry::NodeRegistry;
use crate::macro_node::instance::{MacroInstance, MacroParams};
use crate::macro_node::redirect::MacroHandle;

/// Sizes of the store at some point, for rolling back a failed construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphMark {
    pub(crate) nodes: usize,
    pub(crate) connections: usize,
    pub(crate) macros: usize,
}

/// An enclosing graph: nodes, connections and macro instances.
pub struct Graph {
    nodes: Vec<NodeSlot>,
    connections: Vec<Option<Connection>>,
    macros: Vec<Option<MacroInstance>>,
    registry: NodeRegistry,
    config: EngineConfig,
    /// Entries created before this mark are outside the current naming
    /// scope. Non-zero only while a definition is being loaded.
    name_scope: GraphMark,
}

impl Graph {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            nodes: Vec::new(),
            connections: Vec::new(),
            macros: Vec::new(),
            registry: NodeRegistry::new(),
            config,
            name_scope: GraphMark::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    // ── Nodes ──

    /// Add a node to the graph. Returns its NodeId.
    pub fn add_node(&mut self, name: impl Into<String>, node: impl Into<AnyNode>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot::new(name, node.into()));
        id
    }

    pub fn node(&self, id: NodeId) -> GraphResult<&NodeSlot> {
        self.nodes
            .get(id.index())
            .filter(|slot| !slot.deleted)
            .ok_or(GraphError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> GraphResult<&mut NodeSlot> {
        self.nodes
            .get_mut(id.index())
            .filter(|slot| !slot.deleted)
            .ok_or(GraphError::UnknownNode(id))
    }

    /// Live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &NodeSlot)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.deleted)
            .map(|(i, slot)| (NodeId(i as u32), slot))
    }

    /// Number of node slots, deleted ones included.
    pub fn node_capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_deleted(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).map_or(true, |slot| slot.deleted)
    }

    /// Find a live node by its exact (possibly suffixed) name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes()
            .find(|(_, slot)| slot.name == name)
            .map(|(id, _)| id)
    }

    /// Resolve a display identity (`"<name> [<Type>]"`) as it appears in a
    /// compact representation: visible macros first, then ordinary nodes.
    pub fn find_by_display(&self, display: &str) -> Option<NodeRef> {
        if let Some((id, _)) = self
            .macros()
            .find(|(id, m)| self.is_macro_visible(*id) && m.display() == display)
        {
            return Some(NodeRef::Macro(id));
        }
        self.nodes()
            .find(|(_, slot)| slot.reporter == SettingsReporter::Own && slot.display() == display)
            .map(|(id, _)| NodeRef::Node(id))
    }

    /// What a collector node has received, if `id` is a collector.
    pub fn collector_state(&self, id: NodeId) -> Option<&[Packet]> {
        self.node(id)
            .ok()
            .and_then(|slot| slot.node.as_collector())
            .map(|c| c.state())
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<()> {
        let slot = self.node(id)?;
        let touching: Vec<ConnectionId> = slot
            .inputs
            .iter()
            .chain(slot.outputs.iter())
            .copied()
            .collect();
        for cid in touching {
            self.remove_connection(cid);
        }
        let slot = self.node_mut(id)?;
        slot.removal_rewrites.clear();
        slot.deleted = true;
        tracing::debug!("Removed node {:?}", id);
        Ok(())
    }

    // ── Connections ──

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id.index()).and_then(Option::as_ref)
    }

    /// Live connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter_map(Option::as_ref)
    }

    pub fn input_connections(&self, node: NodeId) -> Vec<&Connection> {
        self.node(node)
            .map(|slot| {
                slot.inputs
                    .iter()
                    .filter_map(|&cid| self.connection(cid))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn output_connections(&self, node: NodeId) -> Vec<&Connection> {
        self.node(node)
            .map(|slot| {
                slot.outputs
                    .iter()
                    .filter_map(|&cid| self.connection(cid))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether a live connection runs directly from `emit` to `recv`.
    ///
    /// Always false when either side is a macro: macros never own connections.
    pub fn provides_input_to(&self, emit: impl Into<NodeRef>, recv: impl Into<NodeRef>) -> bool {
        let (emit, recv) = (emit.into(), recv.into());
        self.connections()
            .any(|conn| conn.emit.node == emit && conn.recv.node == recv)
    }

    /// Connect any emitter to any receiver; macro endpoints are redirected.
    pub fn connect(
        &mut self,
        emit: impl Into<NodeRef>,
        emit_port: &str,
        recv: impl Into<NodeRef>,
        recv_port: &str,
    ) -> Result<ConnectionId> {
        match recv.into() {
            NodeRef::Macro(id) => self.macro_mut(id)?.connect_input(emit, emit_port, recv_port),
            NodeRef::Node(id) => self.add_input(emit, emit_port, id, recv_port),
        }
    }

    /// Native input connection of a real node.
    ///
    /// When the emitter is a macro the connection is handed to that macro's
    /// output redirection before registration.
    pub fn add_input(
        &mut self,
        emit: impl Into<NodeRef>,
        emit_port: &str,
        recv: NodeId,
        recv_port: &str,
    ) -> Result<ConnectionId> {
        let slot = self.node(recv)?;
        if find_port(&slot.ports_in, recv_port).is_none() {
            return Err(GraphError::UnknownPort {
                node: slot.name.clone(),
                direction: PortDirection::Input,
                port: recv_port.to_string(),
            }
            .into());
        }

        let conn = Connection::new(emit, emit_port, recv, recv_port);
        match conn.emit.node {
            NodeRef::Macro(id) => self.macro_mut(id)?.accept_output_connection(conn),
            NodeRef::Node(_) => Ok(self.register_connection(conn)?),
        }
    }

    /// Check that a connection could be registered as is.
    pub fn validate_connection(&self, conn: &Connection) -> GraphResult<()> {
        let emit = match conn.emit.node {
            NodeRef::Node(id) => id,
            NodeRef::Macro(id) => return Err(GraphError::MacroEndpoint(id)),
        };
        let recv = match conn.recv.node {
            NodeRef::Node(id) => id,
            NodeRef::Macro(id) => return Err(GraphError::MacroEndpoint(id)),
        };

        let emit_slot = self.node(emit)?;
        if find_port(&emit_slot.ports_out, &conn.emit.port).is_none() {
            return Err(GraphError::UnknownPort {
                node: emit_slot.name.clone(),
                direction: PortDirection::Output,
                port: conn.emit.port.clone(),
            });
        }
        let recv_slot = self.node(recv)?;
        if find_port(&recv_slot.ports_in, &conn.recv.port).is_none() {
            return Err(GraphError::UnknownPort {
                node: recv_slot.name.clone(),
                direction: PortDirection::Input,
                port: conn.recv.port.clone(),
            });
        }

        if self.connections().any(|existing| existing.same_link(conn)) {
            return Err(GraphError::DuplicateConnection(self.describe_raw(conn)));
        }
        Ok(())
    }

    /// Native output registration: store a fully resolved connection.
    pub fn register_connection(&mut self, conn: Connection) -> GraphResult<ConnectionId> {
        self.validate_connection(&conn)?;
        let (Some(emit), Some(recv)) = (conn.emit_node(), conn.recv_node()) else {
            return Err(GraphError::ConnectionNotFound(self.describe_raw(&conn)));
        };

        let id = ConnectionId(self.connections.len() as u32);
        tracing::debug!("Connected {}", self.describe_raw(&conn));
        self.connections.push(Some(conn));
        self.nodes[emit.index()].outputs.push(id);
        self.nodes[recv.index()].inputs.push(id);
        Ok(id)
    }

    /// Native removal of one input of `recv`.
    ///
    /// The receiving node's recorded rewrite steps are applied in order first,
    /// so a connection described with macro endpoints finds its real link.
    pub fn remove_input_by_connection(&mut self, recv: NodeId, conn: &Connection) -> GraphResult<()> {
        let slot = self.node(recv)?;
        let mut resolved = conn.clone();
        for step in &slot.removal_rewrites {
            step.apply(&mut resolved);
        }

        let found = slot.inputs.iter().copied().find(|&cid| {
            self.connection(cid)
                .is_some_and(|existing| existing.same_link(&resolved))
        });
        let Some(cid) = found else {
            return Err(GraphError::ConnectionNotFound(self.describe_raw(&resolved)));
        };
        self.remove_connection(cid);
        Ok(())
    }

    /// Remove a connection described by its endpoints; macro endpoints are redirected.
    pub fn disconnect(&mut self, conn: Connection) -> Result<()> {
        match conn.recv.node {
            NodeRef::Macro(id) => self.macro_mut(id)?.disconnect_input(conn),
            NodeRef::Node(id) => Ok(self.remove_input_by_connection(id, &conn)?),
        }
    }

    /// Remove every input connection of a node. Returns how many were removed.
    pub fn remove_all_inputs(&mut self, node: NodeId) -> GraphResult<usize> {
        let inputs = self.node(node)?.inputs.clone();
        let count = inputs.len();
        for cid in inputs {
            self.remove_connection(cid);
        }
        Ok(count)
    }

    pub(crate) fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let conn = self.connections.get_mut(id.index())?.take()?;
        if let Some(emit) = conn.emit_node() {
            if let Some(slot) = self.nodes.get_mut(emit.index()) {
                slot.outputs.retain(|&c| c != id);
            }
        }
        if let Some(recv) = conn.recv_node() {
            if let Some(slot) = self.nodes.get_mut(recv.index()) {
                slot.inputs.retain(|&c| c != id);
            }
        }
        tracing::debug!("Disconnected {}", self.describe_raw(&conn));
        Some(conn)
    }

    /// Debug description using raw (suffixed) names.
    fn describe_raw(&self, conn: &Connection) -> String {
        let name = |node: NodeRef| match node {
            NodeRef::Node(id) => self
                .nodes
                .get(id.index())
                .map(|slot| slot.name.clone())
                .unwrap_or_else(|| id.to_string()),
            NodeRef::Macro(id) => self
                .macros
                .get(id.index())
                .and_then(Option::as_ref)
                .map(|m| m.name().to_string())
                .unwrap_or_else(|| id.to_string()),
        };
        format!(
            "{}.{} -> {}.{}",
            name(conn.emit.node),
            conn.emit.port,
            name(conn.recv.node),
            conn.recv.port
        )
    }

    // ── Macros ──

    /// Build a macro instance from a definition and add it to this graph.
    pub fn add_macro(&mut self, params: MacroParams) -> Result<MacroId> {
        MacroInstance::build(self, params, None)
    }

    pub fn macro_instance(&self, id: MacroId) -> GraphResult<&MacroInstance> {
        self.macros
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(GraphError::UnknownMacro(id))
    }

    pub(crate) fn macro_instance_mut(&mut self, id: MacroId) -> GraphResult<&mut MacroInstance> {
        self.macros
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(GraphError::UnknownMacro(id))
    }

    /// Operate on a macro: connect, disconnect, inspect.
    pub fn macro_mut(&mut self, id: MacroId) -> Result<MacroHandle<'_>> {
        MacroHandle::new(self, id)
    }

    /// Live macro instances, nested ones included.
    pub fn macros(&self) -> impl Iterator<Item = (MacroId, &MacroInstance)> {
        self.macros
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (MacroId(i as u32), m)))
    }

    /// Whether a macro represents itself in serialization, i.e. it is not
    /// nested inside another macro.
    pub fn is_macro_visible(&self, id: MacroId) -> bool {
        self.macro_instance(id)
            .ok()
            .and_then(|m| self.node(m.representative()).ok())
            .is_some_and(|slot| slot.reporter == SettingsReporter::Representative(id))
    }

    pub(crate) fn next_macro_id(&self) -> MacroId {
        MacroId(self.macros.len() as u32)
    }

    pub(crate) fn insert_macro(&mut self, instance: MacroInstance) -> MacroId {
        let id = self.next_macro_id();
        self.macros.push(Some(instance));
        id
    }

    /// Discard a macro instance together with its internal nodes.
    pub fn remove_macro(&mut self, id: MacroId) -> Result<()> {
        let nodes = self.macro_instance(id)?.nodes().to_vec();
        for node in nodes {
            self.remove_node(node)?;
        }
        self.macros[id.index()] = None;

        // Nested instances went down with their nodes.
        let orphaned: Vec<usize> = self
            .macros()
            .filter(|(_, m)| self.is_deleted(m.representative()))
            .map(|(mid, _)| mid.index())
            .collect();
        for index in orphaned {
            self.macros[index] = None;
        }

        for slot in &mut self.nodes {
            slot.removal_rewrites
                .retain(|step| step.macro_id() != Some(id));
        }
        tracing::info!("Removed macro {:?}", id);
        Ok(())
    }

    // ── Checkpoints ──

    pub fn mark(&self) -> GraphMark {
        GraphMark {
            nodes: self.nodes.len(),
            connections: self.connections.len(),
            macros: self.macros.len(),
        }
    }

    /// Live nodes created after `mark`, in id order.
    pub fn nodes_since(&self, mark: GraphMark) -> Vec<NodeId> {
        self.nodes()
            .filter(|(id, _)| id.index() >= mark.nodes)
            .map(|(id, _)| id)
            .collect()
    }

    /// Drop everything created after `mark`.
    pub fn rollback(&mut self, mark: GraphMark) {
        self.nodes.truncate(mark.nodes);
        self.connections.truncate(mark.connections);
        self.macros.truncate(mark.macros);
        for slot in &mut self.nodes {
            slot.inputs.retain(|c| c.index() < mark.connections);
            slot.outputs.retain(|c| c.index() < mark.connections);
            slot.removal_rewrites
                .retain(|step| step.macro_id().map_or(true, |m| m.index() < mark.macros));
        }
    }

    /// Start of the current naming scope.
    pub(crate) fn name_scope(&self) -> GraphMark {
        self.name_scope
    }

    /// Replace the naming scope, returning the previous one.
    pub(crate) fn replace_name_scope(&mut self, scope: GraphMark) -> GraphMark {
        std::mem::replace(&mut self.name_scope, scope)
    }

    // ── Traversal ──

    /// The connected component containing `start`, in id order.
    pub fn discover(&self, start: NodeId) -> Vec<NodeId> {
        GraphCompiler::discover(self, start)
    }

    /// Deterministic topological order of a node set.
    pub fn topological_order(&self, nodes: &[NodeId]) -> GraphResult<Vec<NodeId>> {
        GraphCompiler::topological_sort(self, nodes)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
