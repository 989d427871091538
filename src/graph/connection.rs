//! Connections between node ports.
//!
//! A `Connection` is declared by a caller with endpoints that may name a
//! macro. Before it reaches the graph store every macro endpoint is rewritten
//! to the real internal node; each rewrite is recorded as an
//! `EndpointRewrite` step so it can be replayed (on removal) and rendered
//! back (on serialization).

use crate::graph::id::{MacroId, NodeId, NodeRef};
use std::fmt;

/// One side of a connection: a node (or macro) and a port key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: NodeRef,
    pub port: String,
}

impl Endpoint {
    pub fn new(node: impl Into<NodeRef>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            NodeRef::Node(id) => write!(f, "{}.{}", id, self.port),
            NodeRef::Macro(id) => write!(f, "macro {}.{}", id, self.port),
        }
    }
}

/// Which end of a connection a rewrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Emit,
    Recv,
}

/// Replace `from` with `to` on one side of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointRewrite {
    pub side: Side,
    /// The declared macro endpoint (macro + alias key).
    pub from: Endpoint,
    /// The real internal endpoint.
    pub to: Endpoint,
}

impl EndpointRewrite {
    /// The macro that contributed this step.
    pub fn macro_id(&self) -> Option<MacroId> {
        match self.from.node {
            NodeRef::Macro(id) => Some(id),
            NodeRef::Node(_) => None,
        }
    }

    /// Apply the step if the connection's endpoint matches. Returns whether it did.
    pub fn apply(&self, conn: &mut Connection) -> bool {
        let endpoint = match self.side {
            Side::Emit => &mut conn.emit,
            Side::Recv => &mut conn.recv,
        };
        if *endpoint == self.from {
            *endpoint = self.to.clone();
            true
        } else {
            false
        }
    }
}

/// A directed link from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub emit: Endpoint,
    pub recv: Endpoint,
    /// Rewrite steps applied so far, oldest first.
    pub rewrites: Vec<EndpointRewrite>,
}

impl Connection {
    pub fn new(
        emit_node: impl Into<NodeRef>,
        emit_port: impl Into<String>,
        recv_node: impl Into<NodeRef>,
        recv_port: impl Into<String>,
    ) -> Self {
        Self {
            emit: Endpoint::new(emit_node, emit_port),
            recv: Endpoint::new(recv_node, recv_port),
            rewrites: Vec::new(),
        }
    }

    /// Whether both endpoints are real nodes.
    pub fn is_resolved(&self) -> bool {
        !self.emit.node.is_macro() && !self.recv.node.is_macro()
    }

    pub fn emit_node(&self) -> Option<NodeId> {
        self.emit.node.as_node()
    }

    pub fn recv_node(&self) -> Option<NodeId> {
        self.recv.node.as_node()
    }

    /// Apply a rewrite step and record it.
    pub fn rewrite(&mut self, step: EndpointRewrite) -> bool {
        let applied = step.apply(self);
        if applied {
            self.rewrites.push(step);
        }
        applied
    }

    /// The recorded rewrites for one side, oldest first.
    pub fn rewrites_for(&self, side: Side) -> impl DoubleEndedIterator<Item = &EndpointRewrite> {
        self.rewrites.iter().filter(move |step| step.side == side)
    }

    /// Same emit and receive endpoints, ignoring recorded rewrites.
    pub fn same_link(&self, other: &Connection) -> bool {
        self.emit == other.emit && self.recv == other.recv
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.emit, self.recv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(side: Side, alias: &str, node: u32) -> EndpointRewrite {
        EndpointRewrite {
            side,
            from: Endpoint::new(MacroId(0), alias),
            to: Endpoint::new(NodeId(node), "any"),
        }
    }

    #[test]
    fn test_rewrite_emit_side() {
        let mut conn = Connection::new(MacroId(0), "Noop_any", NodeId(5), "any");
        assert!(!conn.is_resolved());

        assert!(conn.rewrite(step(Side::Emit, "Noop_any", 2)));
        assert!(conn.is_resolved());
        assert_eq!(conn.emit_node(), Some(NodeId(2)));
        assert_eq!(conn.rewrites_for(Side::Emit).count(), 1);
        assert_eq!(conn.rewrites_for(Side::Recv).count(), 0);
    }

    #[test]
    fn test_latest_rewrite_first_when_reversed() {
        let mut conn = Connection::new(MacroId(0), "Noop_any", NodeId(5), "any");
        conn.rewrite(step(Side::Emit, "Noop_any", 2));
        conn.rewrite(EndpointRewrite {
            side: Side::Emit,
            from: Endpoint::new(NodeId(2), "any"),
            to: Endpoint::new(NodeId(7), "any"),
        });

        let latest = conn.rewrites_for(Side::Emit).rev().next().unwrap();
        assert_eq!(latest.to, Endpoint::new(NodeId(7), "any"));
        assert_eq!(latest.macro_id(), None);
    }

    #[test]
    fn test_non_matching_step_is_not_recorded() {
        let mut conn = Connection::new(MacroId(0), "Other_any", NodeId(5), "any");
        assert!(!conn.rewrite(step(Side::Emit, "Noop_any", 2)));
        assert!(conn.rewrites.is_empty());
    }

    #[test]
    fn test_steps_apply_in_sequence() {
        // Outer alias resolves to an inner alias, which resolves to a node.
        let outer = EndpointRewrite {
            side: Side::Recv,
            from: Endpoint::new(MacroId(1), "Inner_any"),
            to: Endpoint::new(MacroId(0), "Noop_any"),
        };
        let inner = step(Side::Recv, "Noop_any", 9);

        let mut conn = Connection::new(NodeId(3), "any", MacroId(1), "Inner_any");
        for s in [&outer, &inner] {
            s.apply(&mut conn);
        }
        assert_eq!(conn.recv_node(), Some(NodeId(9)));
    }

    #[test]
    fn test_same_link_ignores_history() {
        let mut a = Connection::new(MacroId(0), "Noop_any", NodeId(5), "any");
        a.rewrite(step(Side::Emit, "Noop_any", 2));
        let b = Connection::new(NodeId(2), "any", NodeId(5), "any");
        assert!(a.same_link(&b));
        assert_ne!(a, b);
    }
}
