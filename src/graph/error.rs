//! Graph-store error types.

use crate::graph::id::{MacroId, NodeId};
use crate::graph::port::PortDirection;
use thiserror::Error;

/// Errors raised by the native graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Unknown macro {0:?}")]
    UnknownMacro(MacroId),

    #[error("Node '{node}' has no {direction} port '{port}'")]
    UnknownPort {
        node: String,
        direction: PortDirection,
        port: String,
    },

    #[error("Connection already exists: {0}")]
    DuplicateConnection(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Macro {0:?} cannot be a live connection endpoint")]
    MacroEndpoint(MacroId),

    #[error("Node '{name}' error: {message}")]
    Node { name: String, message: String },

    #[error("Cycle detected in graph: {scheduled} of {total} nodes scheduled")]
    CycleDetected { scheduled: usize, total: usize },

    #[error("Executor tick limit of {0} reached before the graph drained")]
    TickLimit(u64),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_port_display() {
        let err = GraphError::UnknownPort {
            node: "Noop".to_string(),
            direction: PortDirection::Input,
            port: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "Node 'Noop' has no input port 'missing'");
    }
}
