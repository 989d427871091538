//! The enclosing dataflow graph.
//!
//! Nodes with typed ports are wired by connections from output ports to input
//! ports. The graph is the only owner of live connections; macros built on
//! top of it (see `macro_node`) redirect every connect/disconnect call to
//! their real internal nodes.
//!
//! # Architecture
//!
//! ```text
//! [ValueSource] ──► [Macro: noop] ──► [Collector]
//!                    └ Noop[[m:1]]
//!
//! live connections:  ValueSource.any -> Noop[[m:1]].any -> Collector.any
//! ```
//!
//! # Design
//!
//! - **Arena storage**: nodes, connections and macros live in `Vec`s indexed
//!   by `NodeId`, `ConnectionId`, `MacroId`; removal leaves a tombstone.
//! - **Enum dispatch**: `BuiltinNode` for the built-in leaf nodes,
//!   `NodePlugin` trait objects for everything else.
//! - **Deterministic order**: topological sort with a lexical tie-break.
//! - **Dedicated thread**: `Executor::spawn` moves the graph onto its own
//!   thread and hands it back on `join`.

pub mod compact;
pub mod compiled_plan;
pub mod compiler;
pub mod connection;
pub mod error;
pub mod executor;
pub mod id;
pub mod node;
pub mod nodes;
pub mod packet;
pub mod port;
pub mod registry;
mod serialize;
pub mod store;

pub use compact::{CompactGraph, DefinitionFormat, Descriptor};
pub use compiled_plan::{ExecutionPlan, PlanStats, Route};
pub use compiler::GraphCompiler;
pub use connection::{Connection, Endpoint, EndpointRewrite, Side};
pub use error::{GraphError, GraphResult};
pub use executor::{Executor, ExecutorEvent, ExecutorHandle, RunStats};
pub use id::{ConnectionId, MacroId, NodeId, NodeRef};
pub use node::{
    AnyNode, BuiltinNode, NodeContext, NodePlugin, NodeSlot, NodeStatus, Settings,
    SettingsReporter,
};
pub use packet::{Packet, PortQueues};
pub use port::{Port, PortDirection, PortKind};
pub use registry::{NodeFactory, NodeRegistry};
pub use store::{Graph, GraphMark};
