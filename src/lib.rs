//! # flowmacro: subgraphs as single nodes
//!
//! A dataflow graph library in which an already-defined subgraph can be used
//! as one opaque node, a *macro*. Macros keep the runtime exact (data flows
//! directly between the real internal nodes) and keep serialization exact
//! (the saved graph only shows the macro boundary and reloads into an
//! equivalent, executable graph).
//!
//! ## Architecture
//!
//! - **Graph**: arena of nodes, ports and connections with native
//!   connect/remove operations, a topological planner and a tick executor
//! - **Macro nodes**: loader, port aggregation, instance suffixes,
//!   connection redirection and settings reporting
//! - **Compact form**: `{"Nodes": {...}, "Inputs": [...]}` as JSON or TOML
//! - **Communication**: a spawned executor reports over crossbeam channels
//!
//! ## Configuration
//!
//! Engine configuration is stored in the platform-appropriate data directory
//! under `dev.flowmacro` (see [`config`]).
//!
//! ## Example
//!
//! ```ignore
//! use flowmacro::{config::EngineConfig, graph::{Executor, Graph}};
//!
//! let mut graph = Graph::load_file("pipeline.json", EngineConfig::load_or_default())?;
//! Executor::run_to_completion(&mut graph)?;
//! println!("{}", graph.to_compact_all()?.to_json_string()?);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod macro_node;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{LoadError, MacroError, Result, ResultExt};
pub use graph::{CompactGraph, Executor, Graph, MacroId, NodeId, NodeRef};
pub use macro_node::{InstanceSuffix, MacroHandle, MacroInstance, MacroParams};
