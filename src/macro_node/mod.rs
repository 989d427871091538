//! Macro nodes: a whole subgraph presented to the enclosing graph as one node.
//!
//! A macro owns no live connection and adds nothing at run time. It is a
//! bookkeeping layer over real nodes that already live in the enclosing
//! graph:
//!
//! - [`loader`] instantiates a definition and orders its nodes.
//! - [`aggregator`] exposes every internal port under an alias key.
//! - [`suffix`] keeps internal node names unique across instances.
//! - [`redirect`] rewrites connect/disconnect calls to internal nodes.
//! - [`reporter`] makes serialization show only the macro boundary.
//!
//! # Example
//!
//! ```ignore
//! use flowmacro::graph::{Graph, nodes::{CollectorNode, ValueSourceNode}};
//! use flowmacro::macro_node::MacroParams;
//!
//! let mut graph = Graph::new();
//! let src = graph.add_node("source", ValueSourceNode::new(vec![100.into()]));
//! let sink = graph.add_node("sink", CollectorNode::new());
//! let noop = graph.add_macro(MacroParams::new("definitions/noop.json"))?;
//!
//! graph.connect(src, "any", noop, "Noop_any")?;
//! graph.connect(noop, "Noop_any", sink, "any")?;
//! ```

pub mod aggregator;
pub mod instance;
pub mod loader;
pub mod redirect;
pub mod reporter;
pub mod suffix;

pub use aggregator::{alias_key, AliasMap, AliasTarget};
pub use instance::{default_name, MacroInstance, MacroParams, MacroSettings, MACRO_TYPE_TAG};
pub use loader::{load_subgraph, resolve_definition, Subgraph};
pub use redirect::MacroHandle;
pub use reporter::{describe_connection, SettingsReport};
pub use suffix::{strip_instance_suffixes, InstanceSuffix};
