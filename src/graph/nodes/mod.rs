//! Built-in leaf node implementations.

pub mod collector;
pub mod noop;
pub mod value_source;

pub use collector::CollectorNode;
pub use noop::NoopNode;
pub use value_source::ValueSourceNode;

/// Port key shared by all built-in nodes.
pub const ANY_PORT: &str = "any";
