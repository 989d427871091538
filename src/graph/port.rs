//! Port descriptors for the node system.
//!
//! Each node declares its ports (inputs/outputs) as ordered `Port` lists.
//! The graph uses these to validate connections; macros use them to build
//! their alias ports.

use serde::{Deserialize, Serialize};

/// The kind of value flowing through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PortKind {
    /// Anything goes.
    #[default]
    Any,
    /// Scalar numbers.
    Number,
    /// Arrays of values (lists, grids).
    Array,
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// A named connection point on a node. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    key: String,
    label: String,
    optional: bool,
    kind: PortKind,
}

impl Port {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            optional: false,
            kind: PortKind::Any,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn kind(mut self, kind: PortKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn port_kind(&self) -> PortKind {
        self.kind
    }
}

/// Find a port by key in an ordered port list.
pub fn find_port<'a>(ports: &'a [Port], key: &str) -> Option<&'a Port> {
    ports.iter().find(|p| p.key() == key)
}
