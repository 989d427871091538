//! Error handling for flowmacro
//!
//! This module defines the crate error types and a Result alias for use
//! throughout the library.

use crate::graph::error::GraphError;
use crate::graph::port::PortDirection;
use std::path::PathBuf;
use thiserror::Error;

/// Why a subgraph definition could not be loaded.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The handle did not resolve to a file
    #[error("Definition '{handle}' not found (searched: {searched:?})")]
    NotFound {
        handle: String,
        searched: Vec<PathBuf>,
    },

    /// The file exists but could not be read
    #[error("Failed to read definition {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file could not be decoded as a compact graph
    #[error("Failed to parse definition {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A node entry names a type nobody registered
    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    /// A node entry key is not of the form "<name> [<Type>]"
    #[error("Invalid node entry '{0}'")]
    InvalidEntry(String),

    /// A node factory rejected its settings
    #[error("Invalid settings for '{entry}': {message}")]
    InvalidSettings { entry: String, message: String },

    /// A connection descriptor is malformed or names an unknown node
    #[error("Invalid connection descriptor: {0}")]
    InvalidDescriptor(String),

    /// The definition contains no nodes
    #[error("Definition {0:?} contains no nodes")]
    Empty(PathBuf),

    /// The nodes cannot be ordered topologically
    #[error("Definition {path:?} contains a cycle ({scheduled} of {total} nodes ordered)")]
    Cycle {
        path: PathBuf,
        scheduled: usize,
        total: usize,
    },

    /// Not every node is reachable from every other
    #[error("Definition {path:?} is not a single connected component ({reached} of {total} nodes reachable)")]
    Disconnected {
        path: PathBuf,
        reached: usize,
        total: usize,
    },
}

/// Main error type for flowmacro operations
#[derive(Error, Debug)]
pub enum MacroError {
    /// Errors loading a subgraph definition
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Two internal ports produced the same alias key
    #[error("Duplicate alias key '{key}'")]
    DuplicateAlias { key: String },

    /// A caller referenced a port the macro does not expose
    #[error("Macro '{macro_name}' has no {direction} port '{key}'")]
    UnknownPort {
        macro_name: String,
        direction: PortDirection,
        key: String,
    },

    /// Errors from the native graph operations
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MacroError>,
    },
}

impl MacroError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MacroError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping context wrappers
    pub fn root(&self) -> &MacroError {
        match self {
            MacroError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for flowmacro operations
pub type Result<T> = std::result::Result<T, MacroError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MacroError::DuplicateAlias {
            key: "Noop_any".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate alias key 'Noop_any'");
    }

    #[test]
    fn test_unknown_port_display() {
        let err = MacroError::UnknownPort {
            macro_name: "Macro: noop".to_string(),
            direction: PortDirection::Input,
            key: "Missing_any".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Macro 'Macro: noop' has no input port 'Missing_any'"
        );
    }

    #[test]
    fn test_error_with_context() {
        let err = MacroError::Config("bad".to_string());
        let with_ctx = err.with_context("Failed to load");
        assert!(with_ctx.to_string().contains("Failed to load"));
        assert!(matches!(with_ctx.root(), MacroError::Config(_)));
    }

    #[test]
    fn test_load_error_converts() {
        let err: MacroError = LoadError::UnknownNodeType("Blob".to_string()).into();
        assert!(err.to_string().contains("Unknown node type 'Blob'"));
    }
}
