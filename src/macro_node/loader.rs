//! Subgraph loading.
//!
//! A definition handle is a path to a compact graph document. Loading it
//! instantiates every node and connection into the enclosing graph, checks
//! that the result is one connected component and orders it topologically.

use crate::config::EngineConfig;
use crate::error::{LoadError, MacroError, Result};
use crate::graph::compact::{CompactGraph, DefinitionFormat};
use crate::graph::error::GraphError;
use crate::graph::id::NodeId;
use crate::graph::store::Graph;
use std::path::{Path, PathBuf};

/// The nodes of one loaded definition, in topological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subgraph {
    nodes: Vec<NodeId>,
}

impl Subgraph {
    pub fn new(nodes: Vec<NodeId>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Find the file behind a definition handle.
///
/// Absolute handles are used as is. Relative ones are tried against the
/// including definition's directory, each configured definition directory
/// and finally the working directory.
pub fn resolve_definition(
    handle: &Path,
    base_dir: Option<&Path>,
    config: &EngineConfig,
) -> std::result::Result<PathBuf, LoadError> {
    let candidates: Vec<PathBuf> = if handle.is_absolute() {
        vec![handle.to_path_buf()]
    } else {
        base_dir
            .into_iter()
            .chain(config.definition_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(handle))
            .chain(std::iter::once(handle.to_path_buf()))
            .collect()
    };

    match candidates.iter().find(|path| path.is_file()) {
        Some(path) => Ok(path.clone()),
        None => Err(LoadError::NotFound {
            handle: handle.display().to_string(),
            searched: candidates,
        }),
    }
}

/// Read and decode a definition file.
pub fn read_definition(path: &Path) -> std::result::Result<CompactGraph, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    CompactGraph::parse(&content, DefinitionFormat::from_path(path)).map_err(|e| {
        LoadError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}

/// Instantiate a definition into `graph` and return its sorted nodes.
///
/// On failure nothing created by the attempt is left in the graph.
pub fn load_subgraph(graph: &mut Graph, handle: &Path, base_dir: Option<&Path>) -> Result<Subgraph> {
    let path = resolve_definition(handle, base_dir, graph.config())?;
    let compact = read_definition(&path)?;
    if compact.nodes.is_empty() {
        return Err(LoadError::Empty(path).into());
    }

    // A definition names its entries independently of the enclosing graph.
    let mark = graph.mark();
    let outer_scope = graph.replace_name_scope(mark);
    let result = instantiate(graph, &compact, &path);
    graph.replace_name_scope(outer_scope);

    match result {
        Ok(subgraph) => {
            tracing::debug!("Loaded {:?}: {} nodes", path, subgraph.len());
            Ok(subgraph)
        }
        Err(e) => {
            tracing::debug!("Loading {:?} failed, rolling back: {}", path, e);
            graph.rollback(mark);
            Err(e)
        }
    }
}

fn instantiate(graph: &mut Graph, compact: &CompactGraph, path: &Path) -> Result<Subgraph> {
    let mark = graph.mark();
    graph.extend_from_compact(compact, path.parent())?;

    let created = graph.nodes_since(mark);
    let Some(&first) = created.first() else {
        return Err(LoadError::Empty(path.to_path_buf()).into());
    };

    let reached = graph.discover(first);
    if reached != created {
        return Err(LoadError::Disconnected {
            path: path.to_path_buf(),
            reached: reached.len(),
            total: created.len(),
        }
        .into());
    }

    let order = graph
        .topological_order(&created)
        .map_err(|e| match e {
            GraphError::CycleDetected { scheduled, total } => LoadError::Cycle {
                path: path.to_path_buf(),
                scheduled,
                total,
            }
            .into(),
            other => MacroError::from(other),
        })?;

    Ok(Subgraph::new(order))
}
