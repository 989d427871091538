/// Compiled execution plan for a graph.
/// Contains every live node in topological order plus pre-resolved routes.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Node indices in topological order
    pub order: Vec<usize>,

    /// Pre-computed routing, one entry per live connection
    pub routes: Vec<Route>,

    /// Compilation statistics
    pub stats: PlanStats,

    /// Sink nodes with no incoming connection
    pub unconnected_sinks: Vec<usize>,
}

/// A live connection resolved to node indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub from: usize,
    pub from_port: String,
    pub to: usize,
    pub to_port: String,
}

/// Statistics about the compiled plan
#[derive(Debug, Clone, Default)]
pub struct PlanStats {
    /// Number of live nodes in the graph
    pub total_nodes: usize,

    /// Number of source nodes (no input ports)
    pub source_nodes: usize,

    /// Number of sink nodes (no output ports)
    pub sink_nodes: usize,

    /// Compilation time in microseconds
    pub compile_time_us: u64,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            routes: Vec::new(),
            stats: PlanStats::default(),
            unconnected_sinks: Vec::new(),
        }
    }

    /// Check if the plan has any nodes
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Routes leaving a node's output port.
    pub fn routes_from<'a>(&'a self, from: usize, port: &'a str) -> impl Iterator<Item = &'a Route> {
        self.routes
            .iter()
            .filter(move |r| r.from == from && r.from_port == port)
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}
