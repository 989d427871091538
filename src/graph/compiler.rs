use super::compiled_plan::{ExecutionPlan, PlanStats, Route};
use super::error::{GraphError, GraphResult};
use super::id::NodeId;
use super::store::Graph;
use std::collections::{BTreeSet, HashMap};

/// Graph traversal, ordering and execution planning.
pub struct GraphCompiler;

impl GraphCompiler {
    /// Every node reachable from `start` following connections in either direction.
    ///
    /// The result is sorted by node id and includes `start`.
    pub fn discover(graph: &Graph, start: NodeId) -> Vec<NodeId> {
        let n = graph.node_capacity();
        if start.index() >= n {
            return Vec::new();
        }

        let (fwd_adj, bwd_adj) = Self::build_adjacency(graph);
        let mut reached = vec![false; n];
        let mut stack = vec![start.index()];
        reached[start.index()] = true;

        // DFS over the undirected view of the graph
        while let Some(node) = stack.pop() {
            for &neighbor in fwd_adj[node].iter().chain(bwd_adj[node].iter()) {
                if !reached[neighbor] {
                    reached[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }

        (0..n)
            .filter(|&i| reached[i])
            .map(|i| NodeId(i as u32))
            .collect()
    }

    /// Topological sort of `nodes` using Kahn's algorithm.
    ///
    /// Only connections between members of `nodes` count. Ties are broken by
    /// un-suffixed node name, then by id, so the order is deterministic.
    pub fn topological_sort(graph: &Graph, nodes: &[NodeId]) -> GraphResult<Vec<NodeId>> {
        let members: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut in_degree = vec![0usize; nodes.len()];

        for conn in graph.connections() {
            let (Some(from), Some(to)) = (conn.emit_node(), conn.recv_node()) else {
                continue;
            };
            if let (Some(&f), Some(&t)) = (members.get(&from), members.get(&to)) {
                adj[f].push(t);
                in_degree[t] += 1;
            }
        }

        let sort_key = |i: usize| -> (String, NodeId) {
            let id = nodes[i];
            let name = graph
                .node(id)
                .map(|slot| slot.display_name())
                .unwrap_or_default();
            (name, id)
        };

        let mut ready: BTreeSet<((String, NodeId), usize)> = (0..nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .map(|i| (sort_key(i), i))
            .collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(entry) = ready.pop_first() {
            let node = entry.1;
            order.push(nodes[node]);
            for &next in &adj[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert((sort_key(next), next));
                }
            }
        }

        if order.len() != nodes.len() {
            return Err(GraphError::CycleDetected {
                scheduled: order.len(),
                total: nodes.len(),
            });
        }

        Ok(order)
    }

    /// Compile every live node of the graph into an execution plan.
    pub fn compile(graph: &Graph) -> GraphResult<ExecutionPlan> {
        let start_time = std::time::Instant::now();

        let live: Vec<NodeId> = graph.nodes().map(|(id, _)| id).collect();
        if live.is_empty() {
            return Ok(ExecutionPlan::new());
        }

        let order: Vec<usize> = Self::topological_sort(graph, &live)?
            .into_iter()
            .map(NodeId::index)
            .collect();

        let routes: Vec<Route> = graph
            .connections()
            .filter_map(|conn| {
                Some(Route {
                    from: conn.emit_node()?.index(),
                    from_port: conn.emit.port.clone(),
                    to: conn.recv_node()?.index(),
                    to_port: conn.recv.port.clone(),
                })
            })
            .collect();

        let mut source_nodes = 0;
        let mut sink_nodes = 0;
        let mut unconnected_sinks = Vec::new();
        for (id, slot) in graph.nodes() {
            if slot.ports_in.is_empty() {
                source_nodes += 1;
            }
            if slot.ports_out.is_empty() {
                sink_nodes += 1;
                if slot.inputs.is_empty() {
                    unconnected_sinks.push(id.index());
                }
            }
        }

        let stats = PlanStats {
            total_nodes: live.len(),
            source_nodes,
            sink_nodes,
            compile_time_us: start_time.elapsed().as_micros() as u64,
        };

        Ok(ExecutionPlan {
            order,
            routes,
            stats,
            unconnected_sinks,
        })
    }

    /// Build forward and backward adjacency lists over live connections
    fn build_adjacency(graph: &Graph) -> (Vec<Vec<usize>>, Vec<Vec<usize>>) {
        let n = graph.node_capacity();
        let mut fwd_adj = vec![Vec::new(); n];
        let mut bwd_adj = vec![Vec::new(); n];

        for conn in graph.connections() {
            let (Some(from), Some(to)) = (conn.emit_node(), conn.recv_node()) else {
                continue;
            };
            // Skip edges involving deleted nodes
            if from.index() >= n || to.index() >= n || graph.is_deleted(from) || graph.is_deleted(to)
            {
                continue;
            }

            fwd_adj[from.index()].push(to.index());
            bwd_adj[to.index()].push(from.index());
        }

        (fwd_adj, bwd_adj)
    }
}
