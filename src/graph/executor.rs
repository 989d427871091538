//! Graph executor: the tick loop.
//!
//! Each tick:
//! 1. Execute every live node in topological order.
//! 2. Route each emitted packet to the input queues of its receivers.
//! 3. Rate-limit to the configured Hz (unthrottled when 0).
//!
//! A run ends when every source node has finished, every input queue is empty
//! and the last tick delivered nothing. Macros are invisible here: the plan
//! only ever contains real nodes and real connections.

use crate::config::ExecutorConfig;
use crate::graph::compiled_plan::ExecutionPlan;
use crate::graph::compiler::GraphCompiler;
use crate::graph::error::{GraphError, GraphResult};
use crate::graph::id::NodeId;
use crate::graph::node::{NodeContext, NodeStatus};
use crate::graph::packet::PortQueues;
use crate::graph::store::Graph;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub ticks: u64,
    pub packets_delivered: u64,
    /// True when the run was interrupted through the stop flag.
    pub stopped: bool,
}

/// Progress notifications from a spawned executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorEvent {
    Started,
    Finished(RunStats),
    Failed(String),
}

pub struct Executor {
    graph: Graph,
    config: ExecutorConfig,
    queues: Vec<PortQueues>,
    finished: Vec<bool>,
    tick: u64,
    running: Arc<AtomicBool>,
    last_tick_time: Option<Instant>,
}

impl Executor {
    /// Take ownership of a graph; limits come from its configuration.
    pub fn new(graph: Graph) -> Self {
        let config = graph.config().executor.clone();
        Self {
            graph,
            config,
            queues: Vec::new(),
            finished: Vec::new(),
            tick: 0,
            running: Arc::new(AtomicBool::new(true)),
            last_tick_time: None,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Flag that keeps the loop going; clearing it stops the run after the current tick.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Run a graph in place until it drains.
    pub fn run_to_completion(graph: &mut Graph) -> GraphResult<RunStats> {
        let mut executor = Executor::new(std::mem::take(graph));
        let result = executor.run();
        *graph = executor.into_graph();
        result
    }

    /// Move a graph onto a dedicated thread and run it there.
    pub fn spawn(graph: Graph) -> crate::Result<ExecutorHandle> {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let mut executor = Executor::new(graph);
        let running = executor.running_flag();

        let thread = std::thread::Builder::new()
            .name("flowmacro-executor".to_string())
            .spawn(move || {
                let result = executor.run_reporting(&event_tx);
                (executor.into_graph(), result)
            })?;

        Ok(ExecutorHandle {
            running,
            events: event_rx,
            thread: Some(thread),
        })
    }

    fn run_reporting(&mut self, events: &Sender<ExecutorEvent>) -> GraphResult<RunStats> {
        let _ = events.send(ExecutorEvent::Started);
        let result = self.run();
        let event = match &result {
            Ok(stats) => ExecutorEvent::Finished(*stats),
            Err(e) => ExecutorEvent::Failed(e.to_string()),
        };
        let _ = events.send(event);
        result
    }

    /// Run until the graph drains, the stop flag clears or the tick limit is hit.
    pub fn run(&mut self) -> GraphResult<RunStats> {
        let plan = GraphCompiler::compile(&self.graph)?;
        tracing::info!(
            "Executor starting: {} nodes ({} sources, {} sinks), plan compiled in {}us",
            plan.stats.total_nodes,
            plan.stats.source_nodes,
            plan.stats.sink_nodes,
            plan.stats.compile_time_us,
        );
        for &idx in &plan.unconnected_sinks {
            if let Ok(slot) = self.graph.node(NodeId(idx as u32)) {
                tracing::warn!("Sink node '{}' has no incoming connection", slot.display());
            }
        }

        self.activate_all(&plan);

        let mut stats = RunStats::default();
        let result = loop {
            if !self.running.load(Ordering::Relaxed) {
                stats.stopped = true;
                break Ok(stats);
            }
            if self.tick >= self.config.max_ticks {
                tracing::warn!("Tick limit {} reached", self.config.max_ticks);
                break Err(GraphError::TickLimit(self.config.max_ticks));
            }

            let delivered = match self.tick_once(&plan) {
                Ok(delivered) => delivered,
                Err(e) => break Err(e),
            };
            stats.ticks += 1;
            stats.packets_delivered += delivered;

            if delivered == 0 && self.is_drained(&plan) {
                break Ok(stats);
            }
            self.rate_limit();
        };

        self.deactivate_all(&plan);
        if let Ok(stats) = &result {
            tracing::info!(
                "Executor finished after {} ticks, {} packets delivered",
                stats.ticks,
                stats.packets_delivered
            );
        }
        result
    }

    fn activate_all(&mut self, plan: &ExecutionPlan) {
        let capacity = self.graph.node_capacity();
        self.queues = vec![PortQueues::new(); capacity];
        self.finished = vec![false; capacity];
        self.tick = 0;
        self.last_tick_time = None;

        for &idx in &plan.order {
            if let Ok(slot) = self.graph.node_mut(NodeId(idx as u32)) {
                slot.node.on_start();
            }
        }
    }

    fn deactivate_all(&mut self, plan: &ExecutionPlan) {
        for &idx in &plan.order {
            if let Ok(slot) = self.graph.node_mut(NodeId(idx as u32)) {
                slot.node.on_stop();
            }
        }
    }

    /// Execute one tick. Returns the number of packets delivered.
    fn tick_once(&mut self, plan: &ExecutionPlan) -> GraphResult<u64> {
        self.last_tick_time = Some(Instant::now());
        let mut delivered = 0;

        for &idx in &plan.order {
            let mut outputs = Vec::new();
            let slot = self.graph.node_mut(NodeId(idx as u32))?;
            let mut ctx = NodeContext {
                inputs: &mut self.queues[idx],
                outputs: &mut outputs,
                tick: self.tick,
            };
            if slot.node.on_data(&mut ctx) == NodeStatus::Finished && !self.finished[idx] {
                tracing::debug!("Node '{}' finished at tick {}", slot.name, self.tick);
                self.finished[idx] = true;
            }

            for (port, packet) in outputs {
                for route in plan.routes_from(idx, &port) {
                    self.queues[route.to].push(&route.to_port, packet.clone());
                    delivered += 1;
                }
            }
        }

        self.tick += 1;
        Ok(delivered)
    }

    fn is_drained(&self, plan: &ExecutionPlan) -> bool {
        let sources_done = plan.order.iter().all(|&idx| {
            self.finished[idx]
                || self
                    .graph
                    .node(NodeId(idx as u32))
                    .map_or(true, |slot| !slot.ports_in.is_empty())
        });
        sources_done && self.queues.iter().all(PortQueues::is_empty)
    }

    fn rate_limit(&self) {
        if self.config.tick_rate_hz == 0 {
            return;
        }

        let target_interval = Duration::from_nanos(1_000_000_000 / self.config.tick_rate_hz as u64);

        if let Some(last) = self.last_tick_time {
            let elapsed = last.elapsed();
            if elapsed < target_interval {
                let remaining = target_interval - elapsed;
                // Spin for sub-millisecond accuracy, sleep for larger waits
                if remaining > Duration::from_millis(2) {
                    std::thread::sleep(remaining - Duration::from_millis(1));
                }
                while last.elapsed() < target_interval {
                    std::hint::spin_loop();
                }
            }
        }
    }
}

/// Handle to an executor running on its own thread.
pub struct ExecutorHandle {
    running: Arc<AtomicBool>,
    events: Receiver<ExecutorEvent>,
    thread: Option<JoinHandle<(Graph, GraphResult<RunStats>)>>,
}

impl ExecutorHandle {
    /// Ask the loop to stop after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn events(&self) -> &Receiver<ExecutorEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the thread and take the graph back.
    pub fn join(mut self) -> (Graph, GraphResult<RunStats>) {
        let Some(thread) = self.thread.take() else {
            return (Graph::new(), Err(executor_lost("already joined")));
        };
        match thread.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!("Executor thread panicked");
                (Graph::new(), Err(executor_lost("thread panicked")))
            }
        }
    }
}

impl Drop for ExecutorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn executor_lost(message: &str) -> GraphError {
    GraphError::Node {
        name: "executor".to_string(),
        message: message.to_string(),
    }
}
