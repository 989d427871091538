//! Values moving between nodes.
//!
//! A `Packet` is a JSON value, so scalars, lists and grids all travel the
//! same way. Each node slot owns one `PortQueues` with a FIFO per input port.

use std::collections::{HashMap, VecDeque};

/// A single value on a connection.
pub type Packet = serde_json::Value;

/// Pending packets per input port key.
#[derive(Debug, Default, Clone)]
pub struct PortQueues {
    queues: HashMap<String, VecDeque<Packet>>,
}

impl PortQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a packet on an input port.
    pub fn push(&mut self, port: &str, packet: Packet) {
        self.queues
            .entry(port.to_string())
            .or_default()
            .push_back(packet);
    }

    /// Dequeue the oldest packet of an input port.
    pub fn pop(&mut self, port: &str) -> Option<Packet> {
        self.queues.get_mut(port).and_then(VecDeque::pop_front)
    }

    /// Number of packets waiting on a port.
    pub fn len(&self, port: &str) -> usize {
        self.queues.get(port).map_or(0, VecDeque::len)
    }

    /// Whether no port has anything waiting.
    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    pub fn clear(&mut self) {
        self.queues.clear();
    }
}
