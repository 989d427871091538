//! CollectorNode: numeric output adapter.
//!
//! Records every packet arriving on `any`; `state()` returns them in arrival order.

use crate::graph::node::{NodeContext, NodeStatus};
use crate::graph::nodes::ANY_PORT;
use crate::graph::packet::Packet;
use crate::graph::port::Port;

pub struct CollectorNode {
    received: Vec<Packet>,
}

impl CollectorNode {
    pub const TYPE_TAG: &'static str = "Collector";

    pub fn new() -> Self {
        Self {
            received: Vec::new(),
        }
    }

    pub fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    pub fn ports_in(&self) -> Vec<Port> {
        vec![Port::new(ANY_PORT, "Any")]
    }

    pub fn ports_out(&self) -> Vec<Port> {
        Vec::new()
    }

    pub fn on_start(&mut self) {
        self.received.clear();
    }

    pub fn on_data(&mut self, ctx: &mut NodeContext) -> NodeStatus {
        while let Some(packet) = ctx.inputs.pop(ANY_PORT) {
            self.received.push(packet);
        }
        NodeStatus::Active
    }

    /// Everything received so far.
    pub fn state(&self) -> &[Packet] {
        &self.received
    }
}

impl Default for CollectorNode {
    fn default() -> Self {
        Self::new()
    }
}
