//! NoopNode: pass-through node.
//!
//! Everything arriving on `any` leaves on `any`, in order.

use crate::graph::node::{NodeContext, NodeStatus};
use crate::graph::nodes::ANY_PORT;
use crate::graph::port::Port;

pub struct NoopNode;

impl NoopNode {
    pub const TYPE_TAG: &'static str = "Noop";

    pub fn new() -> Self {
        Self
    }

    pub fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    pub fn ports_in(&self) -> Vec<Port> {
        vec![Port::new(ANY_PORT, "Any")]
    }

    pub fn ports_out(&self) -> Vec<Port> {
        vec![Port::new(ANY_PORT, "Any")]
    }

    pub fn on_data(&mut self, ctx: &mut NodeContext) -> NodeStatus {
        while let Some(packet) = ctx.inputs.pop(ANY_PORT) {
            ctx.emit(ANY_PORT, packet);
        }
        NodeStatus::Active
    }
}

impl Default for NoopNode {
    fn default() -> Self {
        Self::new()
    }
}
