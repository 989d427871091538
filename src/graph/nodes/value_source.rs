//! ValueSourceNode: numeric input adapter.
//!
//! Emits one element of its `data` setting per tick on `any`, then reports
//! `Finished`. A list of rows is emitted row by row.

use crate::graph::node::{NodeContext, NodeStatus, Settings};
use crate::graph::nodes::ANY_PORT;
use crate::graph::packet::Packet;
use crate::graph::port::Port;
use serde_json::Value;

pub struct ValueSourceNode {
    data: Vec<Packet>,
    cursor: usize,
}

impl ValueSourceNode {
    pub const TYPE_TAG: &'static str = "ValueSource";

    pub fn new(data: Vec<Packet>) -> Self {
        Self { data, cursor: 0 }
    }

    /// Build from the `data` setting. A missing setting yields an empty source.
    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        match settings.get("data") {
            None => Ok(Self::new(Vec::new())),
            Some(Value::Array(items)) => Ok(Self::new(items.clone())),
            Some(other) => Err(format!("'data' must be an array, got {}", other)),
        }
    }

    pub fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    pub fn ports_in(&self) -> Vec<Port> {
        Vec::new()
    }

    pub fn ports_out(&self) -> Vec<Port> {
        vec![Port::new(ANY_PORT, "Any")]
    }

    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new();
        settings.insert("data".to_string(), Value::Array(self.data.clone()));
        settings
    }

    pub fn on_start(&mut self) {
        self.cursor = 0;
    }

    pub fn on_data(&mut self, ctx: &mut NodeContext) -> NodeStatus {
        if let Some(item) = self.data.get(self.cursor) {
            ctx.emit(ANY_PORT, item.clone());
            self.cursor += 1;
        }
        if self.cursor >= self.data.len() {
            NodeStatus::Finished
        } else {
            NodeStatus::Active
        }
    }

    pub fn data(&self) -> &[Packet] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::packet::PortQueues;
    use serde_json::json;

    #[test]
    fn test_emits_one_item_per_tick() {
        let mut node = ValueSourceNode::new(vec![json!(1), json!(2)]);
        let mut inputs = PortQueues::new();
        let mut outputs = Vec::new();

        let mut ctx = NodeContext {
            inputs: &mut inputs,
            outputs: &mut outputs,
            tick: 0,
        };
        assert_eq!(node.on_data(&mut ctx), NodeStatus::Active);
        assert_eq!(node.on_data(&mut ctx), NodeStatus::Finished);
        assert_eq!(node.on_data(&mut ctx), NodeStatus::Finished);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[1].1, json!(2));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::new();
        settings.insert("data".to_string(), json!([100]));
        let node = ValueSourceNode::from_settings(&settings).unwrap();
        assert_eq!(node.data(), &[json!(100)]);
        assert_eq!(node.settings(), settings);

        settings.insert("data".to_string(), json!(5));
        assert!(ValueSourceNode::from_settings(&settings).is_err());
    }
}
