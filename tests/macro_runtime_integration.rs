//! Integration tests for running graphs that contain macros
//!
//! These tests validate that a macro adds nothing at run time:
//! - Data passes through a noop macro unchanged
//! - A spawned executor runs the same graph on its own thread

mod common;

use common::builders::{run_single_test, MacroHarness};
use common::{noop_definition, test_config};
use flowmacro::graph::nodes::{CollectorNode, ValueSourceNode};
use flowmacro::graph::{Executor, ExecutorEvent, Graph, NodeRef};
use flowmacro::macro_node::MacroParams;
use serde_json::{json, Value};

#[test]
fn test_single_value() {
    assert_eq!(run_single_test(vec![json!(100)]), vec![json!(100)]);
}

#[test]
fn test_list_passes_unchanged() {
    let data: Vec<Value> = (0..100).map(|i| json!(i)).collect();
    assert_eq!(run_single_test(data.clone()), data);
}

#[test]
fn test_grid_passes_unchanged() {
    let grid: Vec<Value> = (0..20)
        .map(|row| json!((0..5).map(|col| row * 5 + col).collect::<Vec<_>>()))
        .collect();
    let out = run_single_test(grid.clone());

    assert_eq!(out.len(), 20);
    assert!(out.iter().all(|row| row.as_array().is_some_and(|r| r.len() == 5)));
    assert_eq!(out, grid);
}

#[test]
fn test_macro_adds_no_packets() {
    let mut harness =
        MacroHarness::new(&noop_definition(), vec![json!(1), json!(2)], "Noop_any", "Noop_any");
    let stats = Executor::run_to_completion(&mut harness.graph).unwrap();
    // source -> Noop -> sink: two hops per value, none through the macro itself
    assert_eq!(stats.packets_delivered, 4);
}

#[test]
fn test_chained_macros() {
    let mut graph = Graph::with_config(test_config());
    let source = graph.add_node("source", ValueSourceNode::new(vec![json!([1, 2]), json!(3)]));
    let sink = graph.add_node("sink", CollectorNode::new());
    let ids: Vec<_> = (0..3)
        .map(|_| graph.add_macro(MacroParams::new(noop_definition())).unwrap())
        .collect();

    graph.connect(source, "any", ids[0], "Noop_any").unwrap();
    for pair in ids.windows(2) {
        graph.connect(pair[0], "Noop_any", pair[1], "Noop_any").unwrap();
    }
    graph.connect(ids[2], "Noop_any", sink, "any").unwrap();

    Executor::run_to_completion(&mut graph).unwrap();
    assert_eq!(graph.collector_state(sink).unwrap(), &[json!([1, 2]), json!(3)]);

    let names: Vec<String> = ids
        .iter()
        .map(|&id| graph.macro_instance(id).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["Macro: noop", "Macro: noop (2)", "Macro: noop (3)"]);
}

#[test]
fn test_spawned_executor() {
    let harness = MacroHarness::new(
        &noop_definition(),
        (0..10).map(|i| json!(i)).collect(),
        "Noop_any",
        "Noop_any",
    );
    let sink = harness.sink;

    let handle = Executor::spawn(harness.graph).unwrap();
    let events = handle.events().clone();
    let (graph, result) = handle.join();

    let stats = result.unwrap();
    assert!(!stats.stopped);
    assert_eq!(
        graph.collector_state(sink).unwrap(),
        (0..10).map(|i| json!(i)).collect::<Vec<_>>().as_slice()
    );

    let received: Vec<ExecutorEvent> = events.try_iter().collect();
    assert_eq!(received, vec![ExecutorEvent::Started, ExecutorEvent::Finished(stats)]);
}

#[test]
fn test_spawned_executor_can_be_stopped() {
    let mut config = test_config();
    config.executor.tick_rate_hz = 100;
    let mut graph = Graph::with_config(config);
    let source = graph.add_node(
        "source",
        ValueSourceNode::new((0..100_000).map(|i| json!(i)).collect()),
    );
    let id = graph.add_macro(MacroParams::new(noop_definition())).unwrap();
    graph.connect(source, "any", id, "Noop_any").unwrap();

    let handle = Executor::spawn(graph).unwrap();
    handle.stop();
    let (graph, result) = handle.join();

    assert!(result.unwrap().stopped);
    assert!(matches!(
        graph.find_by_display("Macro: noop [Macro]"),
        Some(NodeRef::Macro(_))
    ));
}
