//! Integration tests for loading macro definitions
//!
//! These tests validate definition resolution and the failure modes of
//! macro construction. A failed construction must leave the enclosing
//! graph exactly as it was.

mod common;

use common::builders::{DefinitionBuilder, MacroHarness};
use common::fixtures::DefinitionDir;
use common::{noop_definition, test_config};
use flowmacro::graph::nodes::{CollectorNode, ValueSourceNode};
use flowmacro::graph::{Graph, NodeId};
use flowmacro::macro_node::MacroParams;
use flowmacro::{LoadError, MacroError};
use serde_json::json;
use std::path::Path;

/// A graph with one connected pair of plain nodes
fn populated_graph() -> (Graph, NodeId, NodeId) {
    let mut graph = Graph::with_config(test_config());
    let source = graph.add_node("source", ValueSourceNode::new(vec![json!(1)]));
    let sink = graph.add_node("sink", CollectorNode::new());
    graph.connect(source, "any", sink, "any").unwrap();
    (graph, source, sink)
}

/// Build a macro from `path` and expect failure with the graph untouched
fn build_fails(path: &Path) -> MacroError {
    let (mut graph, source, sink) = populated_graph();
    let err = graph.add_macro(MacroParams::new(path)).unwrap_err();

    assert_eq!(graph.nodes().count(), 2);
    assert_eq!(graph.connections().count(), 1);
    assert_eq!(graph.macros().count(), 0);
    assert!(graph.provides_input_to(source, sink));
    err
}

#[test]
fn test_missing_definition() {
    let dir = DefinitionDir::new();
    let err = build_fails(&dir.path().join("missing.json"));

    match err.root() {
        MacroError::Load(LoadError::NotFound { handle, searched }) => {
            assert!(handle.ends_with("missing.json"));
            assert_eq!(searched.len(), 1);
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_cyclic_definition() {
    let dir = DefinitionDir::new();
    let path = dir.write(
        "cycle.json",
        &DefinitionBuilder::new()
            .node("a", "Noop")
            .node("b", "Noop")
            .input("a [Noop].any -> b [Noop].any")
            .input("b [Noop].any -> a [Noop].any")
            .to_json(),
    );

    let err = build_fails(&path);
    assert!(matches!(
        err.root(),
        MacroError::Load(LoadError::Cycle { total: 2, .. })
    ));
}

#[test]
fn test_disconnected_definition() {
    let dir = DefinitionDir::new();
    let path = dir.write(
        "split.json",
        &DefinitionBuilder::new()
            .node("a", "Noop")
            .node("b", "Noop")
            .to_json(),
    );

    let err = build_fails(&path);
    assert!(matches!(
        err.root(),
        MacroError::Load(LoadError::Disconnected {
            reached: 1,
            total: 2,
            ..
        })
    ));
}

#[test]
fn test_empty_definition() {
    let dir = DefinitionDir::new();
    let path = dir.write("empty.json", r#"{"Nodes": {}, "Inputs": []}"#);

    let err = build_fails(&path);
    assert!(matches!(err.root(), MacroError::Load(LoadError::Empty(_))));
}

#[test]
fn test_unknown_node_type() {
    let dir = DefinitionDir::new();
    let path = dir.write(
        "unknown.json",
        &DefinitionBuilder::new().node("x", "Mystery").to_json(),
    );

    let err = build_fails(&path);
    match err.root() {
        MacroError::Load(LoadError::UnknownNodeType(tag)) => assert_eq!(tag, "Mystery"),
        other => panic!("Expected UnknownNodeType, got {:?}", other),
    }
}

#[test]
fn test_malformed_descriptor() {
    let dir = DefinitionDir::new();
    let path = dir.write(
        "bad.json",
        &DefinitionBuilder::new()
            .node("a", "Noop")
            .node("b", "Noop")
            .input("a [Noop].any => b [Noop].any")
            .to_json(),
    );

    let err = build_fails(&path);
    assert!(matches!(
        err.root(),
        MacroError::Load(LoadError::InvalidDescriptor(_))
    ));
}

#[test]
fn test_parse_error() {
    let dir = DefinitionDir::new();
    let path = dir.write("broken.json", "{ not json");

    let err = build_fails(&path);
    assert!(matches!(err.root(), MacroError::Load(LoadError::Parse { .. })));
}

#[test]
fn test_duplicate_alias_from_same_named_nodes() {
    let dir = DefinitionDir::new();
    // Two entries named "x" differ only in their type tag.
    let path = dir.write(
        "same_name.json",
        &DefinitionBuilder::new()
            .node("x", "Noop")
            .node("x", "Collector")
            .input("x [Noop].any -> x [Collector].any")
            .to_json(),
    );

    let err = build_fails(&path);
    match err.root() {
        MacroError::DuplicateAlias { key } => assert_eq!(key, "x_any"),
        other => panic!("Expected DuplicateAlias, got {:?}", other),
    }
}

#[test]
fn test_two_nested_instances_of_one_definition() {
    let dir = DefinitionDir::new().with_noop();
    let path = dir.write(
        "twice.json",
        &DefinitionBuilder::new()
            .macro_entry("A", "noop.json")
            .macro_entry("B", "noop.json")
            .input("A [Macro].Noop_any -> B [Macro].Noop_any")
            .to_json(),
    );

    let mut harness = MacroHarness::new(
        &path,
        vec![json!(1), json!(2)],
        "A_Noop_any",
        "B_Noop_any",
    );

    let instance = harness.graph.macro_instance(harness.macro_id).unwrap();
    assert_eq!(
        instance.ports_in().keys().collect::<Vec<_>>(),
        vec!["A_Noop_any", "B_Noop_any"]
    );
    assert_eq!(instance.input_ports()[0].label(), "A: Noop: Any");
    assert_eq!(harness.run(), vec![json!(1), json!(2)]);
}

#[test]
fn test_nested_names_do_not_clash_with_enclosing_graph() {
    let dir = DefinitionDir::new().with_noop();
    let path = dir.write(
        "wrapped.json",
        &DefinitionBuilder::new().macro_entry("A", "noop.json").to_json(),
    );

    let mut graph = Graph::with_config(test_config());
    graph
        .add_macro(MacroParams::new(noop_definition()).with_name("A"))
        .unwrap();
    let id = graph.add_macro(MacroParams::new(&path)).unwrap();

    // The nested "A" is named within its definition only.
    let keys: Vec<&str> = graph.macro_instance(id).unwrap().ports_in().keys().collect();
    assert_eq!(keys, vec!["A_Noop_any"]);
}

#[test]
fn test_resolves_through_definition_dirs() {
    let mut graph = Graph::with_config(test_config());
    let id = graph.add_macro(MacroParams::new("noop.json")).unwrap();

    let instance = graph.macro_instance(id).unwrap();
    assert_eq!(instance.name(), "Macro: noop");
    // The handle is kept as given.
    assert_eq!(instance.path(), Path::new("noop.json"));
}

#[test]
fn test_relative_handle_prefers_including_directory() {
    let dir = DefinitionDir::new();
    // A local "noop.json" that differs from the shipped one.
    dir.write(
        "noop.json",
        &DefinitionBuilder::new()
            .node("Local", "Noop")
            .to_json(),
    );
    let outer = dir.write(
        "outer.json",
        &DefinitionBuilder::new()
            .macro_entry("Inner", "noop.json")
            .to_json(),
    );

    let mut graph = Graph::with_config(test_config());
    let id = graph.add_macro(MacroParams::new(&outer)).unwrap();
    let keys: Vec<&str> = graph.macro_instance(id).unwrap().ports_in().keys().collect();
    assert_eq!(keys, vec!["Inner_Local_any"]);
}

#[test]
fn test_failed_build_does_not_consume_names() {
    let dir = DefinitionDir::new();
    let path = dir.write("empty.json", r#"{"Nodes": {}, "Inputs": []}"#);
    let mut graph = Graph::with_config(test_config());
    assert!(graph.add_macro(MacroParams::new(&path)).is_err());

    let id = graph.add_macro(MacroParams::new("noop.json")).unwrap();
    assert_eq!(graph.macros().count(), 1);
    assert_eq!(graph.nodes().count(), 1);
    assert_eq!(graph.macro_instance(id).unwrap().nodes().len(), 1);
}
