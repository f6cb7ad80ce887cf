use anyhow::Result;
use floe::{
    Divisions, Expr, Frame, IndexValue, Key, Op, Schema, TaskArg, TaskGraph, tokenize,
};
use serde_json::json;
use std::collections::HashSet;

#[test]
fn deps_are_mutually_consistent() -> Result<()> {
    let mut graph = TaskGraph::new();
    graph.insert_literal("a".into(), json!(1));
    graph.insert_task(
        "b".into(),
        Op::Named("f".to_string()),
        vec![TaskArg::Ref("a".into()), TaskArg::Literal(json!(10))],
    );
    graph.insert_task(
        "c".into(),
        Op::Named("g".to_string()),
        vec![TaskArg::Ref("a".into()), TaskArg::Ref("b".into())],
    );

    let (dependencies, dependents) = graph.deps()?;
    assert_eq!(dependencies[&Key::from("a")], HashSet::new());
    assert_eq!(
        dependencies[&Key::from("c")],
        HashSet::from([Key::from("a"), Key::from("b")])
    );
    assert_eq!(
        dependents[&Key::from("a")],
        HashSet::from([Key::from("b"), Key::from("c")])
    );
    assert_eq!(dependents[&Key::from("c")], HashSet::new());

    // Every edge appears in both maps.
    for (node, deps) in &dependencies {
        for dep in deps {
            assert!(dependents[dep].contains(node));
        }
    }
    Ok(())
}

#[test]
fn deps_reject_dangling_references() {
    let mut graph = TaskGraph::new();
    graph.insert_task(
        "a".into(),
        Op::Named("f".to_string()),
        vec![TaskArg::Ref("ghost".into())],
    );
    assert!(graph.deps().is_err());
}

#[test]
fn extend_unions_fragments() {
    let mut left = TaskGraph::new();
    left.insert_literal("a".into(), json!(1));
    let mut right = TaskGraph::new();
    right.insert_literal("a".into(), json!(1));
    right.insert_literal("b".into(), json!(2));

    left.extend(&right);
    assert_eq!(left.len(), 2);
    assert_eq!(left.get(&"b".into()), Some(&Expr::Literal(json!(2))));
}

#[test]
fn frame_requires_its_blocks_in_the_graph() -> Result<()> {
    let mut graph = TaskGraph::new();
    graph.insert_literal(Key::block("t", 0), json!(null));

    let divisions = Divisions::known(vec![IndexValue::from(0i64), IndexValue::from(9i64)])?;
    let frame = Frame::new(graph.clone(), "t", Schema::new(["x"])?, divisions)?;
    assert_eq!(frame.blocks(), vec![Key::block("t", 0)]);

    // A two-block frame over the same graph is missing block 1.
    let two = Divisions::known(
        [0i64, 5, 9].into_iter().map(IndexValue::from).collect(),
    )?;
    assert!(Frame::new(graph, "t", Schema::new(["x"])?, two).is_err());
    Ok(())
}

#[test]
fn divisions_must_be_monotone() {
    let boundaries: Vec<IndexValue> = [3i64, 1].into_iter().map(IndexValue::from).collect();
    assert!(Divisions::known(boundaries).is_err());
    assert!(Divisions::known(vec![IndexValue::from(1i64)]).is_err());
}

#[test]
fn index_values_order_numerically_then_by_kind() {
    assert!(IndexValue::from(2i64) < IndexValue::from(2.5));
    assert!(IndexValue::from(3.0) > IndexValue::from(2i64));
    assert!(IndexValue::from(10i64) < IndexValue::from("apple"));
    assert!(IndexValue::from("apple") < IndexValue::from("banana"));
    // Numerically equal but structurally distinct values stay ordered.
    assert!(IndexValue::from(2i64) < IndexValue::from(2.0));
}

#[test]
fn schema_rejects_duplicates() {
    assert!(Schema::new(["x", "y", "x"]).is_err());
    assert!(Schema::new(["x", "y"]).is_ok());
}

#[test]
fn tokens_are_stable_and_distinct() -> Result<()> {
    let one = tokenize(&("table", vec!["id"], 4usize))?;
    let again = tokenize(&("table", vec!["id"], 4usize))?;
    let other = tokenize(&("table", vec!["id"], 5usize))?;

    assert_eq!(one, again);
    assert_ne!(one, other);
    assert_eq!(one.len(), 32);
    assert!(one.chars().all(|c| c.is_ascii_hexdigit()));
    Ok(())
}
