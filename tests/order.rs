use anyhow::Result;
use floe::{Key, Op, TaskArg, TaskGraph, child_max, ndependents, order};
use serde_json::json;
use std::collections::HashMap;

fn task(graph: &mut TaskGraph, key: &str, f: &str, deps: &[&str]) {
    graph.insert_task(
        Key::from(key),
        Op::Named(f.to_string()),
        deps.iter().map(|d| TaskArg::Ref(Key::from(*d))).collect(),
    );
}

// {a: 1, b: (f, a), c: (f, b)}
fn chain() -> TaskGraph {
    let mut g = TaskGraph::new();
    g.insert_literal("a".into(), json!(1));
    task(&mut g, "b", "f", &["a"]);
    task(&mut g, "c", "f", &["b"]);
    g
}

// {a: 1, b: 2, c: (f, a), d: (g, b, c)}
fn diamondish() -> TaskGraph {
    let mut g = TaskGraph::new();
    g.insert_literal("a".into(), json!(1));
    g.insert_literal("b".into(), json!(2));
    task(&mut g, "c", "f", &["a"]);
    task(&mut g, "d", "g", &["b", "c"]);
    g
}

#[test]
fn ndependents_counts_transitive_consumers() -> Result<()> {
    let counts = ndependents(&chain())?;
    let expected: HashMap<Key, u64> = [("a", 3), ("b", 2), ("c", 1)]
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect();
    assert_eq!(counts, expected);
    Ok(())
}

#[test]
fn child_max_rolls_up_the_best_descendant() -> Result<()> {
    let graph = diamondish();
    let scores: HashMap<Key, u64> = [("a", 3), ("b", 2), ("c", 2), ("d", 1)]
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect();
    let rolled = child_max(&graph, &scores)?;
    let expected: HashMap<Key, u64> = [("a", 3), ("b", 2), ("c", 5), ("d", 6)]
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect();
    assert_eq!(rolled, expected);
    Ok(())
}

#[test]
fn child_max_rejects_missing_scores() -> Result<()> {
    let scores = HashMap::from([(Key::from("a"), 1)]);
    assert!(child_max(&chain(), &scores).is_err());
    Ok(())
}

#[test]
fn order_prefers_the_enabling_branch() -> Result<()> {
    let ranks = order(&diamondish())?;
    let expected: HashMap<Key, usize> = [("d", 0), ("c", 1), ("a", 2), ("b", 3)]
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect();
    assert_eq!(ranks, expected);
    Ok(())
}

#[test]
fn order_is_total_and_gapless() -> Result<()> {
    let graph = diamondish();
    let ranks = order(&graph)?;
    assert_eq!(ranks.len(), graph.len());
    let mut values: Vec<usize> = ranks.values().copied().collect();
    values.sort_unstable();
    assert_eq!(values, (0..graph.len()).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn order_is_a_reverse_toposort() -> Result<()> {
    let mut graph = diamondish();
    task(&mut graph, "e", "h", &["d", "a"]);
    let ranks = order(&graph)?;
    let (dependencies, _) = graph.deps()?;
    for (node, deps) in &dependencies {
        for dep in deps {
            assert!(
                ranks[node] < ranks[dep],
                "{node} must rank before its dependency {dep}"
            );
        }
    }
    Ok(())
}

#[test]
fn order_keeps_subtrees_contiguous() -> Result<()> {
    // r fans out to two independent subtrees of sizes 2 and 3.
    let mut graph = TaskGraph::new();
    graph.insert_literal("x1".into(), json!(1));
    graph.insert_literal("y1".into(), json!(2));
    graph.insert_literal("y2".into(), json!(3));
    task(&mut graph, "x", "f", &["x1"]);
    task(&mut graph, "y", "f", &["y1", "y2"]);
    task(&mut graph, "r", "g", &["x", "y"]);

    let ranks = order(&graph)?;
    assert_eq!(ranks[&Key::from("r")], 0);
    for subtree in [vec!["x", "x1"], vec!["y", "y1", "y2"]] {
        let mut positions: Vec<usize> = subtree.iter().map(|k| ranks[&Key::from(*k)]).collect();
        positions.sort_unstable();
        let contiguous: Vec<usize> = (positions[0]..positions[0] + positions.len()).collect();
        assert_eq!(positions, contiguous, "subtree {subtree:?} is not contiguous");
    }
    Ok(())
}

#[test]
fn order_is_deterministic() -> Result<()> {
    let graph = diamondish();
    assert_eq!(order(&graph)?, order(&graph)?);
    Ok(())
}

#[test]
fn order_of_empty_graph_is_empty() -> Result<()> {
    assert!(order(&TaskGraph::new())?.is_empty());
    Ok(())
}

#[test]
fn order_rejects_cycles() {
    let mut graph = TaskGraph::new();
    task(&mut graph, "a", "f", &["b"]);
    task(&mut graph, "b", "f", &["a"]);
    assert!(order(&graph).is_err());
}

#[test]
fn order_rejects_dangling_references() {
    let mut graph = TaskGraph::new();
    task(&mut graph, "a", "f", &["ghost"]);
    assert!(order(&graph).is_err());
}
