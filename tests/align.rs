use anyhow::Result;
use floe::testing::{PlanOnlyExchange, literal_frame, unpartitioned_frame};
use floe::{
    IndexValue, Key, Operand, Scalar, TaskGraph, align_partitions, bound, maybe_align_partitions,
    require,
};
use serde_json::json;

fn ivs(values: &[i64]) -> Vec<IndexValue> {
    values.iter().map(|&v| IndexValue::from(v)).collect()
}

fn scalar(name: &str) -> Result<Scalar> {
    let mut graph = TaskGraph::new();
    graph.insert_literal(Key::block(name, 0), json!(42));
    Scalar::new(graph, name)
}

#[test]
fn bound_slices_inclusively() {
    let seq = ivs(&[1, 3, 4, 5, 8, 10, 12]);
    assert_eq!(
        bound(&seq, &IndexValue::from(4i64), &IndexValue::from(10i64)),
        &ivs(&[4, 5, 8, 10])[..]
    );
}

#[test]
fn aligns_onto_the_union_of_divisions() -> Result<()> {
    let a = literal_frame("a", &["x"], &[1i64, 3, 5, 7])?;
    let b = literal_frame("b", &["y"], &[3i64, 5, 7, 9])?;
    let (aligned, divisions, parts) =
        align_partitions(&PlanOnlyExchange, &[a.into(), b.into()])?;

    assert_eq!(divisions, ivs(&[1, 3, 5, 7, 9]));
    assert_eq!(parts.len(), 4);

    // Each side keeps its own range: `a` misses the last division, `b` the first.
    let a2 = aligned[0].as_frame().expect("frame");
    let b2 = aligned[1].as_frame().expect("frame");
    assert_eq!(a2.divisions().boundaries(), Some(&ivs(&[1, 3, 5, 7])[..]));
    assert_eq!(b2.divisions().boundaries(), Some(&ivs(&[3, 5, 7, 9])[..]));
    assert_eq!(
        parts,
        vec![
            vec![Some(a2.block(0)), None],
            vec![Some(a2.block(1)), Some(b2.block(0))],
            vec![Some(a2.block(2)), Some(b2.block(1))],
            vec![None, Some(b2.block(2))],
        ]
    );
    Ok(())
}

#[test]
fn every_division_has_a_contributor() -> Result<()> {
    let a = literal_frame("a", &["x"], &[0i64, 4, 8])?;
    let b = literal_frame("b", &["y"], &[2i64, 6, 10])?;
    let c = literal_frame("c", &["z"], &[5i64, 7])?;
    let (_, _, parts) =
        align_partitions(&PlanOnlyExchange, &[a.into(), b.into(), c.into()])?;
    for row in &parts {
        assert!(row.iter().any(Option::is_some));
    }
    Ok(())
}

#[test]
fn aligned_graphs_keep_the_source_blocks() -> Result<()> {
    let a = literal_frame("a", &["x"], &[1i64, 3, 5])?;
    let b = literal_frame("b", &["y"], &[2i64, 4])?;
    let (aligned, _, _) = align_partitions(&PlanOnlyExchange, &[a.into(), b.into()])?;
    let a2 = aligned[0].as_frame().expect("frame");
    assert!(a2.graph().contains(&Key::block("a", 0)));
    assert!(a2.graph().contains(&Key::block("a", 1)));
    Ok(())
}

#[test]
fn scalars_contribute_no_blocks() -> Result<()> {
    let a = literal_frame("a", &["x"], &[1i64, 5, 9])?;
    let s = scalar("answer")?;
    let (aligned, divisions, parts) =
        align_partitions(&PlanOnlyExchange, &[a.into(), s.into()])?;
    assert_eq!(divisions, ivs(&[1, 5, 9]));
    assert!(matches!(aligned[1], Operand::Scalar(_)));
    for row in &parts {
        assert_eq!(row[1], None);
        assert!(row[0].is_some());
    }
    Ok(())
}

#[test]
fn rejects_frameless_input() -> Result<()> {
    let s = scalar("answer")?;
    assert!(align_partitions(&PlanOnlyExchange, &[s.into()]).is_err());
    assert!(align_partitions(&PlanOnlyExchange, &[]).is_err());
    Ok(())
}

#[test]
fn rejects_unknown_divisions() -> Result<()> {
    let a = literal_frame("a", &["x"], &[1i64, 5])?;
    let u = unpartitioned_frame("u", &["y"], 2)?;
    assert!(align_partitions(&PlanOnlyExchange, &[a.into(), u.into()]).is_err());
    Ok(())
}

#[test]
fn maybe_align_is_a_noop_on_equal_divisions() -> Result<()> {
    let a = literal_frame("a", &["x"], &[1i64, 5, 9])?;
    let b = literal_frame("b", &["y"], &[1i64, 5, 9])?;
    let out = maybe_align_partitions(&PlanOnlyExchange, vec![a.into(), b.into()])?;
    let names: Vec<&str> = out
        .iter()
        .map(|o| o.as_frame().expect("frame").name())
        .collect();
    assert_eq!(names, ["a", "b"]);
    Ok(())
}

#[test]
fn maybe_align_aligns_differing_divisions() -> Result<()> {
    let a = literal_frame("a", &["x"], &[1i64, 5, 9])?;
    let b = literal_frame("b", &["y"], &[1i64, 9])?;
    let out = maybe_align_partitions(&PlanOnlyExchange, vec![a.into(), b.into()])?;
    let a2 = out[0].as_frame().expect("frame");
    let b2 = out[1].as_frame().expect("frame");
    assert_eq!(a2.divisions(), b2.divisions());
    assert_eq!(a2.divisions().boundaries(), Some(&ivs(&[1, 5, 9])[..]));
    Ok(())
}

// The fixture of the pruning tests: two frames overlapping on [3, 7].
fn offset_parts() -> (Vec<IndexValue>, Vec<Vec<Option<Key>>>) {
    let divisions = ivs(&[1, 3, 5, 7, 9]);
    let parts = vec![
        vec![Some(Key::block("a", 0)), None],
        vec![Some(Key::block("a", 1)), Some(Key::block("b", 0))],
        vec![Some(Key::block("a", 2)), Some(Key::block("b", 1))],
        vec![None, Some(Key::block("b", 2))],
    ];
    (divisions, parts)
}

#[test]
fn require_trims_to_where_the_left_side_exists() -> Result<()> {
    let (divisions, parts) = offset_parts();
    let (divisions, parts) = require(&divisions, &parts, &[0])?;
    assert_eq!(divisions, ivs(&[1, 3, 5, 7]));
    assert_eq!(
        parts,
        vec![
            vec![Some(Key::block("a", 0)), None],
            vec![Some(Key::block("a", 1)), Some(Key::block("b", 0))],
            vec![Some(Key::block("a", 2)), Some(Key::block("b", 1))],
        ]
    );
    Ok(())
}

#[test]
fn require_trims_to_where_the_right_side_exists() -> Result<()> {
    let (divisions, parts) = offset_parts();
    let (divisions, parts) = require(&divisions, &parts, &[1])?;
    assert_eq!(divisions, ivs(&[3, 5, 7, 9]));
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], vec![Some(Key::block("a", 1)), Some(Key::block("b", 0))]);
    Ok(())
}

#[test]
fn require_intersects_both_sides() -> Result<()> {
    let (divisions, parts) = offset_parts();
    let (divisions, parts) = require(&divisions, &parts, &[0, 1])?;
    assert_eq!(divisions, ivs(&[3, 5, 7]));
    assert_eq!(
        parts,
        vec![
            vec![Some(Key::block("a", 1)), Some(Key::block("b", 0))],
            vec![Some(Key::block("a", 2)), Some(Key::block("b", 1))],
        ]
    );
    Ok(())
}

#[test]
fn require_with_empty_mask_changes_nothing() -> Result<()> {
    let (divisions, parts) = offset_parts();
    let (d2, p2) = require(&divisions, &parts, &[])?;
    assert_eq!(d2, divisions);
    assert_eq!(p2, parts);
    Ok(())
}

#[test]
fn require_output_is_a_contiguous_subsequence() -> Result<()> {
    let (divisions, parts) = offset_parts();
    for mask in [&[0usize][..], &[1], &[0, 1]] {
        let (trimmed, _) = require(&divisions, &parts, mask)?;
        let start = divisions
            .iter()
            .position(|d| Some(d) == trimmed.first())
            .expect("subsequence start");
        assert_eq!(&divisions[start..start + trimmed.len()], &trimmed[..]);
    }
    Ok(())
}
