//! Static priority ordering of task graphs.
//!
//! The dynamic executor picks whichever task becomes runnable; when several
//! become runnable at once it needs a tie-breaker. This module produces that
//! tie-breaker ahead of time: a total order over all nodes, returned as a
//! `Key -> usize` map where lower numbers mean higher priority.
//!
//! Two objectives drive the order:
//!
//! 1. **Finish subtrees before starting new ones.** Working one subtree to
//!    completion keeps the set of live intermediate results small.
//! 2. **Run heavily depended-on tasks first.** A node whose result unlocks a
//!    deep chain or a broad fan-out should complete early so the rest of the
//!    computation can flow.
//!
//! Objective 1 is a depth-first traversal; objective 2 steers the traversal
//! by descending first into the child whose subtree contains the most
//! depended-on descendant. The steering score is [`child_max`] over
//! [`ndependents`].
//!
//! Both analyses are iterative with explicit stacks; graphs with millions of
//! nodes must not overflow the call stack.

use crate::graph::{DepGraph, TaskGraph};
use crate::key::Key;
use anyhow::{Result, anyhow};
use log::debug;
use std::collections::HashMap;

/// Number of nodes (inclusive of self) that transitively depend on each key.
///
/// Roots -- nodes nothing depends on -- score 1; deep inputs score high.
///
/// # Errors
///
/// If the graph has dangling references or a cycle.
pub fn ndependents(graph: &TaskGraph) -> Result<HashMap<Key, u64>> {
    let arena = DepGraph::build(graph)?;
    let scores = ndependents_ids(&arena);
    Ok(arena.keys.iter().cloned().zip(scores).collect())
}

/// Per-key score plus the maximum score among the key's dependencies,
/// rolled up transitively.
///
/// Fed the result of [`ndependents`], this ranks each node by the most
/// important descendant reachable below it; the magnitude dominates any
/// descending path, which is what makes it a useful DFS steering key.
///
/// # Errors
///
/// If the graph is malformed, or `scores` is missing a key of the graph.
pub fn child_max(graph: &TaskGraph, scores: &HashMap<Key, u64>) -> Result<HashMap<Key, u64>> {
    let arena = DepGraph::build(graph)?;
    let by_id = arena
        .keys
        .iter()
        .map(|k| {
            scores
                .get(k)
                .copied()
                .ok_or_else(|| anyhow!("order: no score for key {k}"))
        })
        .collect::<Result<Vec<u64>>>()?;
    let rolled = child_max_ids(&arena, &by_id);
    Ok(arena.keys.iter().cloned().zip(rolled).collect())
}

/// Total priority order over the nodes of `graph`.
///
/// The result maps every key to a distinct integer in `0..len`; lower is
/// higher priority. The order is a reverse topological sort (a node comes
/// before its dependencies) produced by a depth-first traversal from the
/// roots, descending first into the child with the largest [`child_max`]
/// score. Ties fall back to the canonical [`Key`] order, so the output is a
/// deterministic function of the graph.
///
/// # Errors
///
/// If the graph has dangling references or a cycle.
pub fn order(graph: &TaskGraph) -> Result<HashMap<Key, usize>> {
    let arena = DepGraph::build(graph)?;
    if arena.keys.is_empty() {
        return Ok(HashMap::new());
    }
    let ndeps = ndependents_ids(&arena);
    let priority = child_max_ids(&arena, &ndeps);
    debug!("order: ranking {} nodes", arena.len());

    let ascending = |a: &u32, b: &u32| {
        priority[*a as usize]
            .cmp(&priority[*b as usize])
            .then_with(|| arena.keys[*a as usize].cmp(&arena.keys[*b as usize]))
    };

    let mut stack: Vec<u32> = arena.roots().collect();
    stack.sort_by(ascending);

    let mut seen = vec![false; arena.len()];
    let mut result = HashMap::with_capacity(arena.len());
    let mut next = 0usize;
    while let Some(id) = stack.pop() {
        if seen[id as usize] {
            continue;
        }
        seen[id as usize] = true;
        result.insert(arena.keys[id as usize].clone(), next);
        next += 1;

        let mut children: Vec<u32> = arena.deps[id as usize]
            .iter()
            .copied()
            .filter(|&c| !seen[c as usize])
            .collect();
        if !children.is_empty() {
            // LIFO stack: the largest-priority child is explored first.
            children.sort_by(ascending);
            stack.extend(children);
        }
    }

    Ok(result)
}

// Post-order over the dependents relation: a node's count is ready once all
// nodes depending on it are counted.
fn ndependents_ids(arena: &DepGraph) -> Vec<u64> {
    let mut result = vec![0u64; arena.len()];
    let mut done = vec![false; arena.len()];
    let mut stack = Vec::new();

    for start in 0..arena.len() {
        if done[start] {
            continue;
        }
        stack.push(start as u32);
        while let Some(&id) = stack.last() {
            let id = id as usize;
            if done[id] {
                stack.pop();
                continue;
            }
            let mut ready = true;
            for &up in &arena.dependents[id] {
                if !done[up as usize] {
                    stack.push(up);
                    ready = false;
                }
            }
            if ready {
                result[id] = 1 + arena.dependents[id]
                    .iter()
                    .map(|&up| result[up as usize])
                    .sum::<u64>();
                done[id] = true;
                stack.pop();
            }
        }
    }
    result
}

// Post-order over the dependency relation: a node's rollup is ready once
// all of its dependencies are rolled up.
fn child_max_ids(arena: &DepGraph, scores: &[u64]) -> Vec<u64> {
    let mut result = vec![0u64; arena.len()];
    let mut done = vec![false; arena.len()];
    let mut stack = Vec::new();

    for start in 0..arena.len() {
        if done[start] {
            continue;
        }
        stack.push(start as u32);
        while let Some(&id) = stack.last() {
            let id = id as usize;
            if done[id] {
                stack.pop();
                continue;
            }
            let mut ready = true;
            for &down in &arena.deps[id] {
                if !done[down as usize] {
                    stack.push(down);
                    ready = false;
                }
            }
            if ready {
                let best = arena.deps[id]
                    .iter()
                    .map(|&down| result[down as usize])
                    .max()
                    .unwrap_or(0);
                result[id] = scores[id] + best;
                done[id] = true;
                stack.pop();
            }
        }
    }
    result
}
