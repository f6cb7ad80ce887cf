//! Task graph registry and its derived dependency structure.
//!
//! A [`TaskGraph`] is the common substrate both planners produce and the
//! executor consumes: a mapping from [`Key`] to [`Expr`]. Fragments built by
//! separate planning calls are unioned with [`TaskGraph::extend`]; node names
//! are minted from content hashes, so equal keys denote the same logical
//! task and last-write-wins union is sound.
//!
//! [`DepGraph`] is the dense-id arena view used by the traversal-heavy
//! analyses in [`order`](crate::order): external keys map to integer ids and
//! the adjacency lists become plain vectors. Building it validates the two
//! graph preconditions -- every referenced key exists, and the graph is
//! acyclic.

use crate::key::Key;
use crate::task::{Expr, Op, TaskArg};
use anyhow::{Result, bail};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// A mapping from node key to node value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskGraph {
    nodes: HashMap<Key, Expr>,
}

impl TaskGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any existing node with the same key.
    pub fn insert(&mut self, key: Key, expr: Expr) {
        self.nodes.insert(key, expr);
    }

    /// Insert a literal leaf node.
    pub fn insert_literal(&mut self, key: Key, value: Value) {
        self.nodes.insert(key, Expr::Literal(value));
    }

    /// Insert a task node.
    pub fn insert_task(&mut self, key: Key, op: Op, args: Vec<TaskArg>) {
        self.nodes.insert(key, Expr::task(op, args));
    }

    /// Union another fragment into this graph.
    pub fn extend(&mut self, other: &TaskGraph) {
        for (key, expr) in &other.nodes {
            self.nodes.insert(key.clone(), expr.clone());
        }
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Expr> {
        self.nodes.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.nodes.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.nodes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Expr)> {
        self.nodes.iter()
    }

    /// Derive the `dependencies` and `dependents` maps.
    ///
    /// `dependencies[k]` is the set of keys `k`'s task references;
    /// `dependents[k]` is the inverse. Every key of the graph appears in
    /// both maps, with an empty set where it has none.
    ///
    /// # Errors
    ///
    /// If any task references a key that is not in the graph.
    pub fn deps(&self) -> Result<(HashMap<Key, HashSet<Key>>, HashMap<Key, HashSet<Key>>)> {
        let mut dependencies: HashMap<Key, HashSet<Key>> = HashMap::with_capacity(self.len());
        let mut dependents: HashMap<Key, HashSet<Key>> = HashMap::with_capacity(self.len());

        for (key, expr) in &self.nodes {
            let mut referenced = HashSet::new();
            for r in expr.refs() {
                if !self.nodes.contains_key(r) {
                    bail!("graph: task {key} references missing key {r}");
                }
                referenced.insert(r.clone());
            }
            for r in &referenced {
                dependents.entry(r.clone()).or_default().insert(key.clone());
            }
            dependencies.insert(key.clone(), referenced);
        }
        for key in self.nodes.keys() {
            dependents.entry(key.clone()).or_default();
        }

        Ok((dependencies, dependents))
    }
}

impl FromIterator<(Key, Expr)> for TaskGraph {
    fn from_iter<I: IntoIterator<Item = (Key, Expr)>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

/// Dense-id arena view of a task graph.
///
/// Ids are assigned in canonical key order, so they are a deterministic
/// function of the graph regardless of map iteration order.
pub(crate) struct DepGraph {
    pub keys: Vec<Key>,
    pub deps: Vec<Vec<u32>>,
    pub dependents: Vec<Vec<u32>>,
}

impl DepGraph {
    /// Build the arena, validating the graph preconditions.
    ///
    /// # Errors
    ///
    /// If a task references a missing key, or the graph contains a cycle.
    pub fn build(graph: &TaskGraph) -> Result<Self> {
        let mut keys: Vec<Key> = graph.keys().cloned().collect();
        keys.sort();
        let ids: HashMap<&Key, u32> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k, i as u32))
            .collect();

        let mut deps = vec![Vec::new(); keys.len()];
        let mut dependents = vec![Vec::new(); keys.len()];
        for (key, expr) in graph.iter() {
            let id = ids[key];
            for r in expr.refs() {
                let Some(&rid) = ids.get(r) else {
                    bail!("graph: task {key} references missing key {r}");
                };
                if !deps[id as usize].contains(&rid) {
                    deps[id as usize].push(rid);
                    dependents[rid as usize].push(id);
                }
            }
        }

        let arena = Self {
            keys,
            deps,
            dependents,
        };
        arena.check_acyclic()?;
        Ok(arena)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Ids with no dependents.
    pub fn roots(&self) -> impl Iterator<Item = u32> {
        self.dependents
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_empty())
            .map(|(i, _)| i as u32)
    }

    // Iterative three-color DFS over the dependency edges.
    fn check_acyclic(&self) -> Result<()> {
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;

        let mut color = vec![WHITE; self.len()];
        for start in 0..self.len() {
            if color[start] != WHITE {
                continue;
            }
            color[start] = GRAY;
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            while let Some(top) = stack.last_mut() {
                let (node, cursor) = *top;
                if let Some(&child) = self.deps[node].get(cursor) {
                    top.1 += 1;
                    let child = child as usize;
                    match color[child] {
                        WHITE => {
                            color[child] = GRAY;
                            stack.push((child, 0));
                        }
                        GRAY => bail!("graph: cycle detected through {}", self.keys[child]),
                        _ => {}
                    }
                } else {
                    color[node] = BLACK;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}
