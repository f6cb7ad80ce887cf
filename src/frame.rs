//! Partitioned frames and their index metadata.
//!
//! A [`Frame`] is a logical ordered table split into contiguous blocks along
//! its index. It owns the graph fragment that computes its blocks, the name
//! those block keys are minted under, a column [`Schema`], and its
//! [`Divisions`] -- the boundary values demarcating the blocks. Frames are
//! immutable: every planning operation returns a new frame with a fresh
//! tokenized name.
//!
//! [`Scalar`] is a deferred zero-dimensional value; it participates in
//! alignment with no divisions of its own. [`LocalFrame`] is an in-memory
//! operand handed to [`merge`](crate::join::merge), wrapped into a
//! single-block frame during dispatch.

use crate::graph::TaskGraph;
use crate::key::Key;
use crate::schema::Schema;
use crate::token::tokenize;
use anyhow::{Result, bail};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A boundary value along a frame's index.
///
/// Ordering is total: numeric variants compare by value (the variant tag
/// breaks exact numeric ties, keeping the order consistent with structural
/// equality), strings compare lexicographically, and numbers sort before
/// strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexValue {
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

impl Ord for IndexValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use IndexValue::{Float, Int, Str};
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.cmp(b),
            (Int(a), Float(b)) => OrderedFloat(*a as f64).cmp(b).then(Ordering::Less),
            (Float(a), Int(b)) => a.cmp(&OrderedFloat(*b as f64)).then(Ordering::Greater),
            (Str(a), Str(b)) => a.cmp(b),
            (Str(_), _) => Ordering::Greater,
            (_, Str(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for IndexValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        IndexValue::Int(value)
    }
}

impl From<f64> for IndexValue {
    fn from(value: f64) -> Self {
        IndexValue::Float(OrderedFloat(value))
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        IndexValue::Str(value.to_string())
    }
}

/// Block boundaries of a frame.
///
/// `Known` carries `nblocks + 1` monotone boundaries: block `i` spans
/// `[boundaries[i], boundaries[i + 1]]`, right-open except for the last
/// block. `Unknown` means the partitioning along the index is not known --
/// such a frame cannot be aligned and must go through a shuffle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Divisions {
    Known(Vec<IndexValue>),
    Unknown { nblocks: usize },
}

impl Divisions {
    /// Known divisions over the given boundaries.
    ///
    /// # Errors
    ///
    /// If fewer than two boundaries are given, or they are not monotone
    /// non-decreasing.
    pub fn known(boundaries: Vec<IndexValue>) -> Result<Self> {
        if boundaries.len() < 2 {
            bail!("frame: divisions need at least two boundaries");
        }
        if boundaries.windows(2).any(|pair| pair[0] > pair[1]) {
            bail!("frame: divisions must be monotone non-decreasing");
        }
        Ok(Divisions::Known(boundaries))
    }

    /// Unknown divisions over `nblocks` blocks.
    #[must_use]
    pub fn unknown(nblocks: usize) -> Self {
        Divisions::Unknown { nblocks }
    }

    #[must_use]
    pub fn nblocks(&self) -> usize {
        match self {
            Divisions::Known(boundaries) => boundaries.len() - 1,
            Divisions::Unknown { nblocks } => *nblocks,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Divisions::Known(_))
    }

    /// The boundary values, or `None` when unknown.
    #[must_use]
    pub fn boundaries(&self) -> Option<&[IndexValue]> {
        match self {
            Divisions::Known(boundaries) => Some(boundaries),
            Divisions::Unknown { .. } => None,
        }
    }
}

/// A partitioned table: a graph fragment plus the metadata to address and
/// combine its blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    graph: TaskGraph,
    name: String,
    schema: Schema,
    divisions: Divisions,
}

impl Frame {
    /// Assemble a frame from its parts.
    ///
    /// # Errors
    ///
    /// If the graph is missing any of the frame's block nodes.
    pub fn new(
        graph: TaskGraph,
        name: impl Into<String>,
        schema: Schema,
        divisions: Divisions,
    ) -> Result<Self> {
        let name = name.into();
        for index in 0..divisions.nblocks() {
            if !graph.contains(&Key::Block(name.clone(), index)) {
                bail!("frame: graph for {name} is missing block {index}");
            }
        }
        Ok(Self {
            graph,
            name,
            schema,
            divisions,
        })
    }

    /// Wrap an in-memory operand as a single-block frame.
    ///
    /// The payload becomes one literal graph node. Divisions are known only
    /// when the local frame carries index bounds.
    ///
    /// # Errors
    ///
    /// If the payload cannot be tokenized.
    pub fn from_local(local: LocalFrame) -> Result<Self> {
        let token = tokenize(&(&local.schema, &local.payload, &local.bounds))?;
        let name = format!("from-local-{token}");
        let mut graph = TaskGraph::new();
        graph.insert_literal(Key::block(&name, 0), local.payload);
        let divisions = match local.bounds {
            Some((low, high)) => Divisions::known(vec![low, high])?,
            None => Divisions::unknown(1),
        };
        Self::new(graph, name, local.schema, divisions)
    }

    #[must_use]
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn divisions(&self) -> &Divisions {
        &self.divisions
    }

    #[must_use]
    pub fn npartitions(&self) -> usize {
        self.divisions.nblocks()
    }

    #[must_use]
    pub fn has_known_divisions(&self) -> bool {
        self.divisions.is_known()
    }

    /// Key of block `index`.
    #[must_use]
    pub fn block(&self, index: usize) -> Key {
        Key::Block(self.name.clone(), index)
    }

    /// Keys of all blocks, in index order.
    #[must_use]
    pub fn blocks(&self) -> Vec<Key> {
        (0..self.npartitions()).map(|i| self.block(i)).collect()
    }
}

/// A deferred zero-dimensional value.
#[derive(Clone, Debug, PartialEq)]
pub struct Scalar {
    graph: TaskGraph,
    name: String,
}

impl Scalar {
    /// Assemble a scalar from its graph fragment.
    ///
    /// # Errors
    ///
    /// If the graph is missing the scalar's node.
    pub fn new(graph: TaskGraph, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !graph.contains(&Key::Block(name.clone(), 0)) {
            bail!("frame: graph for scalar {name} is missing its node");
        }
        Ok(Self { graph, name })
    }

    #[must_use]
    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the scalar's single node.
    #[must_use]
    pub fn key(&self) -> Key {
        Key::Block(self.name.clone(), 0)
    }
}

/// Either input of a multi-frame planning operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Frame(Frame),
    Scalar(Scalar),
}

impl Operand {
    #[must_use]
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Operand::Frame(frame) => Some(frame),
            Operand::Scalar(_) => None,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &TaskGraph {
        match self {
            Operand::Frame(frame) => frame.graph(),
            Operand::Scalar(scalar) => scalar.graph(),
        }
    }
}

impl From<Frame> for Operand {
    fn from(frame: Frame) -> Self {
        Operand::Frame(frame)
    }
}

impl From<Scalar> for Operand {
    fn from(scalar: Scalar) -> Self {
        Operand::Scalar(scalar)
    }
}

/// An in-memory, non-partitioned table.
///
/// The payload is opaque to the planner; `bounds`, when present, are the
/// smallest and largest index values and let the wrapped frame join the
/// aligned path instead of forcing a shuffle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    pub schema: Schema,
    pub payload: Value,
    pub bounds: Option<(IndexValue, IndexValue)>,
}

impl LocalFrame {
    #[must_use]
    pub fn new(schema: Schema, payload: Value) -> Self {
        Self {
            schema,
            payload,
            bounds: None,
        }
    }

    /// Attach known index bounds.
    #[must_use]
    pub fn with_bounds(mut self, low: IndexValue, high: IndexValue) -> Self {
        self.bounds = Some((low, high));
        self
    }
}
