//! Task-graph node values: the typed IR the executor interprets.
//!
//! A graph node is an [`Expr`]: either a literal value or a deferred [`Task`]
//! applying an [`Op`] to arguments. Arguments are a sum type ([`TaskArg`]) so
//! analysis code never has to ask at runtime whether a value happens to look
//! like a key -- a reference is a `Ref`, a verbatim payload is a `Literal`,
//! and "an empty in-memory block with this column layout" is an
//! [`TaskArg::EmptyBlock`].
//!
//! [`Op`] is the vocabulary of kernel calls the planner emits. The relational
//! kernel itself is external; each variant documents the part of its contract
//! the planner relies on.

use crate::key::Key;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Join flavor shared by indexed joins and hash merges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    Left,
    Right,
    Inner,
    Outer,
}

impl JoinKind {
    /// Table indices whose presence at a division is mandatory for that
    /// division to contribute output (the argument to
    /// [`require`](crate::align::require)).
    #[must_use]
    pub fn required_mask(self) -> &'static [usize] {
        match self {
            JoinKind::Left => &[0],
            JoinKind::Right => &[1],
            JoinKind::Inner => &[0, 1],
            JoinKind::Outer => &[],
        }
    }
}

/// Concatenation flavor. The kernel's other join modes are not meaningful
/// for partitioned concat, so they are unrepresentable here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcatKind {
    Inner,
    Outer,
}

/// Concat orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Rows,
    Columns,
}

/// A join key: named columns or the row index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKey {
    /// Join on the named columns.
    On(Vec<String>),
    /// Join on the row index.
    Index,
}

impl JoinKey {
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, JoinKey::Index)
    }

    /// The named columns, or `None` for an index key.
    #[must_use]
    pub fn columns(&self) -> Option<&[String]> {
        match self {
            JoinKey::On(columns) => Some(columns),
            JoinKey::Index => None,
        }
    }
}

/// Kernel calls and external functions the planner can emit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Index-aligned join of two blocks.
    Join {
        how: JoinKind,
        lsuffix: String,
        rsuffix: String,
    },

    /// Column/index merge of two co-partitioned blocks.
    ///
    /// Carries both source schemas: when an input block is empty, the kernel
    /// wrapper must substitute an empty block bearing the original table's
    /// schema so that schema-only edge cases keep a consistent column layout.
    Merge {
        how: JoinKind,
        left_on: Option<Vec<String>>,
        right_on: Option<Vec<String>>,
        left_index: bool,
        right_index: bool,
        suffixes: (String, String),
        left_schema: Schema,
        right_schema: Schema,
    },

    /// Concatenation of the argument blocks.
    ///
    /// With `axis == Columns` the kernel wrapper pads empty operands to the
    /// length and index of the first non-empty operand (`Outer`), or forces
    /// the whole result empty with the union schema when any operand is
    /// empty (`Inner`).
    Concat { axis: Axis, how: ConcatKind },

    /// Re-seat a block's index from the named columns. The columns stay in
    /// the block.
    SetIndex { columns: Vec<String> },

    /// An externally defined function, resolved by the executor.
    Named(String),
}

/// One argument of a task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TaskArg {
    /// The result of another node.
    Ref(Key),
    /// A value passed verbatim.
    Literal(Value),
    /// An empty in-memory block bearing this schema.
    EmptyBlock(Schema),
}

/// A deferred call: an operation applied to literal or key arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub op: Op,
    pub args: Vec<TaskArg>,
}

/// A graph node value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A materialized value; a leaf of the graph.
    Literal(Value),
    /// A deferred call.
    Task(Task),
}

impl Expr {
    /// A task expression.
    #[must_use]
    pub fn task(op: Op, args: Vec<TaskArg>) -> Self {
        Expr::Task(Task { op, args })
    }

    /// Keys this node's arguments reference.
    pub fn refs(&self) -> impl Iterator<Item = &Key> {
        let args: &[TaskArg] = match self {
            Expr::Task(task) => &task.args,
            Expr::Literal(_) => &[],
        };
        args.iter().filter_map(|arg| match arg {
            TaskArg::Ref(key) => Some(key),
            _ => None,
        })
    }
}
