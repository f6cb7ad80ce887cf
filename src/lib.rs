//! # Floe
//!
//! **Planning primitives for a parallel dataframe engine** built atop a
//! task-graph execution model. Floe owns the two graph-algorithmic cores of
//! such an engine and nothing else:
//!
//! 1. **Static task ordering** -- given a DAG of deferred computations,
//!    produce a total priority order that a dynamic executor uses as a
//!    tie-breaker when several tasks become runnable at once. The order
//!    finishes subtrees before starting new ones (small memory footprint)
//!    and prefers tasks whose completion unlocks the most downstream work.
//! 2. **Multi-frame planning** -- given partitioned tables, build the task
//!    graphs that realize JOIN, MERGE, and CONCAT, either by aligning
//!    already-partitioned indices or by hash-shuffling on arbitrary columns.
//!
//! Floe plans; it never executes. Every public operation is pure and
//! single-threaded: it consumes immutable inputs and returns a new
//! [`Frame`] owning an immutable graph fragment. The executor, the
//! in-memory relational kernel, and the data-movement primitives are
//! external collaborators reached through documented contracts (see
//! [`exchange`] and the [`Op`] variants).
//!
//! ## Quick Start
//!
//! ```no_run
//! use floe::testing::{PlanOnlyExchange, literal_frame};
//! use floe::{MergeOptions, merge, order};
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let exchange = PlanOnlyExchange;
//!
//! // Two partitioned frames: block boundaries along the index, plus columns.
//! let users = literal_frame("users", &["id", "name"], &[0i64, 50, 100])?;
//! let orders = literal_frame("orders", &["id", "total"], &[0i64, 100])?;
//!
//! // No keys given: merge joins on the shared column `id` via hash join.
//! let joined = merge(
//!     &exchange,
//!     users.into(),
//!     orders.into(),
//!     MergeOptions::default(),
//! )?;
//! assert_eq!(joined.schema().columns(), ["id", "name", "total"]);
//!
//! // The executor consumes the graph plus its priority map.
//! let priorities = order(joined.graph())?;
//! assert_eq!(priorities.len(), joined.graph().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Task graphs
//!
//! A [`TaskGraph`] maps opaque [`Key`]s to node values ([`Expr`]): either a
//! literal or a deferred [`Task`] whose arguments are references to other
//! nodes, verbatim values, or empty schema-bearing blocks. Graphs are
//! acyclic, append-only during planning, and unioned by content-hashed
//! names, so identical logical operations collapse onto the same nodes.
//!
//! ### Frames and divisions
//!
//! A [`Frame`] is a logical ordered table split into blocks along its
//! index. Its [`Divisions`] are the sorted boundary values demarcating the
//! blocks -- or [`Divisions::Unknown`], which marks the frame as
//! unpartitioned and forces the shuffle path through every planner.
//!
//! ### Strategies
//!
//! - [`join_indexed`] aligns both inputs onto merged divisions
//!   ([`align_partitions`]), trims divisions the join kind cannot use
//!   ([`require`]), and emits one kernel join per division.
//! - [`hash_join`] shuffles both inputs on the join key and emits one
//!   kernel merge per shuffled block pair; the result has unknown
//!   divisions.
//! - [`concat_indexed`] aligns all inputs and emits one kernel concat per
//!   division, substituting empty blocks where an input is absent.
//! - [`merge`] resolves join keys (shared columns, explicit keys, or the
//!   row index), wraps in-memory operands, and dispatches to one of the
//!   strategies above.
//!
//! ### Ordering
//!
//! [`order`] ranks every node of a graph: a depth-first traversal from the
//! roots, steered by [`child_max`] over [`ndependents`] so the most
//! depended-on branch is explored first. Lower rank means higher priority;
//! the result is a deterministic function of the graph.
//!
//! ## Module Overview
//!
//! - [`key`] - node identifiers
//! - [`task`] - node values and the emitted operation vocabulary
//! - [`graph`] - the task-graph registry and derived dependencies
//! - [`order`] - static priority ordering
//! - [`frame`] - partitioned frames, divisions, scalars, local tables
//! - [`schema`] - column layouts and empty-block kernel resolution
//! - [`align`] - partition alignment and division pruning
//! - [`exchange`] - consumed repartition/shuffle contracts
//! - [`join`] - indexed joins, hash joins, and the merge dispatcher
//! - [`concat`] - index-aligned concatenation
//! - [`token`] - content-hashed task names
//! - [`testing`] - plan-only doubles and frame builders

pub mod align;
pub mod concat;
pub mod exchange;
pub mod frame;
pub mod graph;
pub mod join;
pub mod key;
pub mod order;
pub mod schema;
pub mod task;
pub mod testing;
pub mod token;

pub use align::{Parts, align_partitions, bound, maybe_align_partitions, require};
pub use concat::concat_indexed;
pub use exchange::Exchange;
pub use frame::{Divisions, Frame, IndexValue, LocalFrame, Operand, Scalar};
pub use graph::TaskGraph;
pub use join::{MergeInput, MergeOptions, hash_join, join_indexed, merge};
pub use key::Key;
pub use order::{child_max, ndependents, order};
pub use schema::Schema;
pub use task::{Axis, ConcatKind, Expr, JoinKey, JoinKind, Op, Task, TaskArg};
pub use token::tokenize;
