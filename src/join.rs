//! Multi-frame join planning.
//!
//! Two cases matter:
//!
//! 1. **Joining along a partitioned index.** We know which blocks of each
//!    frame can interact, so the plan aligns the inputs
//!    ([`align_partitions`](crate::align::align_partitions)), trims
//!    divisions the join kind cannot use
//!    ([`require`](crate::align::require)), and emits one embarrassingly
//!    parallel kernel join per remaining division. See [`join_indexed`].
//! 2. **Joining along an unpartitioned index or an arbitrary column.** Any
//!    block of one input might interact with any block of the other, so
//!    both sides are hash-shuffled on the join key first; the shuffled
//!    inputs are cleanly separated along that key and the join is again one
//!    kernel call per block pair. See [`hash_join`].
//!
//! [`merge`] is the dispatcher: it resolves the join keys, wraps in-memory
//! operands, and picks between the two strategies.

use crate::align::{align_frames, require};
use crate::exchange::Exchange;
use crate::frame::{Divisions, Frame, LocalFrame};
use crate::graph::TaskGraph;
use crate::key::Key;
use crate::schema;
use crate::task::{Expr, JoinKey, JoinKind, Op, TaskArg};
use crate::token::tokenize;
use anyhow::{Result, bail};
use log::debug;
use serde_json::Value;

/// Join two frames along their partitioned index.
///
/// At divisions where only one side has a block, a side required by `how`
/// is paired with an empty block bearing the other side's schema; divisions
/// where no required side is present emit a null literal (no output block).
///
/// # Errors
///
/// If either frame has unknown divisions, the output schemas collide, or a
/// consumed contract is violated.
pub fn join_indexed(
    exchange: &dyn Exchange,
    left: &Frame,
    right: &Frame,
    how: JoinKind,
    lsuffix: &str,
    rsuffix: &str,
) -> Result<Frame> {
    let (aligned, divisions, parts) = align_frames(exchange, &[left, right])?;
    let (divisions, parts) = require(&divisions, &parts, how.required_mask())?;
    let columns = schema::join_columns(left.schema(), right.schema(), lsuffix, rsuffix)?;

    let token = tokenize(&(left.name(), right.name(), how, lsuffix, rsuffix))?;
    let name = format!("join-indexed-{token}");
    let op = Op::Join {
        how,
        lsuffix: lsuffix.to_string(),
        rsuffix: rsuffix.to_string(),
    };

    let mut graph = TaskGraph::new();
    graph.extend(aligned[0].graph());
    graph.extend(aligned[1].graph());
    for (i, row) in parts.iter().enumerate() {
        let expr = match (&row[0], &row[1]) {
            (Some(a), Some(b)) => Expr::task(
                op.clone(),
                vec![TaskArg::Ref(a.clone()), TaskArg::Ref(b.clone())],
            ),
            (Some(a), None) if matches!(how, JoinKind::Left | JoinKind::Outer) => Expr::task(
                op.clone(),
                vec![
                    TaskArg::Ref(a.clone()),
                    TaskArg::EmptyBlock(right.schema().clone()),
                ],
            ),
            (None, Some(b)) if matches!(how, JoinKind::Right | JoinKind::Outer) => Expr::task(
                op.clone(),
                vec![
                    TaskArg::EmptyBlock(left.schema().clone()),
                    TaskArg::Ref(b.clone()),
                ],
            ),
            _ => Expr::Literal(Value::Null),
        };
        graph.insert(Key::block(&name, i), expr);
    }

    Frame::new(graph, name, columns, Divisions::known(divisions)?)
}

/// Join two frames on arbitrary keys with a hash join.
///
/// Both inputs are shuffled on their join key into `npartitions` blocks
/// (default: the larger of the two inputs' block counts), then merged
/// block-by-block. Key-hashed partitioning loses index ordering, so the
/// result has unknown divisions.
///
/// # Errors
///
/// If the output schemas collide or a consumed contract is violated.
#[allow(clippy::too_many_arguments)]
pub fn hash_join(
    exchange: &dyn Exchange,
    left: &Frame,
    left_on: &JoinKey,
    right: &Frame,
    right_on: &JoinKey,
    how: JoinKind,
    npartitions: Option<usize>,
    suffixes: (&str, &str),
) -> Result<Frame> {
    let npartitions =
        npartitions.unwrap_or_else(|| left.npartitions().max(right.npartitions()));
    let shuffled_left = exchange.shuffle(left, left_on, npartitions)?;
    let shuffled_right = exchange.shuffle(right, right_on, npartitions)?;

    let left_columns = left_on.columns().map(<[String]>::to_vec);
    let right_columns = right_on.columns().map(<[String]>::to_vec);
    let columns = schema::merge_columns(
        left.schema(),
        right.schema(),
        left_columns.as_deref(),
        right_columns.as_deref(),
        left_on.is_index(),
        right_on.is_index(),
        suffixes,
    )?;

    let token = tokenize(&(
        left.name(),
        left_on,
        right.name(),
        right_on,
        how,
        npartitions,
        suffixes,
    ))?;
    let name = format!("hash-join-{token}");
    debug!("hash-join: {name} over {npartitions} partitions");

    let op = Op::Merge {
        how,
        left_on: left_columns,
        right_on: right_columns,
        left_index: left_on.is_index(),
        right_index: right_on.is_index(),
        suffixes: (suffixes.0.to_string(), suffixes.1.to_string()),
        left_schema: left.schema().clone(),
        right_schema: right.schema().clone(),
    };

    let mut graph = TaskGraph::new();
    graph.extend(shuffled_left.graph());
    graph.extend(shuffled_right.graph());
    for i in 0..npartitions {
        graph.insert_task(
            Key::block(&name, i),
            op.clone(),
            vec![
                TaskArg::Ref(shuffled_left.block(i)),
                TaskArg::Ref(shuffled_right.block(i)),
            ],
        );
    }

    Frame::new(graph, name, columns, Divisions::unknown(npartitions))
}

/// Either operand of [`merge`].
#[derive(Clone, Debug, PartialEq)]
pub enum MergeInput {
    /// A partitioned frame.
    Frame(Frame),
    /// An in-memory table, wrapped during dispatch.
    Local(LocalFrame),
}

impl MergeInput {
    fn schema(&self) -> &schema::Schema {
        match self {
            MergeInput::Frame(frame) => frame.schema(),
            MergeInput::Local(local) => &local.schema,
        }
    }
}

impl From<Frame> for MergeInput {
    fn from(frame: Frame) -> Self {
        MergeInput::Frame(frame)
    }
}

impl From<LocalFrame> for MergeInput {
    fn from(local: LocalFrame) -> Self {
        MergeInput::Local(local)
    }
}

/// Keyword-style options of [`merge`].
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOptions {
    pub how: JoinKind,
    /// Columns to join on when present on both sides.
    pub on: Option<Vec<String>>,
    pub left_on: Option<Vec<String>>,
    pub right_on: Option<Vec<String>>,
    pub left_index: bool,
    pub right_index: bool,
    /// Suffixes applied to overlapping non-key columns.
    pub suffixes: (String, String),
    /// Partition count of a hash join; defaults to the larger input.
    pub npartitions: Option<usize>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            how: JoinKind::Inner,
            on: None,
            left_on: None,
            right_on: None,
            left_index: false,
            right_index: false,
            suffixes: ("_x".to_string(), "_y".to_string()),
            npartitions: None,
        }
    }
}

/// Merge two tables, choosing the strategy from the resolved join keys.
///
/// Key selection precedence:
///
/// 1. With no key argument at all, join on the columns the sides share; if
///    they share none, join on both indices.
/// 2. `on` propagates to `left_on`/`right_on`.
/// 3. In-memory operands are wrapped as single-block frames. When exactly
///    one side is in-memory, the other side is index-joined, and the
///    in-memory side names key columns, its index is re-seated from those
///    columns first so both sides join on the index.
/// 4. Both sides index-joined with known divisions dispatches to
///    [`join_indexed`]; anything else dispatches to [`hash_join`] (unknown
///    divisions force the shuffle path), with the row index standing in for
///    an index-joined side's key.
///
/// # Errors
///
/// If a non-index side ends up without key columns, or the chosen strategy
/// fails.
pub fn merge(
    exchange: &dyn Exchange,
    left: MergeInput,
    right: MergeInput,
    options: MergeOptions,
) -> Result<Frame> {
    let mut options = options;

    if options.on.is_none()
        && options.left_on.is_none()
        && options.right_on.is_none()
        && !options.left_index
        && !options.right_index
    {
        let shared = left.schema().intersection(right.schema());
        if shared.is_empty() {
            options.left_index = true;
            options.right_index = true;
        } else {
            options.on = Some(shared);
        }
    }

    if options.left_on.is_none() && options.right_on.is_none() {
        if let Some(on) = options.on.take() {
            options.left_on = Some(on.clone());
            options.right_on = Some(on);
        }
    }

    if let (MergeInput::Local(l), MergeInput::Local(r)) = (&left, &right) {
        return merge_local(l, r, &options);
    }

    let left = match left {
        MergeInput::Frame(frame) => frame,
        MergeInput::Local(local) => match options.left_on.take_if(|_| options.right_index) {
            Some(columns) => {
                options.left_index = true;
                seat_local_on_index(local, columns)?
            }
            None => Frame::from_local(local)?,
        },
    };
    let right = match right {
        MergeInput::Frame(frame) => frame,
        MergeInput::Local(local) => match options.right_on.take_if(|_| options.left_index) {
            Some(columns) => {
                options.right_index = true;
                seat_local_on_index(local, columns)?
            }
            None => Frame::from_local(local)?,
        },
    };

    if options.left_index
        && options.right_index
        && left.has_known_divisions()
        && right.has_known_divisions()
    {
        debug!("merge: indexed join of {} and {}", left.name(), right.name());
        return join_indexed(
            exchange,
            &left,
            &right,
            options.how,
            &options.suffixes.0,
            &options.suffixes.1,
        );
    }

    let left_key = resolve_key(options.left_index, options.left_on.take(), "left")?;
    let right_key = resolve_key(options.right_index, options.right_on.take(), "right")?;
    debug!("merge: hash join of {} and {}", left.name(), right.name());
    hash_join(
        exchange,
        &left,
        &left_key,
        &right,
        &right_key,
        options.how,
        options.npartitions,
        (options.suffixes.0.as_str(), options.suffixes.1.as_str()),
    )
}

// Both operands in memory: a single merge task over the two payloads.
fn merge_local(left: &LocalFrame, right: &LocalFrame, options: &MergeOptions) -> Result<Frame> {
    let columns = schema::merge_columns(
        &left.schema,
        &right.schema,
        options.left_on.as_deref(),
        options.right_on.as_deref(),
        options.left_index,
        options.right_index,
        (options.suffixes.0.as_str(), options.suffixes.1.as_str()),
    )?;
    let token = tokenize(&(
        left,
        right,
        options.how,
        &options.left_on,
        &options.right_on,
        options.left_index,
        options.right_index,
        &options.suffixes,
    ))?;
    let name = format!("merge-local-{token}");
    let mut graph = TaskGraph::new();
    graph.insert_task(
        Key::block(&name, 0),
        Op::Merge {
            how: options.how,
            left_on: options.left_on.clone(),
            right_on: options.right_on.clone(),
            left_index: options.left_index,
            right_index: options.right_index,
            suffixes: options.suffixes.clone(),
            left_schema: left.schema.clone(),
            right_schema: right.schema.clone(),
        },
        vec![
            TaskArg::Literal(left.payload.clone()),
            TaskArg::Literal(right.payload.clone()),
        ],
    );
    Frame::new(graph, name, columns, Divisions::unknown(1))
}

// Wrap an in-memory operand whose index is re-seated from its key columns.
// The columns stay in the block; the resulting frame is index-joinable but
// its divisions are no longer known.
fn seat_local_on_index(local: LocalFrame, columns: Vec<String>) -> Result<Frame> {
    let token = tokenize(&(&local.schema, &local.payload, &columns))?;
    let source = Key::Atom(format!("local-{token}"));
    let name = format!("set-index-{token}");
    let mut graph = TaskGraph::new();
    graph.insert_literal(source.clone(), local.payload);
    graph.insert_task(
        Key::block(&name, 0),
        Op::SetIndex { columns },
        vec![TaskArg::Ref(source)],
    );
    Frame::new(graph, name, local.schema, Divisions::unknown(1))
}

fn resolve_key(index: bool, on: Option<Vec<String>>, side: &str) -> Result<JoinKey> {
    if index {
        return Ok(JoinKey::Index);
    }
    match on {
        Some(columns) => Ok(JoinKey::On(columns)),
        None => bail!("merge: {side} side has neither key columns nor an index join"),
    }
}
