//! Testing utilities for plan construction.
//!
//! This module provides the pieces needed to exercise the planners without
//! an executor or a real data-movement layer:
//!
//! - [`PlanOnlyExchange`]: a graph-emitting implementation of the
//!   [`Exchange`] contract. Its repartition and shuffle plans consist of
//!   [`Op::Named`] tasks an executor would resolve; only the output *shapes*
//!   matter, and they honor the contracts documented on the trait.
//! - [`literal_frame`]: a frame whose blocks are materialized literals, the
//!   usual starting point of a plan under test.
//! - [`block_exprs`]: the emitted expressions of a frame's blocks, in
//!   index order, for asserting on plan structure.

use crate::align::bound;
use crate::exchange::Exchange;
use crate::frame::{Divisions, Frame, IndexValue};
use crate::graph::TaskGraph;
use crate::key::Key;
use crate::schema::Schema;
use crate::task::{Expr, JoinKey, Op, TaskArg};
use crate::token::tokenize;
use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};

/// Graph-emitting double for the [`Exchange`] contract.
pub struct PlanOnlyExchange;

impl Exchange for PlanOnlyExchange {
    fn repartition(
        &self,
        frame: &Frame,
        divisions: &[IndexValue],
        force: bool,
    ) -> Result<Frame> {
        let Some(own) = frame.divisions().boundaries() else {
            bail!("repartition: frame {} has unknown divisions", frame.name());
        };
        let (Some(first), Some(last)) = (own.first(), own.last()) else {
            bail!("repartition: frame {} has no boundaries", frame.name());
        };
        if !force && (divisions.first() != Some(first) || divisions.last() != Some(last)) {
            bail!(
                "repartition: boundaries of {} would change without force",
                frame.name()
            );
        }

        let clipped = bound(divisions, first, last).to_vec();
        if clipped.len() < 2 {
            bail!(
                "repartition: requested divisions do not cover frame {}",
                frame.name()
            );
        }

        let token = tokenize(&(frame.name(), &clipped))?;
        let name = format!("repartition-{token}");
        let mut graph = frame.graph().clone();
        for i in 0..clipped.len() - 1 {
            // Source blocks overlapping the output range [clipped[i], clipped[i+1]).
            let mut args = vec![
                TaskArg::Literal(to_json(&clipped[i])?),
                TaskArg::Literal(to_json(&clipped[i + 1])?),
            ];
            for j in 0..own.len() - 1 {
                if own[j] < clipped[i + 1] && own[j + 1] > clipped[i] {
                    args.push(TaskArg::Ref(frame.block(j)));
                }
            }
            graph.insert_task(
                Key::block(&name, i),
                Op::Named("repartition-slice".to_string()),
                args,
            );
        }
        Frame::new(
            graph,
            name,
            frame.schema().clone(),
            Divisions::known(clipped)?,
        )
    }

    fn shuffle(&self, frame: &Frame, on: &JoinKey, npartitions: usize) -> Result<Frame> {
        if npartitions == 0 {
            bail!("shuffle: zero partitions requested for {}", frame.name());
        }
        let token = tokenize(&(frame.name(), on, npartitions))?;
        let name = format!("shuffle-{token}");
        let mut graph = frame.graph().clone();
        for i in 0..npartitions {
            let mut args = vec![
                TaskArg::Literal(serde_json::to_value(on)?),
                TaskArg::Literal(json!([i, npartitions])),
            ];
            args.extend(frame.blocks().into_iter().map(TaskArg::Ref));
            graph.insert_task(
                Key::block(&name, i),
                Op::Named("shuffle-collect".to_string()),
                args,
            );
        }
        Frame::new(
            graph,
            name,
            frame.schema().clone(),
            Divisions::unknown(npartitions),
        )
    }
}

/// Frame whose blocks are literal placeholders.
///
/// `boundaries` must hold one more entry than the intended block count.
///
/// # Errors
///
/// If the columns or boundaries are invalid.
pub fn literal_frame<B>(name: &str, columns: &[&str], boundaries: &[B]) -> Result<Frame>
where
    B: Clone + Into<IndexValue>,
{
    let divisions = Divisions::known(
        boundaries
            .iter()
            .map(|b| b.clone().into())
            .collect::<Vec<_>>(),
    )?;
    let mut graph = TaskGraph::new();
    for i in 0..divisions.nblocks() {
        graph.insert_literal(Key::block(name, i), Value::Null);
    }
    Frame::new(graph, name, Schema::new(columns.iter().copied())?, divisions)
}

/// Frame with unknown divisions, shaped like a shuffle output.
///
/// # Errors
///
/// If the columns are invalid.
pub fn unpartitioned_frame(name: &str, columns: &[&str], nblocks: usize) -> Result<Frame> {
    let mut graph = TaskGraph::new();
    for i in 0..nblocks {
        graph.insert_literal(Key::block(name, i), Value::Null);
    }
    Frame::new(
        graph,
        name,
        Schema::new(columns.iter().copied())?,
        Divisions::unknown(nblocks),
    )
}

/// The emitted expressions of a frame's blocks, in index order.
///
/// # Errors
///
/// If the frame's graph is missing one of its blocks.
pub fn block_exprs(frame: &Frame) -> Result<Vec<&Expr>> {
    (0..frame.npartitions())
        .map(|i| {
            frame
                .graph()
                .get(&frame.block(i))
                .ok_or_else(|| anyhow!("frame {} is missing block {i}", frame.name()))
        })
        .collect()
}

fn to_json(value: &IndexValue) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
