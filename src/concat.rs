//! Index-aligned concatenation planning.

use crate::align::align_frames;
use crate::exchange::Exchange;
use crate::frame::{Divisions, Frame};
use crate::graph::TaskGraph;
use crate::key::Key;
use crate::schema;
use crate::task::{Axis, ConcatKind, Op, TaskArg};
use crate::token::tokenize;
use anyhow::{Result, bail};

/// Concatenate frames along their partitioned index.
///
/// The inputs are aligned onto their merged divisions and one kernel concat
/// is emitted per division. Where an input has no block at a division, the
/// task receives an empty block bearing that input's schema; the kernel
/// wrapper's column-axis rules (pad empties for `Outer`, force the result
/// empty for `Inner`) ride on the emitted [`Op::Concat`].
///
/// # Errors
///
/// If `frames` is empty, any frame has unknown divisions, or the output
/// schema would carry a duplicate column.
pub fn concat_indexed(
    exchange: &dyn Exchange,
    frames: &[Frame],
    axis: Axis,
    how: ConcatKind,
) -> Result<Frame> {
    if frames.is_empty() {
        bail!("concat: no input frames");
    }
    let inputs: Vec<&Frame> = frames.iter().collect();
    let (aligned, divisions, parts) = align_frames(exchange, &inputs)?;

    let schemas: Vec<&schema::Schema> = frames.iter().map(Frame::schema).collect();
    let columns = schema::concat_columns(&schemas, axis, how)?;

    let token = tokenize(&(
        how,
        axis,
        frames.iter().map(Frame::name).collect::<Vec<_>>(),
    ))?;
    let name = format!("concat-indexed-{token}");

    let mut graph = TaskGraph::new();
    for frame in &aligned {
        graph.extend(frame.graph());
    }
    for (i, row) in parts.iter().enumerate() {
        let args = row
            .iter()
            .enumerate()
            .map(|(t, slot)| match slot {
                Some(key) => TaskArg::Ref(key.clone()),
                None => TaskArg::EmptyBlock(frames[t].schema().clone()),
            })
            .collect();
        graph.insert_task(Key::block(&name, i), Op::Concat { axis, how }, args);
    }

    Frame::new(graph, name, columns, Divisions::known(divisions)?)
}
