//! Mutual partition alignment and division pruning.
//!
//! Index-aligned operations need their inputs to agree on block boundaries
//! before any per-block work can be planned. [`align_partitions`] merges the
//! inputs' divisions, repartitions every frame onto the merged list, and
//! reports which frame has a block at which division. [`require`] then trims
//! the divisions a join can never produce output for, before any compute
//! runs.

use crate::exchange::Exchange;
use crate::frame::{Frame, IndexValue, Operand};
use crate::key::Key;
use anyhow::{Result, bail};
use log::debug;

/// Per-division block keys: `parts[i][t]` is the block of operand `t`
/// covering division `i`, or `None` where that operand has no block there.
pub type Parts = Vec<Vec<Option<Key>>>;

/// Slice of a sorted list bounded by `left` and `right`, both inclusive.
pub fn bound<'a>(seq: &'a [IndexValue], left: &IndexValue, right: &IndexValue) -> &'a [IndexValue] {
    let lo = seq.partition_point(|v| v < left);
    let hi = seq.partition_point(|v| v <= right);
    &seq[lo..hi]
}

/// Mutually partition and align the operands.
///
/// Returns the aligned operands, the merged division boundaries (the sorted
/// de-duplicated union of every frame's divisions), and the per-division
/// [`Parts`]. A frame whose index range does not span the union gets `None`
/// at the divisions it does not cover; scalars get `None` everywhere. Every
/// division has at least one contributing block because the boundaries are
/// the union.
///
/// # Errors
///
/// If no operand is a frame, or any frame has unknown divisions
/// (unpartitioned frames must be shuffled, not aligned).
pub fn align_partitions(
    exchange: &dyn Exchange,
    operands: &[Operand],
) -> Result<(Vec<Operand>, Vec<IndexValue>, Parts)> {
    let frames: Vec<&Frame> = operands.iter().filter_map(Operand::as_frame).collect();
    if frames.is_empty() {
        bail!("align: no frames among the operands");
    }
    for frame in &frames {
        if !frame.has_known_divisions() {
            bail!(
                "align: frame {} has unknown divisions; shuffle it instead of aligning",
                frame.name()
            );
        }
    }

    let mut divisions: Vec<IndexValue> = frames
        .iter()
        .filter_map(|f| f.divisions().boundaries())
        .flatten()
        .cloned()
        .collect();
    divisions.sort();
    divisions.dedup();

    let aligned: Vec<Operand> = operands
        .iter()
        .map(|operand| match operand {
            Operand::Frame(frame) => Ok(Operand::Frame(exchange.repartition(
                frame,
                &divisions,
                true,
            )?)),
            Operand::Scalar(scalar) => Ok(Operand::Scalar(scalar.clone())),
        })
        .collect::<Result<_>>()?;

    // Each operand walks its own divisions; a block is emitted only when the
    // operand's current boundary equals the merged one.
    let mut cursor = vec![0usize; aligned.len()];
    let mut parts: Parts = Vec::with_capacity(divisions.len() - 1);
    for boundary in &divisions[..divisions.len() - 1] {
        let mut row = Vec::with_capacity(aligned.len());
        for (t, operand) in aligned.iter().enumerate() {
            let slot = match operand {
                Operand::Frame(frame) => {
                    let Some(own) = frame.divisions().boundaries() else {
                        bail!(
                            "align: repartition returned unknown divisions for {}",
                            frame.name()
                        );
                    };
                    let j = cursor[t];
                    if j + 1 < own.len() && own[j] == *boundary {
                        cursor[t] += 1;
                        Some(frame.block(j))
                    } else {
                        None
                    }
                }
                Operand::Scalar(_) => None,
            };
            row.push(slot);
        }
        parts.push(row);
    }

    debug!(
        "align: {} operands onto {} divisions",
        operands.len(),
        divisions.len() - 1
    );
    Ok((aligned, divisions, parts))
}

/// Align only when the frames' divisions differ.
///
/// # Errors
///
/// As [`align_partitions`], when alignment is needed.
pub fn maybe_align_partitions(
    exchange: &dyn Exchange,
    operands: Vec<Operand>,
) -> Result<Vec<Operand>> {
    let mut frames = operands.iter().filter_map(Operand::as_frame);
    let Some(first) = frames.next() else {
        return Ok(operands);
    };
    if frames.all(|f| f.divisions() == first.divisions()) {
        return Ok(operands);
    }
    let (aligned, _, _) = align_partitions(exchange, &operands)?;
    Ok(aligned)
}

/// Trim divisions where a required operand is absent.
///
/// For each index in `required`, the divisions are restricted to the
/// contiguous span where that operand has blocks; applying several indices
/// intersects the restrictions. Joins use this to discard blocks that could
/// not contribute any rows -- the mask per join kind is
/// [`JoinKind::required_mask`](crate::task::JoinKind::required_mask).
///
/// # Errors
///
/// If a required operand has no block at any division.
pub fn require(
    divisions: &[IndexValue],
    parts: &[Vec<Option<Key>>],
    required: &[usize],
) -> Result<(Vec<IndexValue>, Parts)> {
    let mut divisions = divisions.to_vec();
    let mut parts: Parts = parts.to_vec();
    for &side in required {
        let present: Vec<usize> = parts
            .iter()
            .enumerate()
            .filter(|(_, row)| row[side].is_some())
            .map(|(j, _)| j)
            .collect();
        let (Some(&lo), Some(&hi)) = (present.first(), present.last()) else {
            bail!("require: operand {side} has no block at any division");
        };
        divisions = divisions[lo..=hi + 1].to_vec();
        parts = parts[lo..=hi].to_vec();
    }
    Ok((divisions, parts))
}

// Frame-only alignment used by the join and concat planners.
pub(crate) fn align_frames(
    exchange: &dyn Exchange,
    frames: &[&Frame],
) -> Result<(Vec<Frame>, Vec<IndexValue>, Parts)> {
    let operands: Vec<Operand> = frames
        .iter()
        .map(|f| Operand::Frame((*f).clone()))
        .collect();
    let (aligned, divisions, parts) = align_partitions(exchange, &operands)?;
    let frames = aligned
        .into_iter()
        .map(|operand| match operand {
            Operand::Frame(frame) => Ok(frame),
            Operand::Scalar(scalar) => {
                bail!("align: unexpected scalar {} among frames", scalar.name())
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((frames, divisions, parts))
}
