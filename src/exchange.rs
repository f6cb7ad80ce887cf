//! Consumed data-movement contracts.
//!
//! Repartitioning and shuffling move rows between blocks; they are external
//! primitives with their own planners. This crate only relies on the output
//! *shape* contracts documented on each method, so any implementation that
//! honors them can drive alignment and hash joins.
//! [`PlanOnlyExchange`](crate::testing::PlanOnlyExchange) is a
//! graph-emitting implementation for tests and plan inspection.

use crate::frame::{Frame, IndexValue};
use crate::task::JoinKey;
use anyhow::Result;

/// Data-movement primitives consumed by the planner.
pub trait Exchange {
    /// Redistribute `frame` onto the boundaries of `divisions`.
    ///
    /// Output contract: the result's divisions are `divisions` clipped to
    /// the frame's own index range (a frame never grows past its own first
    /// and last boundary), and every input row falls in the output block
    /// covering it. `force` permits boundaries that extend beyond the
    /// current ones.
    fn repartition(
        &self,
        frame: &Frame,
        divisions: &[IndexValue],
        force: bool,
    ) -> Result<Frame>;

    /// Redistribute rows by hash of the join key.
    ///
    /// Output contract: exactly `npartitions` blocks, unknown divisions,
    /// and block `i` holds every row whose key hash maps to `i`.
    fn shuffle(&self, frame: &Frame, on: &JoinKey, npartitions: usize) -> Result<Frame>;
}
