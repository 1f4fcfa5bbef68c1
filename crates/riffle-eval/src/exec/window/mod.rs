//! The window-function framework.
//!
//! Window functions need random access into a partition of known size,
//! which the pull protocol cannot provide; the framework therefore buffers
//! one partition at a time as materialized register snapshots, evaluates
//! every assigned function row by row, then hands the rows back to the
//! pull pipeline.
//!
//! # Per-partition protocol
//!
//! 1. [`WindowFunction::reset`] on every assigned function.
//! 2. For each row in ordinal order: load the row into the live register
//!    file, evaluate each function in assignment order passing the row's
//!    [`OrderingGroup`], write the result into the function's destination
//!    register, and persist it into the stored partition row. A later
//!    function evaluated at the same row therefore sees earlier functions'
//!    results, while every function's own cursor tracks raw input
//!    position.

mod functions;
mod registry;


pub use functions::{DenseRank, Navigation, Rank, RowNumber, WindowFunction};
pub use registry::{WindowFunctionBuilder, WindowFunctionRegistry};

use std::fmt;

use riffle_core::Value;
use tracing::{debug, warn};

use crate::error::{EvalError, EvalResult};
use crate::exec::context::EvalContext;
use crate::exec::registers::RegisterFile;

/// The maximal run of rows within a partition sharing one ORDER BY key,
/// as a `[start, end)` ordinal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderingGroup {
    /// Ordinal of the group's first row.
    pub start: usize,
    /// One past the ordinal of the group's last row.
    pub end: usize,
}

/// An ordered, finite, materialized partition of rows sharing one
/// PARTITION BY key.
///
/// Window functions read it; only the framework writes computed results
/// back into its rows.
#[derive(Debug, Clone)]
pub struct WindowPartition {
    rows: Vec<RegisterFile>,
    group_starts: Vec<usize>,
    group_ends: Vec<usize>,
}

impl WindowPartition {
    /// Returns the number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the partition has no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    #[inline]
    #[must_use]
    pub fn row(&self, pos: usize) -> &RegisterFile {
        &self.rows[pos]
    }

    /// Returns the row at `pos` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    #[inline]
    pub fn row_mut(&mut self, pos: usize) -> &mut RegisterFile {
        &mut self.rows[pos]
    }

    /// Returns the ordering group containing the row at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds.
    #[inline]
    #[must_use]
    pub fn group(&self, pos: usize) -> OrderingGroup {
        OrderingGroup {
            start: self.group_starts[pos],
            end: self.group_ends[pos],
        }
    }
}

/// Accumulates one partition's rows and derives ordering-group boundaries
/// from ORDER BY key changes.
#[derive(Debug)]
pub struct PartitionBuilder {
    rows: Vec<RegisterFile>,
    group_starts: Vec<usize>,
    last_key: Option<Vec<Value>>,
    max_rows: usize,
}

impl PartitionBuilder {
    /// Creates a builder enforcing `max_rows` buffered rows (0 disables
    /// the limit).
    #[must_use]
    pub fn new(max_rows: usize) -> Self {
        Self {
            rows: Vec::new(),
            group_starts: Vec::new(),
            last_key: None,
            max_rows,
        }
    }

    /// Appends a row snapshot with its ORDER BY key.
    ///
    /// Rows must arrive sorted; a key unequal to the previous row's key
    /// starts a new ordering group.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::PartitionLimitExceeded`] when the buffered row
    /// count would pass the limit.
    pub fn push(&mut self, row: RegisterFile, order_key: Vec<Value>) -> EvalResult<()> {
        if self.max_rows != 0 && self.rows.len() == self.max_rows {
            return Err(EvalError::PartitionLimitExceeded {
                limit: self.max_rows,
            });
        }
        let new_group = self.last_key.as_ref() != Some(&order_key);
        if new_group {
            self.last_key = Some(order_key);
        }
        let start = if new_group {
            self.rows.len()
        } else {
            // Non-empty: a repeated key implies a previous row.
            self.group_starts.last().copied().unwrap_or(0)
        };
        self.group_starts.push(start);
        self.rows.push(row);
        // Warn once at 90% of the limit.
        if self.max_rows != 0 && self.rows.len() == self.max_rows - self.max_rows / 10 {
            warn!(
                buffered = self.rows.len(),
                limit = self.max_rows,
                "window partition nearing its buffering limit"
            );
        }
        Ok(())
    }

    /// Returns the number of buffered rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no rows are buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finishes the partition, computing ordering-group end bounds.
    #[must_use]
    pub fn finish(self) -> WindowPartition {
        let n = self.rows.len();
        let mut group_ends = vec![0; n];
        let mut end = n;
        for pos in (0..n).rev() {
            group_ends[pos] = end;
            if pos > 0 && self.group_starts[pos - 1] != self.group_starts[pos] {
                end = pos;
            }
        }
        WindowPartition {
            rows: self.rows,
            group_starts: self.group_starts,
            group_ends,
        }
    }
}

/// One window function bound to its destination register.
pub struct WindowAssignment {
    /// The function instance, constructed once per invocation site.
    pub function: Box<dyn WindowFunction>,
    /// The register the per-row result is written to.
    pub dest: usize,
}

impl WindowAssignment {
    /// Creates an assignment.
    #[must_use]
    pub fn new(function: Box<dyn WindowFunction>, dest: usize) -> Self {
        Self { function, dest }
    }
}

impl fmt::Debug for WindowAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowAssignment")
            .field("function", &self.function.name())
            .field("dest", &self.dest)
            .finish()
    }
}

/// Evaluates every assigned window function over one partition.
///
/// Implements the per-partition protocol documented at the module level.
/// The cancellation flag is checked at each row boundary.
///
/// # Errors
///
/// Propagates function failures and [`EvalError::Interrupted`].
pub fn evaluate_partition(
    partition: &mut WindowPartition,
    assignments: &mut [WindowAssignment],
    regs: &mut RegisterFile,
    ctx: &EvalContext,
) -> EvalResult<()> {
    debug!(
        rows = partition.len(),
        functions = assignments.len(),
        "evaluating window partition"
    );
    for assignment in assignments.iter_mut() {
        assignment.function.reset(partition);
    }
    for pos in 0..partition.len() {
        ctx.check_interrupted()?;
        regs.load_from(partition.row(pos));
        let group = partition.group(pos);
        for assignment in assignments.iter_mut() {
            let value = assignment.function.eval(regs, partition, group, ctx)?;
            regs.set_value(assignment.dest, value.clone());
            partition.row_mut(pos).set_value(assignment.dest, value);
        }
    }
    ctx.record_partition_evaluated();
    Ok(())
}
