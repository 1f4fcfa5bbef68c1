//! Window splice operator.
//!
//! Bridges the streaming pull protocol and the materialized window
//! framework: rows are buffered one partition at a time, the partition
//! is evaluated, and its rows are replayed downstream with the window
//! results spliced into their destination registers.

use riffle_core::Value;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::expr::{evaluate, ScalarExpr};
use crate::exec::registers::RegisterFile;
use crate::exec::relation::{Relation, RelationBody, Step};
use crate::exec::window::{evaluate_partition, PartitionBuilder, WindowAssignment, WindowPartition};

/// A buffered first row of the next partition, read while detecting the
/// current partition's end.
struct PendingRow {
    row: RegisterFile,
    partition_key: Vec<Value>,
    order_key: Vec<Value>,
}

enum SpliceState {
    Fill,
    Drain { partition: WindowPartition, cursor: usize },
    Finished,
}

/// Buffers one partition at a time, evaluates the assigned window
/// functions over it, and replays the augmented rows.
///
/// Input rows must arrive clustered by partition key and sorted by order
/// key within each partition; a change in partition key closes the
/// current partition. An empty `partition_by` puts every row in one
/// partition, and an empty `order_by` makes the whole partition one
/// ordering group. Buffering is capped by
/// [`EvalConfig::max_partition_rows`](crate::exec::EvalConfig::with_max_partition_rows).
pub struct WindowSpliceOp {
    input: Relation,
    partition_by: Vec<ScalarExpr>,
    order_by: Vec<ScalarExpr>,
    assignments: Vec<WindowAssignment>,
    pending: Option<PendingRow>,
    input_done: bool,
    state: SpliceState,
}

impl WindowSpliceOp {
    /// Creates a splice over `input` computing `assignments`.
    #[must_use]
    pub fn new(input: Relation, assignments: Vec<WindowAssignment>) -> Self {
        Self {
            input,
            partition_by: Vec::new(),
            order_by: Vec::new(),
            assignments,
            pending: None,
            input_done: false,
            state: SpliceState::Fill,
        }
    }

    /// Sets the partition key expressions.
    #[must_use]
    pub fn with_partition_by(mut self, exprs: Vec<ScalarExpr>) -> Self {
        self.partition_by = exprs;
        self
    }

    /// Sets the order key expressions.
    #[must_use]
    pub fn with_order_by(mut self, exprs: Vec<ScalarExpr>) -> Self {
        self.order_by = exprs;
        self
    }

    /// Wraps the operator into a [`Relation`].
    #[must_use]
    pub fn into_relation(self) -> Relation {
        Relation::new("WindowSplice", self)
    }

    /// Buffers rows until the partition key changes or input ends, then
    /// evaluates the partition. Returns `None` once no rows remain.
    fn fill_partition(
        &mut self,
        regs: &mut RegisterFile,
        ctx: &EvalContext,
    ) -> EvalResult<Option<WindowPartition>> {
        let mut builder = PartitionBuilder::new(ctx.max_partition_rows());
        let mut current_key: Option<Vec<Value>> = None;

        if let Some(pending) = self.pending.take() {
            current_key = Some(pending.partition_key);
            builder.push(pending.row, pending.order_key)?;
            ctx.record_rows_buffered(1);
        }

        while !self.input_done {
            if !self.input.next_row(regs, ctx)? {
                self.input_done = true;
                break;
            }
            let partition_key = eval_keys(&self.partition_by, regs, ctx)?;
            let order_key = eval_keys(&self.order_by, regs, ctx)?;
            match &current_key {
                Some(key) if *key != partition_key => {
                    self.pending = Some(PendingRow {
                        row: regs.clone(),
                        partition_key,
                        order_key,
                    });
                    break;
                }
                _ => {
                    current_key = Some(partition_key);
                    builder.push(regs.clone(), order_key)?;
                    ctx.record_rows_buffered(1);
                }
            }
        }

        if builder.is_empty() {
            return Ok(None);
        }
        let mut partition = builder.finish();
        evaluate_partition(&mut partition, &mut self.assignments, regs, ctx)?;
        Ok(Some(partition))
    }
}

impl RelationBody for WindowSpliceOp {
    fn resume(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<Step> {
        loop {
            if let SpliceState::Drain { partition, cursor } = &mut self.state {
                if *cursor < partition.len() {
                    regs.load_from(partition.row(*cursor));
                    *cursor += 1;
                    return Ok(Step::Yield);
                }
                self.state = SpliceState::Fill;
                continue;
            }
            if matches!(self.state, SpliceState::Finished) {
                return Ok(Step::Done);
            }
            match self.fill_partition(regs, ctx)? {
                Some(partition) => {
                    self.state = SpliceState::Drain {
                        partition,
                        cursor: 0,
                    };
                }
                None => {
                    self.state = SpliceState::Finished;
                    return Ok(Step::Done);
                }
            }
        }
    }
}

fn eval_keys(
    exprs: &[ScalarExpr],
    regs: &RegisterFile,
    ctx: &EvalContext,
) -> EvalResult<Vec<Value>> {
    exprs.iter().map(|expr| evaluate(expr, regs, ctx)).collect()
}
