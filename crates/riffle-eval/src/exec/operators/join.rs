//! Nested-loop join operator.

use riffle_core::Value;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::expr::{evaluate, ScalarExpr};
use crate::exec::registers::{Register, RegisterFile};
use crate::exec::relation::{Relation, RelationBody, Step};

/// What an unmatched left row produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Unmatched left rows are dropped.
    Inner,
    /// Unmatched left rows are emitted once with the right-side
    /// registers set to `NULL`.
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinState {
    BuildRight,
    NextLeft,
    Probe,
}

/// Joins two inputs by materializing the right side once and replaying
/// it for every left row.
///
/// The inputs must write disjoint register sets. `right_regs` names the
/// registers owned by the right side; they are captured per right row
/// during the build phase and restored during probing, so the condition
/// always sees the combined row. Without a condition this is a cross
/// join.
pub struct NestedLoopJoinOp {
    left: Relation,
    right: Relation,
    right_regs: Vec<usize>,
    condition: Option<ScalarExpr>,
    kind: JoinKind,
    right_rows: Vec<Vec<Register>>,
    state: JoinState,
    probe_index: usize,
    probe_matched: bool,
}

impl NestedLoopJoinOp {
    /// Creates a join over `left` and `right`.
    #[must_use]
    pub fn new(left: Relation, right: Relation, right_regs: Vec<usize>, kind: JoinKind) -> Self {
        Self {
            left,
            right,
            right_regs,
            condition: None,
            kind,
            right_rows: Vec::new(),
            state: JoinState::BuildRight,
            probe_index: 0,
            probe_matched: false,
        }
    }

    /// Sets the join condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ScalarExpr) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Wraps the operator into a [`Relation`].
    #[must_use]
    pub fn into_relation(self) -> Relation {
        Relation::new("NestedLoopJoin", self)
    }

    fn passes(&self, regs: &RegisterFile, ctx: &EvalContext) -> EvalResult<bool> {
        match &self.condition {
            Some(condition) => Ok(evaluate(condition, regs, ctx)? == Value::Bool(true)),
            None => Ok(true),
        }
    }
}

impl RelationBody for NestedLoopJoinOp {
    fn resume(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<Step> {
        loop {
            match self.state {
                JoinState::BuildRight => {
                    while self.right.next_row(regs, ctx)? {
                        self.right_rows.push(regs.capture(&self.right_regs));
                    }
                    ctx.record_rows_buffered(self.right_rows.len() as u64);
                    self.state = JoinState::NextLeft;
                }
                JoinState::NextLeft => {
                    if !self.left.next_row(regs, ctx)? {
                        return Ok(Step::Done);
                    }
                    self.probe_index = 0;
                    self.probe_matched = false;
                    self.state = JoinState::Probe;
                }
                JoinState::Probe => {
                    if self.probe_index == self.right_rows.len() {
                        self.state = JoinState::NextLeft;
                        if self.kind == JoinKind::Left && !self.probe_matched {
                            for &index in &self.right_regs {
                                regs.write(index, Value::Null, None);
                            }
                            return Ok(Step::Yield);
                        }
                        continue;
                    }
                    regs.restore(&self.right_regs, &self.right_rows[self.probe_index]);
                    self.probe_index += 1;
                    if self.passes(regs, ctx)? {
                        self.probe_matched = true;
                        return Ok(Step::Yield);
                    }
                }
            }
        }
    }
}
