//! Concatenation operator for appending inputs.

use std::collections::VecDeque;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::registers::RegisterFile;
use crate::exec::relation::{Relation, RelationBody, Step};

/// Yields every row of each input in turn, like SQL `UNION ALL`.
///
/// Each input is handed to the driver whole via [`Step::YieldAll`], so
/// the operator itself resumes only at input boundaries.
pub struct ConcatOp {
    remaining: VecDeque<Relation>,
}

impl ConcatOp {
    /// Creates a concatenation of `inputs`, in order.
    #[must_use]
    pub fn new(inputs: Vec<Relation>) -> Self {
        Self {
            remaining: inputs.into(),
        }
    }

    /// Wraps the operator into a [`Relation`].
    #[must_use]
    pub fn into_relation(self) -> Relation {
        Relation::new("Concat", self)
    }
}

impl RelationBody for ConcatOp {
    fn resume(&mut self, _regs: &mut RegisterFile, _ctx: &EvalContext) -> EvalResult<Step> {
        match self.remaining.pop_front() {
            Some(next) => Ok(Step::YieldAll(next)),
            None => Ok(Step::Done),
        }
    }
}
