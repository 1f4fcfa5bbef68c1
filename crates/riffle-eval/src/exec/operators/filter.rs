//! Filter operator for predicate evaluation.

use riffle_core::Value;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::expr::{evaluate, ScalarExpr};
use crate::exec::registers::RegisterFile;
use crate::exec::relation::{Relation, RelationBody, Step};

/// Yields only input rows whose predicate evaluates to `TRUE`.
///
/// `NULL`, `MISSING`, and non-boolean predicate results all reject the
/// row, matching SQL WHERE semantics.
pub struct FilterOp {
    input: Relation,
    predicate: ScalarExpr,
}

impl FilterOp {
    /// Creates a filter over `input`.
    #[must_use]
    pub fn new(input: Relation, predicate: ScalarExpr) -> Self {
        Self { input, predicate }
    }

    /// Wraps the operator into a [`Relation`].
    #[must_use]
    pub fn into_relation(self) -> Relation {
        Relation::new("Filter", self)
    }
}

impl RelationBody for FilterOp {
    fn resume(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<Step> {
        loop {
            if !self.input.next_row(regs, ctx)? {
                return Ok(Step::Done);
            }
            if evaluate(&self.predicate, regs, ctx)? == Value::Bool(true) {
                return Ok(Step::Yield);
            }
        }
    }
}
