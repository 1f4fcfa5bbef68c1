//! Projection operator for computing output columns.

use riffle_core::Value;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::expr::{evaluate, ScalarExpr};
use crate::exec::registers::RegisterFile;
use crate::exec::relation::{Relation, RelationBody, Step};

/// One output column: an expression and its destination register.
#[derive(Debug, Clone)]
pub struct ProjectColumn {
    expr: ScalarExpr,
    dest: usize,
    name: Option<String>,
}

impl ProjectColumn {
    /// Creates an unnamed column.
    #[must_use]
    pub const fn new(expr: ScalarExpr, dest: usize) -> Self {
        Self {
            expr,
            dest,
            name: None,
        }
    }

    /// Sets the column's output name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Evaluates every column expression against the input row, then writes
/// the results to the destination registers.
///
/// All expressions see the unmodified input row: evaluation completes
/// before any destination is written, so a column may safely read a
/// register another column overwrites.
pub struct ProjectOp {
    input: Relation,
    columns: Vec<ProjectColumn>,
}

impl ProjectOp {
    /// Creates a projection over `input`.
    #[must_use]
    pub fn new(input: Relation, columns: Vec<ProjectColumn>) -> Self {
        Self { input, columns }
    }

    /// Wraps the operator into a [`Relation`].
    #[must_use]
    pub fn into_relation(self) -> Relation {
        Relation::new("Project", self)
    }
}

impl RelationBody for ProjectOp {
    fn resume(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<Step> {
        if !self.input.next_row(regs, ctx)? {
            return Ok(Step::Done);
        }
        let mut values = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            values.push(evaluate(&column.expr, regs, ctx)?);
        }
        for (column, value) in self.columns.iter().zip(values) {
            let name = column.name.clone().map(Value::Str);
            regs.write(column.dest, value, name);
        }
        Ok(Step::Yield)
    }
}
