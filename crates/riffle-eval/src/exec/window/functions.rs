//! Built-in window functions.

use std::fmt;

use riffle_core::Value;

use crate::error::{EvalError, EvalResult};
use crate::exec::context::EvalContext;
use crate::exec::expr::{evaluate, ScalarExpr};
use crate::exec::registers::RegisterFile;

use super::{OrderingGroup, WindowPartition};

/// A window function evaluated once per row over a materialized
/// partition.
///
/// Instances are stateful. The framework calls [`reset`] at every
/// partition boundary and then [`eval`] exactly once per row in ordinal
/// order; `eval` receives the register file already loaded with the
/// current row, the whole partition for random access, and the current
/// row's ordering group.
///
/// [`reset`]: WindowFunction::reset
/// [`eval`]: WindowFunction::eval
pub trait WindowFunction: Send {
    /// The function's diagnostic name.
    fn name(&self) -> &'static str;

    /// Clears per-partition state before the first row is evaluated.
    fn reset(&mut self, partition: &WindowPartition);

    /// Computes the function's value for the current row.
    ///
    /// # Errors
    ///
    /// Returns an error when an argument expression fails or yields an
    /// unusable value.
    fn eval(
        &mut self,
        regs: &mut RegisterFile,
        partition: &WindowPartition,
        group: OrderingGroup,
        ctx: &EvalContext,
    ) -> EvalResult<Value>;
}

impl fmt::Debug for dyn WindowFunction + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WindowFunction").field(&self.name()).finish()
    }
}

/// `ROW_NUMBER()`: the 1-based ordinal of the row within its partition,
/// ignoring ordering groups.
#[derive(Debug, Default)]
pub struct RowNumber {
    current: i64,
}

impl RowNumber {
    /// Creates a fresh instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowFunction for RowNumber {
    fn name(&self) -> &'static str {
        "ROW_NUMBER"
    }

    fn reset(&mut self, _partition: &WindowPartition) {
        self.current = 0;
    }

    fn eval(
        &mut self,
        _regs: &mut RegisterFile,
        _partition: &WindowPartition,
        _group: OrderingGroup,
        _ctx: &EvalContext,
    ) -> EvalResult<Value> {
        self.current += 1;
        Ok(Value::Int64(self.current))
    }
}

/// `RANK()`: one plus the ordinal of the first row of the current
/// ordering group. Peers tie; the group after a tie skips the tied
/// positions.
#[derive(Debug, Default)]
pub struct Rank;

impl Rank {
    /// Creates a fresh instance.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl WindowFunction for Rank {
    fn name(&self) -> &'static str {
        "RANK"
    }

    fn reset(&mut self, _partition: &WindowPartition) {}

    fn eval(
        &mut self,
        _regs: &mut RegisterFile,
        _partition: &WindowPartition,
        group: OrderingGroup,
        _ctx: &EvalContext,
    ) -> EvalResult<Value> {
        Ok(Value::Int64(group.start as i64 + 1))
    }
}

/// `DENSE_RANK()`: like `RANK` but gapless, incrementing by one at each
/// new ordering group.
#[derive(Debug, Default)]
pub struct DenseRank {
    current: i64,
    last_group_start: Option<usize>,
}

impl DenseRank {
    /// Creates a fresh instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowFunction for DenseRank {
    fn name(&self) -> &'static str {
        "DENSE_RANK"
    }

    fn reset(&mut self, _partition: &WindowPartition) {
        self.current = 0;
        self.last_group_start = None;
    }

    fn eval(
        &mut self,
        _regs: &mut RegisterFile,
        _partition: &WindowPartition,
        group: OrderingGroup,
        _ctx: &EvalContext,
    ) -> EvalResult<Value> {
        if self.last_group_start != Some(group.start) {
            self.current += 1;
            self.last_group_start = Some(group.start);
        }
        Ok(Value::Int64(self.current))
    }
}

/// Which side of the current row a navigation function reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// `LAG` reads earlier rows.
    Behind,
    /// `LEAD` reads later rows.
    Ahead,
}

/// `LAG(expr [, offset [, default]])` and `LEAD(expr [, offset
/// [, default]])`: evaluate `expr` in the register environment of the row
/// `offset` positions behind or ahead of the current one.
///
/// The offset expression is re-evaluated at every row in the current
/// row's environment and must yield a non-negative integer; it defaults
/// to 1. When the target position falls outside the partition the
/// default expression is evaluated in the current row's environment
/// instead, or `NULL` when absent.
#[derive(Debug)]
pub struct Navigation {
    function: &'static str,
    direction: Direction,
    expr: ScalarExpr,
    offset: Option<ScalarExpr>,
    default: Option<ScalarExpr>,
    position: i64,
}

impl Navigation {
    /// Creates a `LAG` instance.
    #[must_use]
    pub fn lag(
        expr: ScalarExpr,
        offset: Option<ScalarExpr>,
        default: Option<ScalarExpr>,
    ) -> Self {
        Self {
            function: "LAG",
            direction: Direction::Behind,
            expr,
            offset,
            default,
            position: -1,
        }
    }

    /// Creates a `LEAD` instance.
    #[must_use]
    pub fn lead(
        expr: ScalarExpr,
        offset: Option<ScalarExpr>,
        default: Option<ScalarExpr>,
    ) -> Self {
        Self {
            function: "LEAD",
            direction: Direction::Ahead,
            expr,
            offset,
            default,
            position: -1,
        }
    }

    fn resolve_offset(&self, regs: &RegisterFile, ctx: &EvalContext) -> EvalResult<i64> {
        let Some(expr) = &self.offset else {
            return Ok(1);
        };
        let value = evaluate(expr, regs, ctx)?;
        match value.as_i64() {
            Some(n) if n >= 0 => Ok(n),
            Some(n) => Err(EvalError::InvalidNavigationOffset {
                function: self.function.to_owned(),
                found: n.to_string(),
            }),
            None => Err(EvalError::InvalidNavigationOffset {
                function: self.function.to_owned(),
                found: value.type_name().to_owned(),
            }),
        }
    }
}

impl WindowFunction for Navigation {
    fn name(&self) -> &'static str {
        self.function
    }

    fn reset(&mut self, _partition: &WindowPartition) {
        self.position = -1;
    }

    fn eval(
        &mut self,
        regs: &mut RegisterFile,
        partition: &WindowPartition,
        _group: OrderingGroup,
        ctx: &EvalContext,
    ) -> EvalResult<Value> {
        self.position += 1;
        let offset = self.resolve_offset(regs, ctx)?;
        let target = match self.direction {
            Direction::Behind => self.position.checked_sub(offset),
            Direction::Ahead => self.position.checked_add(offset),
        };
        match target {
            Some(target) if target >= 0 && (target as usize) < partition.len() => {
                // Evaluate the argument in the target row's environment,
                // then restore the current row.
                regs.load_from(partition.row(target as usize));
                let value = evaluate(&self.expr, regs, ctx);
                regs.load_from(partition.row(self.position as usize));
                value
            }
            _ => match &self.default {
                Some(default) => evaluate(default, regs, ctx),
                None => Ok(Value::Null),
            },
        }
    }
}
