//! Scalar expressions evaluated once per output row.
//!
//! Expressions never suspend: a row's scalar evaluation, including runtime
//! overload dispatch, always runs to completion between two suspension
//! points of the owning relation.

use std::sync::Arc;

use riffle_core::{CoreError, Value};

use crate::dispatch::DispatchSite;
use crate::error::{EvalError, EvalResult};
use crate::exec::binder::{BindingName, CompiledBindings};
use crate::exec::context::{EvalContext, TypingMode};
use crate::exec::registers::RegisterFile;

/// A compiled scalar expression.
#[derive(Debug, Clone)]
pub enum ScalarExpr {
    /// A constant value.
    Literal(Value),
    /// The value of a register slot.
    Register(usize),
    /// A name resolved through compiled binding tables.
    Binding {
        /// The bindings in scope at this expression.
        bindings: Arc<CompiledBindings>,
        /// The requested name and case mode.
        name: BindingName,
    },
    /// A struct field step on a base expression, matched exactly.
    Field {
        /// The expression producing the struct.
        base: Box<ScalarExpr>,
        /// The field name.
        name: String,
    },
    /// A scalar function call dispatched at runtime.
    Call {
        /// The overload table for this call site.
        site: Arc<DispatchSite>,
        /// Argument expressions, evaluated left to right.
        args: Vec<ScalarExpr>,
    },
}

impl ScalarExpr {
    /// Creates a literal expression.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Creates a register read.
    #[must_use]
    pub const fn register(index: usize) -> Self {
        Self::Register(index)
    }

    /// Creates a binding lookup.
    #[must_use]
    pub const fn binding(bindings: Arc<CompiledBindings>, name: BindingName) -> Self {
        Self::Binding { bindings, name }
    }

    /// Creates a struct field step.
    #[must_use]
    pub fn field(base: Self, name: impl Into<String>) -> Self {
        Self::Field {
            base: Box::new(base),
            name: name.into(),
        }
    }

    /// Creates a dispatched function call.
    #[must_use]
    pub const fn call(site: Arc<DispatchSite>, args: Vec<Self>) -> Self {
        Self::Call { site, args }
    }
}

/// Evaluates `expr` against the current row registers.
///
/// # Errors
///
/// Propagates binding, typing, and dispatch failures. In
/// [`TypingMode::Permissive`] unresolved names and mistyped path steps
/// produce `Missing` instead of failing.
pub fn evaluate(expr: &ScalarExpr, regs: &RegisterFile, ctx: &EvalContext) -> EvalResult<Value> {
    match expr {
        ScalarExpr::Literal(value) => Ok(value.clone()),
        ScalarExpr::Register(index) => Ok(regs.value(*index).clone()),
        ScalarExpr::Binding { bindings, name } => match bindings.get(name, regs)? {
            Some(value) => Ok(value),
            None => match ctx.typing() {
                TypingMode::Strict => Err(EvalError::UnboundVariable {
                    name: name.text().to_owned(),
                }),
                TypingMode::Permissive => Ok(Value::Missing),
            },
        },
        ScalarExpr::Field { base, name } => {
            let base = evaluate(base, regs, ctx)?;
            match base {
                Value::Null => Ok(Value::Null),
                Value::Missing => Ok(Value::Missing),
                Value::Struct(fields) => Ok(fields
                    .into_iter()
                    .find(|(field, _)| field == name)
                    .map_or(Value::Missing, |(_, value)| value)),
                other => match ctx.typing() {
                    TypingMode::Strict => Err(EvalError::Type(CoreError::type_mismatch(
                        "STRUCT",
                        other.type_name(),
                    ))),
                    TypingMode::Permissive => Ok(Value::Missing),
                },
            }
        }
        ScalarExpr::Call { site, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, regs, ctx)?);
            }
            site.dispatch(&values, ctx)
        }
    }
}
