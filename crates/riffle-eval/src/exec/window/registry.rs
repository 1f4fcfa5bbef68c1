//! Name resolution for window functions.
//!
//! SQL window syntax admits more function names than the evaluator
//! implements, and the two failure modes must stay distinguishable. The
//! registry resolves a name into one of three tiers: built-ins that
//! produce an instance, recognized names without an implementation
//! ([`EvalError::UnimplementedWindowFunction`]), and everything else
//! ([`EvalError::UnknownWindowFunction`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{EvalError, EvalResult};
use crate::exec::expr::ScalarExpr;

use super::functions::{DenseRank, Navigation, Rank, RowNumber, WindowFunction};

/// Builds a window-function instance from its argument expressions.
pub type WindowFunctionBuilder =
    Arc<dyn Fn(Vec<ScalarExpr>) -> EvalResult<Box<dyn WindowFunction>> + Send + Sync>;

/// Names recognized as window functions but not implemented here.
const UNIMPLEMENTED: &[&str] = &[
    "percent_rank",
    "cume_dist",
    "ntile",
    "first_value",
    "last_value",
    "nth_value",
];

/// Maps function names to builders. Lookup is case-insensitive.
#[derive(Clone, Default)]
pub struct WindowFunctionRegistry {
    builders: HashMap<String, WindowFunctionBuilder>,
}

impl WindowFunctionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in functions plus stubs for
    /// the recognized-but-unimplemented names.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("row_number", |args| {
            ensure_no_args("ROW_NUMBER", &args)?;
            Ok(Box::new(RowNumber::new()))
        });
        registry.register("rank", |args| {
            ensure_no_args("RANK", &args)?;
            Ok(Box::new(Rank::new()))
        });
        registry.register("dense_rank", |args| {
            ensure_no_args("DENSE_RANK", &args)?;
            Ok(Box::new(DenseRank::new()))
        });
        registry.register("lag", |args| {
            let (expr, offset, default) = navigation_args("LAG", &args)?;
            Ok(Box::new(Navigation::lag(expr, offset, default)))
        });
        registry.register("lead", |args| {
            let (expr, offset, default) = navigation_args("LEAD", &args)?;
            Ok(Box::new(Navigation::lead(expr, offset, default)))
        });
        for &name in UNIMPLEMENTED {
            registry.register(name, move |_args| {
                Err(EvalError::UnimplementedWindowFunction {
                    name: name.to_owned(),
                })
            });
        }
        registry
    }

    /// Registers `builder` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, builder: F)
    where
        F: Fn(Vec<ScalarExpr>) -> EvalResult<Box<dyn WindowFunction>> + Send + Sync + 'static,
    {
        self.builders.insert(name.to_lowercase(), Arc::new(builder));
    }

    /// Resolves `name` and builds an instance over `args`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownWindowFunction`] for unrecognized
    /// names, [`EvalError::UnimplementedWindowFunction`] for recognized
    /// names without an implementation, or the builder's own argument
    /// errors.
    pub fn resolve(
        &self,
        name: &str,
        args: Vec<ScalarExpr>,
    ) -> EvalResult<Box<dyn WindowFunction>> {
        let Some(builder) = self.builders.get(&name.to_lowercase()) else {
            debug!(function = name, "unknown window function");
            return Err(EvalError::UnknownWindowFunction {
                name: name.to_owned(),
            });
        };
        builder(args)
    }

    /// Returns `true` if `name` has a registered builder.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(&name.to_lowercase())
    }

    /// Returns the registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len()
    }

    /// Returns `true` if no names are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl fmt::Debug for WindowFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowFunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

fn ensure_no_args(function: &str, args: &[ScalarExpr]) -> EvalResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(EvalError::InvalidArgCount {
            function: function.to_owned(),
            expected: "0".to_owned(),
            actual: args.len(),
        })
    }
}

fn navigation_args(
    function: &str,
    args: &[ScalarExpr],
) -> EvalResult<(ScalarExpr, Option<ScalarExpr>, Option<ScalarExpr>)> {
    if args.is_empty() || args.len() > 3 {
        return Err(EvalError::InvalidArgCount {
            function: function.to_owned(),
            expected: "1 to 3".to_owned(),
            actual: args.len(),
        });
    }
    Ok((args[0].clone(), args.get(1).cloned(), args.get(2).cloned()))
}
