//! Riffle evaluation engine.
//!
//! This crate provides the runtime core of the Riffle query engine:
//! suspendable relations, locals binding, scalar-function dispatch, and
//! window functions.
//!
//! # Overview
//!
//! The evaluator consists of several layers:
//!
//! - **Relations**: pull-based suspendable row producers sharing one
//!   register file
//! - **Binding**: compile-time resolution of local aliases to register
//!   accessors
//! - **Dispatch**: ranked overload selection for scalar functions
//! - **Windows**: materialized per-partition evaluation of window
//!   functions
//!
//! # Modules
//!
//! - [`exec`] - The relation execution engine
//! - [`dispatch`] - Dynamic scalar-function dispatch
//! - [`error`] - Error types for evaluation
//!
//! # Quick Start
//!
//! Number the rows of a small list:
//!
//! ```
//! use riffle_core::Value;
//! use riffle_eval::exec::operators::{ScanOp, WindowSpliceOp};
//! use riffle_eval::exec::window::{WindowAssignment, WindowFunctionRegistry};
//! use riffle_eval::{EvalContext, RegisterFile};
//!
//! let registry = WindowFunctionRegistry::with_builtins();
//! let row_number = registry.resolve("row_number", vec![])?;
//!
//! let input = Value::List(vec![Value::Int64(10), Value::Int64(20)]);
//! let scan = ScanOp::new(input, 0).into_relation();
//! let splice = WindowSpliceOp::new(scan, vec![WindowAssignment::new(row_number, 1)]);
//!
//! let mut relation = splice.into_relation();
//! let mut regs = RegisterFile::new(2);
//! let ctx = EvalContext::new();
//! let mut rows = Vec::new();
//! while relation.next_row(&mut regs, &ctx)? {
//!     rows.push((regs.value(0).clone(), regs.value(1).clone()));
//! }
//! assert_eq!(rows[0], (Value::Int64(10), Value::Int64(1)));
//! assert_eq!(rows[1], (Value::Int64(20), Value::Int64(2)));
//! # Ok::<(), riffle_eval::EvalError>(())
//! ```
//!
//! Rank overloads at a scalar call site:
//!
//! ```
//! use riffle_core::{TypeTag, Value};
//! use riffle_eval::{Candidate, DispatchSite, EvalContext, ParamType};
//!
//! let site = DispatchSite::new(
//!     "abs",
//!     vec![
//!         Candidate::new(vec![ParamType::Exact(TypeTag::Int64)], |args| {
//!             Ok(Value::Int64(args[0].as_i64().unwrap_or_default().abs()))
//!         }),
//!         Candidate::new(vec![ParamType::Exact(TypeTag::Float64)], |args| {
//!             Ok(Value::Float64(args[0].as_f64().unwrap_or_default().abs()))
//!         }),
//!     ],
//! );
//!
//! let ctx = EvalContext::new();
//! assert_eq!(site.dispatch(&[Value::Int64(-3)], &ctx)?, Value::Int64(3));
//! # Ok::<(), riffle_eval::EvalError>(())
//! ```

pub mod dispatch;
pub mod error;
pub mod exec;

// Re-export commonly used items at the crate root
pub use dispatch::{Candidate, DispatchSite, MatchCost, ParamType, ScalarFn};
pub use error::{EvalError, EvalResult};
pub use exec::{
    bind_locals, evaluate, Alias, BindingName, EvalConfig, EvalContext, Register, RegisterFile,
    Relation, RelationBody, ScalarExpr, Step, TypingMode,
};
