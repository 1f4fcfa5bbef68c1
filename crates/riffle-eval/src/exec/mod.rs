//! The relation execution engine.
//!
//! # Architecture
//!
//! Evaluation uses a **pull-based suspendable model**: every operator is
//! a [`RelationBody`] state machine wrapped in a [`Relation`], and the
//! caller drives the pipeline by repeatedly asking the root relation for
//! its next row. Rows are not materialized tuples; they live in a shared
//! [`RegisterFile`], and yielding a row means suspending with the file
//! left in the desired state.
//!
//! # Modules
//!
//! - `context` - Evaluation context (cancellation, limits, statistics)
//! - `registers` - The shared register file rows live in
//! - `relation` - The suspendable relation protocol
//! - `binder` - Compile-time binding of local aliases to accessors
//! - `expr` - Compiled scalar expressions
//! - [`operators`] - Concrete operator implementations
//! - [`window`] - The window-function framework
//!
//! # Example
//!
//! ```
//! use riffle_core::Value;
//! use riffle_eval::exec::operators::ScanOp;
//! use riffle_eval::exec::{EvalContext, RegisterFile};
//!
//! let input = Value::List(vec![Value::Int64(1), Value::Int64(2)]);
//! let mut relation = ScanOp::new(input, 0).into_relation();
//! let mut regs = RegisterFile::new(1);
//! let ctx = EvalContext::new();
//! while relation.next_row(&mut regs, &ctx)? {
//!     println!("{:?}", regs.value(0));
//! }
//! # Ok::<(), riffle_eval::EvalError>(())
//! ```

mod binder;
mod context;
mod expr;
mod registers;
mod relation;

pub mod operators;
pub mod window;

// Re-exports
pub use binder::{bind_locals, Alias, BindingCase, BindingName, CompiledBindings};
pub use context::{
    CancellationToken, EvalConfig, EvalContext, EvalStats, TypingMode, DEFAULT_MAX_PARTITION_ROWS,
};
pub use expr::{evaluate, ScalarExpr};
pub use registers::{Register, RegisterFile};
pub use relation::{Relation, RelationBody, RelationState, Step};
