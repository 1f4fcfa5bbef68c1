//! Concrete relation operators.
//!
//! Each operator is a [`RelationBody`](crate::exec::RelationBody) state
//! machine wrapping zero or more input [`Relation`](crate::exec::Relation)s
//! and yielding rows into the shared register file.
//!
//! # Operator Categories
//!
//! - **Scan operators**: [`scan`] - Collection values unrolled into rows
//! - **Filter operators**: [`filter`] - Predicate evaluation
//! - **Project operators**: [`project`] - Column projection
//! - **Join operators**: [`join`] - Nested-loop joins
//! - **Set operators**: [`concat`] - Input concatenation
//! - **Window operators**: [`window`] - Window-function splicing

pub mod concat;
pub mod filter;
pub mod join;
pub mod project;
pub mod scan;
pub mod window;

// Re-exports for convenience
pub use concat::ConcatOp;
pub use filter::FilterOp;
pub use join::{JoinKind, NestedLoopJoinOp};
pub use project::{ProjectColumn, ProjectOp};
pub use scan::ScanOp;
pub use window::WindowSpliceOp;
