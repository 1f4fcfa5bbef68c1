//! Riffle Core
//!
//! This crate provides the value model shared by the riffle execution
//! engine: the semi-structured [`Value`] enum, runtime [`TypeTag`]s, and the
//! ranked numeric widening that overload dispatch builds on.
//!
//! # Modules
//!
//! - [`types`] - Core data types (Value, TypeTag, widening)
//! - [`error`] - Error types

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, CoreResult};
pub use types::{widen, widens_to, TypeTag, Value};
