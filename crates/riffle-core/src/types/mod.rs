//! Core data types for riffle.
//!
//! This module defines the semi-structured value model shared by every part
//! of the execution engine, together with the runtime type tags and the
//! widening rules that overload dispatch ranks coercions with.

mod coerce;
mod value;

pub use coerce::{widen, widens_to};
pub use value::{TypeTag, Value};
