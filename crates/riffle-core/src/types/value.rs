//! Runtime values of the semi-structured data model.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A runtime value flowing through the execution pipeline.
///
/// `Missing` is distinct from `Null`: `Null` is known-absent data, while
/// `Missing` marks the absence of a binding or struct field. `List` is
/// ordered, `Bag` is an unordered multiset, and `Struct` preserves field
/// order and permits duplicate field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Known-absent data (SQL NULL).
    Null,
    /// Absent binding or struct field.
    Missing,
    /// Boolean value.
    Bool(bool),
    /// 8-bit signed integer.
    Int8(i8),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point number.
    Float64(f64),
    /// Fixed-point decimal.
    Decimal(Decimal),
    /// UTF-8 string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// Ordered collection of values.
    List(Vec<Value>),
    /// Unordered multiset of values.
    Bag(Vec<Value>),
    /// Ordered field/value pairs.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Returns the runtime type tag of this value.
    #[inline]
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        match self {
            Self::Null => TypeTag::Null,
            Self::Missing => TypeTag::Missing,
            Self::Bool(_) => TypeTag::Bool,
            Self::Int8(_) => TypeTag::Int8,
            Self::Int16(_) => TypeTag::Int16,
            Self::Int32(_) => TypeTag::Int32,
            Self::Int64(_) => TypeTag::Int64,
            Self::Float64(_) => TypeTag::Float64,
            Self::Decimal(_) => TypeTag::Decimal,
            Self::Str(_) => TypeTag::Str,
            Self::Bytes(_) => TypeTag::Bytes,
            Self::Timestamp(_) => TypeTag::Timestamp,
            Self::List(_) => TypeTag::List,
            Self::Bag(_) => TypeTag::Bag,
            Self::Struct(_) => TypeTag::Struct,
        }
    }

    /// Returns the SQL-facing name of this value's type.
    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the value is missing.
    #[inline]
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Returns `true` if the value is null or missing.
    #[inline]
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Null | Self::Missing)
    }

    /// Returns `true` if the value is a signed integer of any width.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Int8(_) | Self::Int16(_) | Self::Int32(_) | Self::Int64(_)
        )
    }

    /// Returns `true` if the value is numeric (integer, float, or decimal).
    #[inline]
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Self::Float64(_) | Self::Decimal(_))
    }

    /// Returns the value as a boolean if it is one.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is an integer of any width.
    #[inline]
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(i) => Some(*i as i64),
            Self::Int16(i) => Some(*i as i64),
            Self::Int32(i) => Some(*i as i64),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one.
    #[inline]
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value's struct fields if it is a struct.
    #[inline]
    #[must_use]
    pub fn as_struct(&self) -> Option<&[(String, Value)]> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Self::Int32(i)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<Decimal> for Value {
    #[inline]
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    #[inline]
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// The runtime type of a [`Value`], used by overload dispatch and
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    /// SQL NULL.
    Null,
    /// Absent binding or field.
    Missing,
    /// Boolean.
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit float.
    Float64,
    /// Fixed-point decimal.
    Decimal,
    /// UTF-8 string.
    Str,
    /// Raw bytes.
    Bytes,
    /// UTC timestamp.
    Timestamp,
    /// Ordered collection.
    List,
    /// Unordered multiset.
    Bag,
    /// Ordered field/value pairs.
    Struct,
}

impl TypeTag {
    /// Returns the SQL-facing name of this type.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Missing => "MISSING",
            Self::Bool => "BOOL",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float64 => "FLOAT64",
            Self::Decimal => "DECIMAL",
            Self::Str => "STRING",
            Self::Bytes => "BYTES",
            Self::Timestamp => "TIMESTAMP",
            Self::List => "LIST",
            Self::Bag => "BAG",
            Self::Struct => "STRUCT",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
