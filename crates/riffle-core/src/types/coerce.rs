//! Ranked numeric widening between runtime types.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult};
use crate::types::{TypeTag, Value};

/// Returns `true` if a value of type `from` implicitly widens to `to`.
///
/// The lattice: each signed integer widens to every wider signed integer,
/// any integer widens to `Decimal`, and any integer or `Decimal` widens to
/// `Float64`. A type never widens to itself.
#[must_use]
pub const fn widens_to(from: TypeTag, to: TypeTag) -> bool {
    match (from, to) {
        (TypeTag::Int8, TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64)
        | (TypeTag::Int16, TypeTag::Int32 | TypeTag::Int64)
        | (TypeTag::Int32, TypeTag::Int64)
        | (
            TypeTag::Int8 | TypeTag::Int16 | TypeTag::Int32 | TypeTag::Int64,
            TypeTag::Decimal | TypeTag::Float64,
        )
        | (TypeTag::Decimal, TypeTag::Float64) => true,
        _ => false,
    }
}

/// Converts `value` to `target`, which must equal or widen its current type.
///
/// # Errors
///
/// Returns [`CoreError::TypeMismatch`] if `value` does not widen to
/// `target`.
pub fn widen(value: Value, target: TypeTag) -> CoreResult<Value> {
    if value.type_tag() == target {
        return Ok(value);
    }
    match (value, target) {
        (Value::Int8(v), TypeTag::Int16) => Ok(Value::Int16(i16::from(v))),
        (Value::Int8(v), TypeTag::Int32) => Ok(Value::Int32(i32::from(v))),
        (Value::Int16(v), TypeTag::Int32) => Ok(Value::Int32(i32::from(v))),
        (Value::Int8(v), TypeTag::Int64) => Ok(Value::Int64(i64::from(v))),
        (Value::Int16(v), TypeTag::Int64) => Ok(Value::Int64(i64::from(v))),
        (Value::Int32(v), TypeTag::Int64) => Ok(Value::Int64(i64::from(v))),
        (Value::Int8(v), TypeTag::Decimal) => Ok(Value::Decimal(Decimal::from(v))),
        (Value::Int16(v), TypeTag::Decimal) => Ok(Value::Decimal(Decimal::from(v))),
        (Value::Int32(v), TypeTag::Decimal) => Ok(Value::Decimal(Decimal::from(v))),
        (Value::Int64(v), TypeTag::Decimal) => Ok(Value::Decimal(Decimal::from(v))),
        (Value::Int8(v), TypeTag::Float64) => Ok(Value::Float64(f64::from(v))),
        (Value::Int16(v), TypeTag::Float64) => Ok(Value::Float64(f64::from(v))),
        (Value::Int32(v), TypeTag::Float64) => Ok(Value::Float64(f64::from(v))),
        #[allow(clippy::cast_precision_loss)]
        (Value::Int64(v), TypeTag::Float64) => Ok(Value::Float64(v as f64)),
        (Value::Decimal(v), TypeTag::Float64) => v
            .to_f64()
            .map(Value::Float64)
            .ok_or_else(|| CoreError::type_mismatch(target.name(), TypeTag::Decimal.name())),
        (value, _) => Err(CoreError::type_mismatch(
            target.name(),
            value.type_name(),
        )),
    }
}
