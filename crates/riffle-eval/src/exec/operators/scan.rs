//! Scan operator unrolling a collection value into rows.

use riffle_core::Value;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::registers::RegisterFile;
use crate::exec::relation::{Relation, RelationBody, Step};

/// How the scanned value maps onto rows and register names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    /// A list yields one row per element, named by its ordinal.
    List,
    /// A bag yields one row per element with no name.
    Bag,
    /// Any other value yields a single unnamed row holding the value.
    Scalar,
}

/// Unrolls a collection value into rows written to one register.
///
/// Lists yield their elements in order, each carrying its zero-based
/// ordinal as the register name so an at-binding can observe it. Bags
/// yield elements in storage order without names. A non-collection value
/// yields exactly one row holding the value itself.
pub struct ScanOp {
    items: Vec<Value>,
    mode: ScanMode,
    dest: usize,
    pos: usize,
}

impl ScanOp {
    /// Creates a scan writing rows into register `dest`.
    #[must_use]
    pub fn new(input: Value, dest: usize) -> Self {
        let (items, mode) = match input {
            Value::List(items) => (items, ScanMode::List),
            Value::Bag(items) => (items, ScanMode::Bag),
            other => (vec![other], ScanMode::Scalar),
        };
        Self {
            items,
            mode,
            dest,
            pos: 0,
        }
    }

    /// Wraps the operator into a [`Relation`].
    #[must_use]
    pub fn into_relation(self) -> Relation {
        Relation::new("Scan", self)
    }
}

impl RelationBody for ScanOp {
    fn resume(&mut self, regs: &mut RegisterFile, _ctx: &EvalContext) -> EvalResult<Step> {
        if self.pos >= self.items.len() {
            return Ok(Step::Done);
        }
        let value = self.items[self.pos].clone();
        let name = match self.mode {
            ScanMode::List => Some(Value::Int64(self.pos as i64)),
            ScanMode::Bag | ScanMode::Scalar => None,
        };
        regs.write(self.dest, value, name);
        self.pos += 1;
        Ok(Step::Yield)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut relation: Relation, width: usize) -> Vec<(Value, Option<Value>)> {
        let mut regs = RegisterFile::new(width);
        let ctx = EvalContext::new();
        let mut rows = Vec::new();
        while relation.next_row(&mut regs, &ctx).unwrap() {
            rows.push((regs.value(0).clone(), regs.name(0).cloned()));
        }
        rows
    }

    #[test]
    fn list_scan_names_rows_by_ordinal() {
        let input = Value::List(vec![Value::Int64(10), Value::Int64(20)]);
        let rows = drain(ScanOp::new(input, 0).into_relation(), 1);
        assert_eq!(
            rows,
            vec![
                (Value::Int64(10), Some(Value::Int64(0))),
                (Value::Int64(20), Some(Value::Int64(1))),
            ]
        );
    }

    #[test]
    fn bag_scan_leaves_rows_unnamed() {
        let input = Value::Bag(vec![Value::Int64(1), Value::Int64(2)]);
        let rows = drain(ScanOp::new(input, 0).into_relation(), 1);
        assert_eq!(
            rows,
            vec![(Value::Int64(1), None), (Value::Int64(2), None)]
        );
    }

    #[test]
    fn scalar_scan_yields_a_single_row() {
        let rows = drain(ScanOp::new(Value::Int64(42), 0).into_relation(), 1);
        assert_eq!(rows, vec![(Value::Int64(42), None)]);
    }

    #[test]
    fn empty_list_yields_nothing() {
        let rows = drain(ScanOp::new(Value::List(vec![]), 0).into_relation(), 1);
        assert!(rows.is_empty());
    }

    #[test]
    fn scan_writes_only_its_destination_register() {
        let mut regs = RegisterFile::new(2);
        regs.set_value(0, Value::Str("keep".to_owned()));
        let ctx = EvalContext::new();
        let mut relation = ScanOp::new(Value::Int64(7), 1).into_relation();

        assert!(relation.next_row(&mut regs, &ctx).unwrap());
        assert_eq!(regs.value(0), &Value::Str("keep".to_owned()));
        assert_eq!(regs.value(1), &Value::Int64(7));
    }
}
