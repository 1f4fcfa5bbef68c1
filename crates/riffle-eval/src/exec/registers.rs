//! The shared row-register array mutated in place by operators.
//!
//! One pipeline execution owns one [`RegisterFile`]. Each operator writes
//! its destination slots as it produces a row; nothing escapes the iterator
//! boundary without being copied. A slot carries the produced value plus an
//! optional *name* value (the synthesized ordinal or field name from the
//! source iteration) read by at-name bindings.

use riffle_core::Value;

/// One mutable slot of a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Register {
    /// The value currently held by the slot.
    value: Value,
    /// The synthesized name of the value, if the producing source has one.
    name: Option<Value>,
}

impl Register {
    /// Creates a register holding `value` with no name.
    #[inline]
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value, name: None }
    }

    /// Creates a register holding `value` with a name.
    #[inline]
    #[must_use]
    pub const fn named(value: Value, name: Value) -> Self {
        Self {
            value,
            name: Some(name),
        }
    }

    /// Returns the slot's value.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the slot's name, if any.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> Option<&Value> {
        self.name.as_ref()
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new(Value::Missing)
    }
}

/// The fixed-size register array shared by one pipeline execution.
///
/// Slots start out holding `Missing` with no name. Register state after a
/// relation reports exhaustion is unspecified.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterFile {
    slots: Vec<Register>,
}

impl RegisterFile {
    /// Creates a register file with `len` empty slots.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![Register::default(); len],
        }
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the file has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the slot at `index`, if in bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Register> {
        self.slots.get(index)
    }

    /// Returns the value at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    #[must_use]
    pub fn value(&self, index: usize) -> &Value {
        self.slots[index].value()
    }

    /// Returns the name at `index`, if the slot has one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&Value> {
        self.slots[index].name()
    }

    /// Overwrites the value at `index`, leaving the slot's name untouched.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn set_value(&mut self, index: usize, value: Value) {
        self.slots[index].value = value;
    }

    /// Overwrites the slot at `index` with a value and an optional name.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn write(&mut self, index: usize, value: Value, name: Option<Value>) {
        self.slots[index] = Register { value, name };
    }

    /// Copies every slot of `other` into this file.
    ///
    /// Used when replaying a materialized partition row into the live
    /// pipeline.
    pub fn load_from(&mut self, other: &RegisterFile) {
        debug_assert_eq!(self.slots.len(), other.slots.len());
        self.slots.clone_from(&other.slots);
    }

    /// Snapshots the slots at `indices`, in order.
    #[must_use]
    pub fn capture(&self, indices: &[usize]) -> Vec<Register> {
        indices.iter().map(|&i| self.slots[i].clone()).collect()
    }

    /// Restores slots previously captured from `indices`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds; `saved` must have the same
    /// length as `indices`.
    pub fn restore(&mut self, indices: &[usize], saved: &[Register]) {
        debug_assert_eq!(indices.len(), saved.len());
        for (&i, register) in indices.iter().zip(saved) {
            self.slots[i] = register.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_slots_are_missing_and_unnamed() {
        let regs = RegisterFile::new(3);
        assert_eq!(regs.len(), 3);
        assert_eq!(regs.value(0), &Value::Missing);
        assert_eq!(regs.name(0), None);
    }

    #[test]
    fn write_and_read_back() {
        let mut regs = RegisterFile::new(2);
        regs.write(0, Value::Int64(7), Some(Value::Int64(0)));
        regs.set_value(1, Value::from("a"));

        assert_eq!(regs.value(0), &Value::Int64(7));
        assert_eq!(regs.name(0), Some(&Value::Int64(0)));
        assert_eq!(regs.value(1), &Value::from("a"));
        assert_eq!(regs.name(1), None);
    }

    #[test]
    fn set_value_keeps_the_name() {
        let mut regs = RegisterFile::new(1);
        regs.write(0, Value::Int64(1), Some(Value::from("x")));
        regs.set_value(0, Value::Int64(2));
        assert_eq!(regs.name(0), Some(&Value::from("x")));
    }

    #[test]
    fn capture_and_restore_subset() {
        let mut regs = RegisterFile::new(3);
        regs.write(1, Value::Int64(1), None);
        regs.write(2, Value::from("keep"), None);

        let saved = regs.capture(&[1, 2]);
        regs.set_value(1, Value::Int64(99));
        regs.set_value(2, Value::from("clobbered"));

        regs.restore(&[1, 2], &saved);
        assert_eq!(regs.value(1), &Value::Int64(1));
        assert_eq!(regs.value(2), &Value::from("keep"));
    }

    #[test]
    fn load_from_replaces_every_slot() {
        let mut a = RegisterFile::new(2);
        let mut b = RegisterFile::new(2);
        b.write(0, Value::Int64(1), Some(Value::Int64(0)));
        b.write(1, Value::Int64(2), None);

        a.load_from(&b);
        assert_eq!(a, b);
    }
}
