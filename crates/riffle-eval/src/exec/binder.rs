//! Alias binding: compiling name → register accessors.
//!
//! A row exposed under SQL aliases gets a [`CompiledBindings`] table built
//! once per pipeline by [`bind_locals`]. Lookups after compilation are O(1)
//! table hits; a name owned by two or more accessors errors only when that
//! name is actually looked up. A direct miss falls back to dynamic scoping:
//! the aliased registers are scanned in row order and the first matching
//! struct field wins.

use std::collections::HashMap;

use riffle_core::Value;

use crate::error::{EvalError, EvalResult};
use crate::exec::registers::RegisterFile;

/// The case mode of one binding lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingCase {
    /// Match names exactly.
    Sensitive,
    /// Match names after Unicode case folding.
    Insensitive,
}

/// A name to look up, together with its case mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingName {
    text: String,
    case: BindingCase,
}

impl BindingName {
    /// Creates a case-sensitive binding name.
    #[must_use]
    pub fn sensitive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case: BindingCase::Sensitive,
        }
    }

    /// Creates a case-insensitive binding name.
    #[must_use]
    pub fn insensitive(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case: BindingCase::Insensitive,
        }
    }

    /// Returns the name text as written.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the case mode.
    #[inline]
    #[must_use]
    pub const fn case(&self) -> BindingCase {
        self.case
    }
}

/// One alias definition: an `AS` name plus an optional `AT` name, associated
/// by ordinal position with a register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    as_name: String,
    at_name: Option<String>,
}

impl Alias {
    /// Creates an alias with only an `AS` name.
    #[must_use]
    pub fn new(as_name: impl Into<String>) -> Self {
        Self {
            as_name: as_name.into(),
            at_name: None,
        }
    }

    /// Creates an alias with both an `AS` name and an `AT` name.
    #[must_use]
    pub fn with_at(as_name: impl Into<String>, at_name: impl Into<String>) -> Self {
        Self {
            as_name: as_name.into(),
            at_name: Some(at_name.into()),
        }
    }

    /// Returns the `AS` name.
    #[inline]
    #[must_use]
    pub fn as_name(&self) -> &str {
        &self.as_name
    }

    /// Returns the `AT` name, if any.
    #[inline]
    #[must_use]
    pub fn at_name(&self) -> Option<&str> {
        self.at_name.as_deref()
    }
}

/// A compiled accessor for one bound name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accessor {
    /// The value of the register at this ordinal.
    Value(usize),
    /// The name of the register at this ordinal, `Missing` when unnamed.
    Name(usize),
    /// Two or more accessors claim this key; error on lookup.
    Ambiguous,
}

/// Compiled name → accessor tables for one alias list.
///
/// Both case tables are built up front; each lookup routes to the table
/// matching the requested [`BindingCase`].
#[derive(Debug, Clone)]
pub struct CompiledBindings {
    sensitive: HashMap<String, Accessor>,
    insensitive: HashMap<String, Accessor>,
    local_count: usize,
}

/// Compiles an ordered alias list into binding tables.
#[must_use]
pub fn bind_locals(aliases: &[Alias]) -> CompiledBindings {
    let mut sensitive = HashMap::new();
    let mut insensitive = HashMap::new();

    let mut insert = |sensitive: &mut HashMap<String, Accessor>,
                      insensitive: &mut HashMap<String, Accessor>,
                      key: &str,
                      accessor: Accessor| {
        sensitive
            .entry(key.to_owned())
            .and_modify(|existing| *existing = Accessor::Ambiguous)
            .or_insert(accessor);
        insensitive
            .entry(key.to_lowercase())
            .and_modify(|existing| *existing = Accessor::Ambiguous)
            .or_insert(accessor);
    };

    for (ordinal, alias) in aliases.iter().enumerate() {
        insert(
            &mut sensitive,
            &mut insensitive,
            alias.as_name(),
            Accessor::Value(ordinal),
        );
        if let Some(at_name) = alias.at_name() {
            insert(
                &mut sensitive,
                &mut insensitive,
                at_name,
                Accessor::Name(ordinal),
            );
        }
    }

    CompiledBindings {
        sensitive,
        insensitive,
        local_count: aliases.len(),
    }
}

impl CompiledBindings {
    /// Looks `name` up against the current row registers.
    ///
    /// Returns `Ok(None)` when the name resolves to nothing; the caller
    /// decides whether that is `Missing` or an unbound-variable error.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::AmbiguousBinding`] if `name` is claimed by two
    /// or more accessors under its case mode.
    pub fn get(&self, name: &BindingName, regs: &RegisterFile) -> EvalResult<Option<Value>> {
        let hit = match name.case() {
            BindingCase::Sensitive => self.sensitive.get(name.text()),
            BindingCase::Insensitive => self.insensitive.get(&name.text().to_lowercase()),
        };

        match hit {
            Some(Accessor::Value(ordinal)) => Ok(Some(regs.value(*ordinal).clone())),
            Some(Accessor::Name(ordinal)) => Ok(Some(
                regs.name(*ordinal).cloned().unwrap_or(Value::Missing),
            )),
            Some(Accessor::Ambiguous) => Err(EvalError::AmbiguousBinding {
                name: name.text().to_owned(),
            }),
            None => Ok(self.search_local_fields(name, regs)),
        }
    }

    /// Dynamic-scope fallback: first struct field of any local matching
    /// `name`, in row order.
    fn search_local_fields(&self, name: &BindingName, regs: &RegisterFile) -> Option<Value> {
        let folded;
        let wanted = match name.case() {
            BindingCase::Sensitive => name.text(),
            BindingCase::Insensitive => {
                folded = name.text().to_lowercase();
                &folded
            }
        };

        for ordinal in 0..self.local_count {
            let Some(fields) = regs.value(ordinal).as_struct() else {
                continue;
            };
            for (field, value) in fields {
                let matches = match name.case() {
                    BindingCase::Sensitive => field == wanted,
                    BindingCase::Insensitive => field.to_lowercase() == *wanted,
                };
                if matches {
                    return Some(value.clone());
                }
            }
        }
        None
    }

    /// Returns the number of aliased locals.
    #[inline]
    #[must_use]
    pub const fn local_count(&self) -> usize {
        self.local_count
    }
}
