//! The pull-based, suspendable relation iterator protocol.
//!
//! A relational operator is written as a [`RelationBody`]: a resumable
//! procedure that populates the shared register file and suspends once per
//! output row. Rust has no native resumable functions, so a body is an
//! explicit state machine whose struct fields are the preserved locals and
//! whose returned [`Step`] is the resume point:
//!
//! - [`Step::Yield`] suspends with the current registers as the output row;
//! - [`Step::YieldAll`] delegates to an inner relation until it is
//!   exhausted, surfacing each inner row as this relation's row;
//! - [`Step::Done`] signals exhaustion.
//!
//! [`Relation`] drives a body through `next_row()`. Pulling a relation
//! again after it reported exhaustion or failed is a caller bug and
//! panics; it never silently replays stale rows.

use std::fmt;

use crate::error::EvalResult;
use crate::exec::context::EvalContext;
use crate::exec::registers::RegisterFile;

/// The outcome of resuming a relation body.
pub enum Step {
    /// Suspend; the register file holds the next output row.
    Yield,
    /// Delegate to an inner relation until it is exhausted, then resume
    /// this body.
    YieldAll(Relation),
    /// The body has run to completion.
    Done,
}

/// A resumable relational-operator body.
///
/// `resume` is called once per pull. The body must fully populate its
/// destination registers before returning [`Step::Yield`]; all of its state
/// lives in `self` and survives across suspensions.
pub trait RelationBody: Send {
    /// Runs the body until it yields, delegates, or completes.
    ///
    /// # Errors
    ///
    /// Any evaluation failure propagates to the caller of
    /// [`Relation::next_row`]; the relation is unusable afterwards.
    fn resume(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<Step>;
}

struct FnBody<F>(F);

impl<F> RelationBody for FnBody<F>
where
    F: FnMut(&mut RegisterFile, &EvalContext) -> EvalResult<Step> + Send,
{
    fn resume(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<Step> {
        (self.0)(regs, ctx)
    }
}

/// The lifecycle state of a [`Relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationState {
    /// `next_row` has not been called yet.
    NotStarted,
    /// Positioned at a valid row; the body is suspended.
    Suspended,
    /// The body ran to completion; no further rows exist.
    Exhausted,
    /// The body or the cancellation check failed.
    Failed,
}

impl RelationState {
    /// Returns `true` if the relation may still produce rows.
    #[inline]
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::NotStarted | Self::Suspended)
    }

    /// Returns `true` if the relation is exhausted.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Returns `true` if the relation failed.
    #[inline]
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// A pull iterator over the rows of a relational operator.
///
/// # Example
///
/// ```
/// use riffle_core::Value;
/// use riffle_eval::{EvalContext, RegisterFile, Relation, Step};
///
/// let mut n = 0i64;
/// let mut rel = Relation::from_fn("numbers", move |regs, _ctx| {
///     if n == 3 {
///         return Ok(Step::Done);
///     }
///     n += 1;
///     regs.set_value(0, Value::Int64(n));
///     Ok(Step::Yield)
/// });
///
/// let ctx = EvalContext::new();
/// let mut regs = RegisterFile::new(1);
/// let mut seen = Vec::new();
/// while rel.next_row(&mut regs, &ctx).unwrap() {
///     seen.push(regs.value(0).clone());
/// }
/// assert_eq!(seen, vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
/// ```
pub struct Relation {
    body: Box<dyn RelationBody>,
    delegate: Option<Box<Relation>>,
    state: RelationState,
    rows_yielded: u64,
    name: &'static str,
}

impl Relation {
    /// Creates a relation from an operator body.
    pub fn new(name: &'static str, body: impl RelationBody + 'static) -> Self {
        Self {
            body: Box::new(body),
            delegate: None,
            state: RelationState::NotStarted,
            rows_yielded: 0,
            name,
        }
    }

    /// Creates a relation from a closure body.
    ///
    /// The closure's captures are the body's preserved locals.
    pub fn from_fn<F>(name: &'static str, f: F) -> Self
    where
        F: FnMut(&mut RegisterFile, &EvalContext) -> EvalResult<Step> + Send + 'static,
    {
        Self::new(name, FnBody(f))
    }

    /// Returns the operator name, for diagnostics.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> RelationState {
        self.state
    }

    /// Returns how many rows this relation has yielded.
    #[inline]
    #[must_use]
    pub const fn rows_yielded(&self) -> u64 {
        self.rows_yielded
    }

    /// Advances to the next row.
    ///
    /// Returns `true` with the register file populated, or `false` when the
    /// relation is exhausted, leaving register state unspecified. The
    /// cancellation flag is checked once per call, before the body resumes.
    ///
    /// # Errors
    ///
    /// Propagates body failures and [`EvalError::Interrupted`]; the
    /// relation must not be pulled again after an error.
    ///
    /// # Panics
    ///
    /// Panics if called again after returning `false` or after an error.
    ///
    /// [`EvalError::Interrupted`]: crate::error::EvalError::Interrupted
    pub fn next_row(&mut self, regs: &mut RegisterFile, ctx: &EvalContext) -> EvalResult<bool> {
        match self.state {
            RelationState::Exhausted => {
                panic!("next_row on previously exhausted relation `{}`", self.name)
            }
            RelationState::Failed => {
                panic!("next_row on failed relation `{}`", self.name)
            }
            RelationState::NotStarted | RelationState::Suspended => {}
        }

        if let Err(err) = ctx.check_interrupted() {
            self.state = RelationState::Failed;
            return Err(err);
        }

        loop {
            // Drain a pending delegation before resuming the body.
            if let Some(inner) = self.delegate.as_mut() {
                match inner.next_row(regs, ctx) {
                    Ok(true) => {
                        self.state = RelationState::Suspended;
                        self.rows_yielded += 1;
                        return Ok(true);
                    }
                    Ok(false) => {
                        self.delegate = None;
                    }
                    Err(err) => {
                        self.state = RelationState::Failed;
                        return Err(err);
                    }
                }
            }

            match self.body.resume(regs, ctx) {
                Ok(Step::Yield) => {
                    self.state = RelationState::Suspended;
                    self.rows_yielded += 1;
                    return Ok(true);
                }
                Ok(Step::YieldAll(inner)) => {
                    self.delegate = Some(Box::new(inner));
                }
                Ok(Step::Done) => {
                    self.state = RelationState::Exhausted;
                    return Ok(false);
                }
                Err(err) => {
                    self.state = RelationState::Failed;
                    return Err(err);
                }
            }
        }
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("rows_yielded", &self.rows_yielded)
            .field("delegating", &self.delegate.is_some())
            .finish_non_exhaustive()
    }
}
