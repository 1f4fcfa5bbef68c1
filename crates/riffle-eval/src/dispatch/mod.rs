//! Runtime overload dispatch for scalar function calls.
//!
//! A call site's overloads are fixed at plan time as an ordered
//! [`Candidate`] list; at evaluation time [`DispatchSite::dispatch`] ranks
//! every candidate against the runtime argument types and invokes exactly
//! one, or fails. Ranking is per parameter position, cheapest first
//! (exact < widen < any), compared lexicographically across positions;
//! candidates are re-ranked on every call rather than trusting the planner
//! to have sorted them, so list order only breaks exact cost ties.
//!
//! Sites are immutable after construction and shareable across concurrent
//! evaluations behind an [`Arc`].

use std::fmt;
use std::sync::Arc;

use riffle_core::{widen, widens_to, TypeTag, Value};
use tracing::{debug, trace};

use crate::error::{EvalError, EvalResult};
use crate::exec::EvalContext;


/// The body of one overload, invoked with already-coerced arguments.
pub type ScalarFn = Arc<dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync>;

/// The declared type of one candidate parameter, with its coercion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Accepts exactly this runtime type.
    Exact(TypeTag),
    /// Accepts this type, or any type that widens to it.
    Widening(TypeTag),
    /// Accepts any runtime type.
    Any,
}

impl ParamType {
    /// Scores one argument against this parameter, `None` if inapplicable.
    fn cost(self, arg: TypeTag) -> Option<MatchCost> {
        match self {
            Self::Exact(tag) | Self::Widening(tag) if arg == tag => Some(MatchCost::Exact),
            Self::Exact(_) => None,
            Self::Widening(tag) if widens_to(arg, tag) => Some(MatchCost::Widen),
            Self::Widening(_) => None,
            Self::Any => Some(MatchCost::Any),
        }
    }

    /// Returns the type arguments are coerced to, `None` for [`Any`].
    ///
    /// [`Any`]: Self::Any
    const fn target(self) -> Option<TypeTag> {
        match self {
            Self::Exact(tag) | Self::Widening(tag) => Some(tag),
            Self::Any => None,
        }
    }
}

/// The cost of binding one argument to one parameter, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchCost {
    /// The runtime type equals the declared type.
    Exact,
    /// The runtime type widens to the declared type.
    Widen,
    /// The parameter accepts anything.
    Any,
}

/// One overload of a dispatch site.
#[derive(Clone)]
pub struct Candidate {
    params: Vec<ParamType>,
    body: ScalarFn,
}

impl Candidate {
    /// Creates a candidate from a parameter signature and a body.
    pub fn new<F>(params: Vec<ParamType>, body: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            params,
            body: Arc::new(body),
        }
    }

    /// Returns the declared parameter types.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Returns the number of parameters.
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Scores the candidate against runtime argument types.
    ///
    /// Returns `None` if the arity differs or any position is inapplicable.
    fn score(&self, tags: &[TypeTag]) -> Option<Vec<MatchCost>> {
        if self.params.len() != tags.len() {
            return None;
        }
        self.params
            .iter()
            .zip(tags)
            .map(|(param, &tag)| param.cost(tag))
            .collect()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A runtime dispatch site: a function name plus its ordered overloads.
pub struct DispatchSite {
    name: String,
    candidates: Vec<Candidate>,
}

impl DispatchSite {
    /// Creates a dispatch site.
    #[must_use]
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Returns the function name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the overload candidates in declaration order.
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Selects the cheapest viable candidate for the given argument types.
    ///
    /// Costs compare lexicographically position by position; an exact tie
    /// keeps the earliest candidate in declaration order.
    #[must_use]
    pub fn select(&self, tags: &[TypeTag]) -> Option<(usize, &Candidate)> {
        let mut best: Option<(usize, Vec<MatchCost>)> = None;
        for (index, candidate) in self.candidates.iter().enumerate() {
            let Some(cost) = candidate.score(tags) else {
                continue;
            };
            let cheaper = match &best {
                Some((_, best_cost)) => cost < *best_cost,
                None => true,
            };
            if cheaper {
                best = Some((index, cost));
            }
        }
        best.map(|(index, _)| (index, &self.candidates[index]))
    }

    /// Dispatches a call: selects a candidate, coerces the arguments to its
    /// declared parameter types, and invokes its body.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::NoMatchingOverload`] when no candidate accepts
    /// the runtime argument types, and propagates body failures.
    pub fn dispatch(&self, args: &[Value], ctx: &EvalContext) -> EvalResult<Value> {
        ctx.record_dispatch();
        let tags: Vec<TypeTag> = args.iter().map(Value::type_tag).collect();

        let Some((index, candidate)) = self.select(&tags) else {
            debug!(function = %self.name, arguments = %render_types(&tags), "no matching overload");
            return Err(EvalError::NoMatchingOverload {
                name: self.name.clone(),
                arguments: render_types(&tags),
            });
        };
        trace!(function = %self.name, candidate = index, "dispatch selected overload");

        let mut coerced = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(candidate.params()) {
            match param.target() {
                Some(tag) => coerced.push(widen(arg.clone(), tag)?),
                None => coerced.push(arg.clone()),
            }
        }
        (candidate.body)(&coerced)
    }
}

impl fmt::Debug for DispatchSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchSite")
            .field("name", &self.name)
            .field("candidates", &self.candidates)
            .finish()
    }
}

/// Renders argument types as `(A, B, ...)` for diagnostics.
fn render_types(tags: &[TypeTag]) -> String {
    let names: Vec<&str> = tags.iter().map(|tag| tag.name()).collect();
    format!("({})", names.join(", "))
}
