//! Member filters
//!
//! A filter is a pure predicate over one member kind with a human readable
//! description. Filters hold no mutable state, so one value can be shared
//! across threads and reused for any number of lookups.
//!
//! Filters compose with [`FilterExt::and`] or `+`:
//!
//! ```ignore
//! let filter = FieldFilter::new().named("count") + FieldFilter::new().with_static(true);
//! ```

mod common;
mod constructor;
mod field;
mod method;

use std::fmt;
use std::ops::Add;
use std::sync::Arc;

pub use common::NamePattern;
pub use constructor::ConstructorFilter;
pub use field::FieldFilter;
pub use method::MethodFilter;

/// Predicate over members of kind `M`
pub trait Filter<M>: fmt::Display + Send + Sync {
    /// Whether `candidate` passes; a missing candidate never passes
    fn pass(&self, candidate: Option<&M>) -> bool;
}

impl<M, F: Filter<M> + ?Sized> Filter<M> for &F {
    fn pass(&self, candidate: Option<&M>) -> bool {
        (**self).pass(candidate)
    }
}

impl<M, F: Filter<M> + ?Sized> Filter<M> for Box<F> {
    fn pass(&self, candidate: Option<&M>) -> bool {
        (**self).pass(candidate)
    }
}

impl<M, F: Filter<M> + ?Sized> Filter<M> for Arc<F> {
    fn pass(&self, candidate: Option<&M>) -> bool {
        (**self).pass(candidate)
    }
}

/// Conjunction of two filters, evaluated left to right
#[derive(Debug, Clone)]
pub struct And<A, B> {
    left: A,
    right: B,
}

impl<A, B> And<A, B> {
    /// Combine two filters
    pub fn new(left: A, right: B) -> Self {
        Self { left, right }
    }
}

impl<M, A: Filter<M>, B: Filter<M>> Filter<M> for And<A, B> {
    fn pass(&self, candidate: Option<&M>) -> bool {
        self.left.pass(candidate) && self.right.pass(candidate)
    }
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for And<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} && {}", self.left, self.right)
    }
}

impl<A, B, R> Add<R> for And<A, B> {
    type Output = And<Self, R>;

    fn add(self, rhs: R) -> Self::Output {
        And::new(self, rhs)
    }
}

/// Combinators available on every filter
pub trait FilterExt<M>: Filter<M> + Sized {
    /// Filter passing only when both `self` and `other` pass
    fn and<B: Filter<M>>(self, other: B) -> And<Self, B> {
        And::new(self, other)
    }
}

impl<M, F: Filter<M>> FilterExt<M> for F {}
