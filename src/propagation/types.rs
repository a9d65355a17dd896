//! Contract between propagators and the host search engine.
//!
//! The host owns the variables, their domains and the literals that describe
//! bounds. Propagators only read bounds, request lower-bound tightenings with
//! an [`Explanation`], and report conflicts through [`PropagationStatus`].

use std::fmt::Debug;

/// Returned by the host when a requested tightening would empty a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDomain;

/// Accumulates the literals that justify a tightening or a conflict.
///
/// Each literal is a fact that currently holds in the host (e.g. `[x <= 5]`).
/// The host turns the collected literals into its own reason object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation<L> {
    literals: Vec<L>,
}

impl<L> Explanation<L> {
    pub fn new() -> Self {
        Self {
            literals: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            literals: Vec::with_capacity(capacity),
        }
    }

    /// Adds a contributing fact.
    pub fn push(&mut self, literal: L) {
        self.literals.push(literal);
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, L> {
        self.literals.iter()
    }

    pub fn contains(&self, literal: &L) -> bool
    where
        L: PartialEq,
    {
        self.literals.contains(literal)
    }

    /// Consumes the builder, yielding the literals in insertion order.
    pub fn into_literals(self) -> Vec<L> {
        self.literals
    }
}

impl<L> Default for Explanation<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> Extend<L> for Explanation<L> {
    fn extend<I: IntoIterator<Item = L>>(&mut self, iter: I) {
        self.literals.extend(iter);
    }
}

impl<L> FromIterator<L> for Explanation<L> {
    fn from_iter<I: IntoIterator<Item = L>>(iter: I) -> Self {
        Self {
            literals: iter.into_iter().collect(),
        }
    }
}

impl<'a, L> IntoIterator for &'a Explanation<L> {
    type Item = &'a L;
    type IntoIter = std::slice::Iter<'a, L>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.iter()
    }
}

/// Read bounds and tighten lower bounds of host-owned integer variables.
///
/// `Var` is an opaque handle into the host's variable store.
pub trait DomainStore {
    /// Handle to a host variable.
    type Var: Copy + Debug;

    /// A fact about a variable's bound.
    type Literal: Clone + Debug;

    /// Current lower bound of `var`.
    fn lower_bound(&self, var: Self::Var) -> i64;

    /// Current upper bound of `var`.
    fn upper_bound(&self, var: Self::Var) -> i64;

    /// Literal `[var >= lower_bound(var)]`.
    fn lower_bound_literal(&self, var: Self::Var) -> Self::Literal;

    /// Literal `[var <= upper_bound(var)]`.
    fn upper_bound_literal(&self, var: Self::Var) -> Self::Literal;

    /// Literal `[var <= value]`, the negation of `[var >= value + 1]`.
    fn at_most_literal(&self, var: Self::Var, value: i64) -> Self::Literal;

    /// Raises the lower bound of `var` to `value`, recording `reason`.
    ///
    /// A value not above the current lower bound is a no-op. Fails when
    /// `value` exceeds the current upper bound.
    fn set_lower_bound(
        &mut self,
        var: Self::Var,
        value: i64,
        reason: Explanation<Self::Literal>,
    ) -> Result<(), EmptyDomain>;
}

/// Which check of a propagator detected infeasibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConflictCause {
    /// The best-case probability of a single variable is below the target.
    IndexBelowConfidence { index: usize },

    /// The product of best-case probabilities up to `index` is below the
    /// target.
    JointBelowConfidence { index: usize },

    /// The distance required at `index` exceeds its upper bound.
    RequirementExceedsDomain { index: usize, required: i64 },
}

/// A conflict stated by a propagator: the literals together describe an
/// infeasible partial assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorConflict<L> {
    pub explanation: Explanation<L>,
    pub cause: ConflictCause,
}

/// Why a propagation failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Inconsistency<L> {
    /// The host refused a tightening because it would empty a domain.
    EmptyDomain,
    /// The propagator detected a conflict and explained it.
    Conflict(PropagatorConflict<L>),
}

impl<L> From<EmptyDomain> for Inconsistency<L> {
    fn from(_: EmptyDomain) -> Self {
        Inconsistency::EmptyDomain
    }
}

impl<L> From<PropagatorConflict<L>> for Inconsistency<L> {
    fn from(conflict: PropagatorConflict<L>) -> Self {
        Inconsistency::Conflict(conflict)
    }
}

/// Outcome of one propagator invocation.
pub type PropagationStatus<L> = Result<(), Inconsistency<L>>;

/// Domain changes a propagator can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainEvent {
    LowerBound,
    UpperBound,
}

/// A constraint propagator driven by a host's fixpoint loop.
pub trait Propagator<S: DomainStore> {
    /// Short identifier, used in logs.
    fn name(&self) -> &str;

    /// Variables and events that should trigger [`propagate`](Self::propagate).
    fn watched(&self) -> Vec<(S::Var, DomainEvent)>;

    /// Tightens domains in `store` or reports a conflict.
    ///
    /// Must run to completion and be idempotent for unchanged domains.
    fn propagate(&self, store: &mut S) -> PropagationStatus<S::Literal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explanation_builder() {
        let mut e: Explanation<i32> = Explanation::new();
        assert!(e.is_empty());
        e.push(3);
        e.extend([1, 2]);
        assert_eq!(e.len(), 3);
        assert!(e.contains(&1));
        assert_eq!(e.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(e.into_literals(), vec![3, 1, 2]);
    }

    #[test]
    fn test_inconsistency_from() {
        let i: Inconsistency<i32> = EmptyDomain.into();
        assert_eq!(i, Inconsistency::EmptyDomain);

        let conflict = PropagatorConflict {
            explanation: [7].into_iter().collect(),
            cause: ConflictCause::IndexBelowConfidence { index: 0 },
        };
        let i: Inconsistency<i32> = conflict.clone().into();
        assert_eq!(i, Inconsistency::Conflict(conflict));
    }
}
