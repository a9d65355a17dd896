//! Fixpoint propagation loop for the reference host.

use super::arena::DomainArena;
use super::variables::{BoundLiteral, VarId};
use crate::propagation::{DomainEvent, Inconsistency, Propagator};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Status of the engine after a fixpoint run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixpointStatus {
    /// No propagator can tighten any domain further.
    Fixpoint,
    /// A propagator reported a conflict.
    Conflict,
    /// The invocation budget ran out before a fixpoint was reached.
    InvocationLimit,
}

/// Outcome of [`FixpointEngine::run`].
#[derive(Debug, Clone)]
pub struct FixpointReport {
    /// Final status.
    pub status: FixpointStatus,
    /// Number of propagator invocations.
    pub invocations: usize,
    /// Number of bound changes observed.
    pub domain_events: usize,
    /// The conflict, when `status` is [`FixpointStatus::Conflict`].
    pub conflict: Option<Inconsistency<BoundLiteral>>,
    /// Name of the propagator that failed.
    pub failed_propagator: Option<String>,
}

impl FixpointReport {
    fn new(status: FixpointStatus, invocations: usize, domain_events: usize) -> Self {
        Self {
            status,
            invocations,
            domain_events,
            conflict: None,
            failed_propagator: None,
        }
    }

    /// Whether the run ended without conflict.
    pub fn is_consistent(&self) -> bool {
        self.status != FixpointStatus::Conflict
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of propagator invocations per run.
    pub max_invocations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_invocations: 100_000,
        }
    }
}

impl EngineConfig {
    pub fn with_max_invocations(mut self, n: usize) -> Self {
        self.max_invocations = n;
        self
    }
}

/// Identifier of a propagator registered in a [`FixpointEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropagatorId(usize);

/// Runs registered propagators until none of them changes a domain.
///
/// Propagators are re-queued whenever a variable they watch emits the event
/// they subscribed to. This is a propagation loop only: no branching, no
/// learning.
///
/// # Examples
///
/// ```
/// use u_robustcp::cp::{DomainArena, FixpointEngine, FixpointStatus};
/// use u_robustcp::propagation::JointConfidencePropagator;
///
/// let mut arena = DomainArena::new();
/// let x = arena.new_var("x", 0, 2);
/// let y = arena.new_var("y", 0, 2);
///
/// let mut engine = FixpointEngine::new();
/// engine.add_propagator(JointConfidencePropagator::new(
///     vec![x, y], 80, &[1, 1], &[100, 100],
/// ).unwrap());
///
/// let report = engine.run(&mut arena);
/// assert_eq!(report.status, FixpointStatus::Fixpoint);
/// assert_eq!(arena.lower_bound(x), 2);
/// ```
pub struct FixpointEngine {
    propagators: Vec<Box<dyn Propagator<DomainArena>>>,
    watches: HashMap<(VarId, DomainEvent), Vec<usize>>,
    config: EngineConfig,
}

impl FixpointEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            propagators: Vec::new(),
            watches: HashMap::new(),
            config,
        }
    }

    /// Registers a propagator and subscribes it to the events it watches.
    pub fn add_propagator<P>(&mut self, propagator: P) -> PropagatorId
    where
        P: Propagator<DomainArena> + 'static,
    {
        let id = self.propagators.len();
        for key in propagator.watched() {
            let watchers = self.watches.entry(key).or_default();
            if !watchers.contains(&id) {
                watchers.push(id);
            }
        }
        self.propagators.push(Box::new(propagator));
        PropagatorId(id)
    }

    /// Returns the number of registered propagators.
    pub fn propagator_count(&self) -> usize {
        self.propagators.len()
    }

    /// Propagates every registered propagator to a fixpoint.
    ///
    /// All propagators run at least once. Events pending in the arena before
    /// the call are consumed.
    pub fn run(&self, arena: &mut DomainArena) -> FixpointReport {
        let _ = arena.take_events();

        let mut queue: VecDeque<usize> = (0..self.propagators.len()).collect();
        let mut queued = vec![true; self.propagators.len()];
        let mut invocations = 0usize;
        let mut domain_events = 0usize;

        while let Some(p) = queue.pop_front() {
            if invocations >= self.config.max_invocations {
                return FixpointReport::new(
                    FixpointStatus::InvocationLimit,
                    invocations,
                    domain_events,
                );
            }
            queued[p] = false;
            invocations += 1;

            let propagator = &self.propagators[p];
            if let Err(inconsistency) = propagator.propagate(arena) {
                debug!(propagator = propagator.name(), invocations, "fixpoint conflict");
                let mut report =
                    FixpointReport::new(FixpointStatus::Conflict, invocations, domain_events);
                report.conflict = Some(inconsistency);
                report.failed_propagator = Some(propagator.name().to_string());
                return report;
            }

            for event in arena.take_events() {
                domain_events += 1;
                if let Some(watchers) = self.watches.get(&event) {
                    for &w in watchers {
                        if !queued[w] {
                            queued[w] = true;
                            queue.push_back(w);
                        }
                    }
                }
            }
        }

        debug!(invocations, domain_events, "fixpoint reached");
        FixpointReport::new(FixpointStatus::Fixpoint, invocations, domain_events)
    }
}

impl Default for FixpointEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::{
        ConflictCause, DomainStore, Explanation, JointConfidencePropagator, PropagationStatus,
    };

    /// `target >= source + offset`.
    struct Offset {
        source: VarId,
        target: VarId,
        offset: i64,
    }

    impl Propagator<DomainArena> for Offset {
        fn name(&self) -> &str {
            "Offset"
        }

        fn watched(&self) -> Vec<(VarId, DomainEvent)> {
            vec![(self.source, DomainEvent::LowerBound)]
        }

        fn propagate(&self, store: &mut DomainArena) -> PropagationStatus<BoundLiteral> {
            let reason: Explanation<BoundLiteral> =
                [store.lower_bound_literal(self.source)].into_iter().collect();
            let value = store.lower_bound(self.source) + self.offset;
            store.set_lower_bound(self.target, value, reason)?;
            Ok(())
        }
    }

    #[test]
    fn test_empty_engine() {
        let mut arena = DomainArena::new();
        let engine = FixpointEngine::default();
        let report = engine.run(&mut arena);
        assert_eq!(report.status, FixpointStatus::Fixpoint);
        assert_eq!(report.invocations, 0);
    }

    #[test]
    fn test_chain_reaches_fixpoint() {
        let mut arena = DomainArena::new();
        let a = arena.new_var("a", 0, 20);
        let b = arena.new_var("b", 0, 20);
        let gap = arena.new_var("gap", 0, 20);

        let mut engine = FixpointEngine::new();
        // The confidence propagator raises `gap`, which pushes `a` then `b`.
        engine.add_propagator(Offset { source: a, target: b, offset: 3 });
        engine.add_propagator(Offset { source: gap, target: a, offset: 1 });
        engine.add_propagator(
            JointConfidencePropagator::new(vec![gap], 90, &[2], &[100]).unwrap(),
        );
        assert_eq!(engine.propagator_count(), 3);

        let report = engine.run(&mut arena);
        assert!(report.is_consistent());
        assert_eq!(arena.lower_bound(gap), 5);
        assert_eq!(arena.lower_bound(a), 6);
        assert_eq!(arena.lower_bound(b), 9);
        assert!(report.domain_events >= 3);
    }

    #[test]
    fn test_conflict_after_decision() {
        let mut arena = DomainArena::new();
        let gaps: Vec<VarId> = (0..6).map(|i| arena.new_var(format!("g{i}"), 0, 5)).collect();

        let mut engine = FixpointEngine::new();
        engine.add_propagator(
            JointConfidencePropagator::new(gaps.clone(), 90, &[1; 6], &[100; 6]).unwrap(),
        );
        assert!(engine.run(&mut arena).is_consistent());
        assert!(gaps.iter().all(|&g| arena.lower_bound(g) == 3));

        // Six gaps at 3 each: 0.981^6 < 0.9.
        arena.push_level();
        for &g in &gaps {
            arena.set_upper_bound(g, 3).unwrap();
        }
        let report = engine.run(&mut arena);
        assert_eq!(report.status, FixpointStatus::Conflict);
        assert_eq!(report.failed_propagator.as_deref(), Some("JointConfidence"));
        match report.conflict {
            Some(Inconsistency::Conflict(c)) => {
                assert_eq!(c.cause, ConflictCause::JointBelowConfidence { index: 5 });
                let expected: Vec<BoundLiteral> =
                    gaps.iter().map(|&g| BoundLiteral::at_most(g, 3)).collect();
                assert_eq!(c.explanation.into_literals(), expected);
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        arena.backtrack();
        assert_eq!(arena.upper_bound(gaps[0]), 5);
        assert!(engine.run(&mut arena).is_consistent());
    }

    #[test]
    fn test_invocation_limit() {
        let mut arena = DomainArena::new();
        let a = arena.new_var("a", 0, 1_000);
        let b = arena.new_var("b", 0, 1_000);

        // a >= b + 1 and b >= a + 1 ping-pong until a domain empties.
        let mut engine = FixpointEngine::with_config(EngineConfig::default().with_max_invocations(10));
        engine.add_propagator(Offset { source: a, target: b, offset: 1 });
        engine.add_propagator(Offset { source: b, target: a, offset: 1 });

        let report = engine.run(&mut arena);
        assert_eq!(report.status, FixpointStatus::InvocationLimit);
        assert_eq!(report.invocations, 10);
    }
}
