//! Joint-confidence distance propagator.
//!
//! Enforces `∏_i P_i(x_i) >= f`, where `P_i(k)` is the probability that
//! distance `k` absorbs the disruptions affecting variable `i`. Working in
//! log space turns the product into the sum `Σ_i ln P_i(x_i) >= ln f`, which
//! decomposes per variable: with every other variable at its best case
//! (upper bound), variable `i` must reach at least
//! `exp(ln f - Σ_{j≠i} ln P_j(max_j))`, and the quantile of that probability
//! is a valid lower bound for `x_i`.

use super::config::{PropagatorConfig, TighteningExplanation};
use super::types::{
    ConflictCause, DomainEvent, DomainStore, EmptyDomain, Explanation, Inconsistency,
    PropagationStatus, Propagator, PropagatorConflict,
};
use crate::distribution::{DistanceBounds, Distribution, MultiPoissonDistribution};
use crate::error::ModelError;
use std::sync::Arc;
use tracing::{debug, trace};

/// Propagator keeping the joint success probability of a sequence of
/// distance variables above a confidence target.
///
/// The variables are ordered: index `i` of the distribution describes the
/// `i`-th handle. The distribution is shared and never mutated, so one model
/// can back several propagators.
///
/// # Examples
///
/// ```
/// use u_robustcp::cp::DomainArena;
/// use u_robustcp::propagation::{JointConfidencePropagator, Propagator};
///
/// let mut arena = DomainArena::new();
/// let x = arena.new_var("gap", 0, 10);
///
/// // One event type: duration 2, one occurrence on average (λ = 2).
/// let propagator = JointConfidencePropagator::new(vec![x], 90, &[2], &[100]).unwrap();
/// propagator.propagate(&mut arena).unwrap();
///
/// assert_eq!(arena.lower_bound(x), 5);
/// ```
#[derive(Debug, Clone)]
pub struct JointConfidencePropagator<V, D = MultiPoissonDistribution> {
    distances: Vec<V>,
    confidence: f64,
    log_confidence: f64,
    distribution: Arc<D>,
    config: PropagatorConfig,
}

/// Best-case probabilities gathered by the first pass.
#[derive(Debug, Clone)]
struct MaxFeasibility<L> {
    log_max: Vec<f64>,
    sum_log_max: f64,
    max_literals: Vec<L>,
}

impl<L> MaxFeasibility<L> {
    fn with_capacity(n: usize) -> Self {
        Self {
            log_max: Vec::with_capacity(n),
            sum_log_max: 0.0,
            max_literals: Vec::with_capacity(n),
        }
    }

    /// Probability variable `index` must reach when every other variable
    /// sits at its upper bound. Kept strictly below 1.
    fn min_probability_needed(&self, index: usize, log_confidence: f64, epsilon: f64) -> f64 {
        let log_needed = log_confidence - (self.sum_log_max - self.log_max[index]);
        let needed = log_needed.exp();
        if needed >= 1.0 {
            needed - epsilon
        } else {
            needed
        }
    }
}

impl<V: Copy> JointConfidencePropagator<V, MultiPoissonDistribution> {
    /// Builds the propagator and its multi-event Poisson model.
    ///
    /// # Arguments
    /// * `distances` - Distance variable handles, in task order
    /// * `confidence_percent` - Required joint confidence, in `[0, 100]`
    /// * `event_durations` - Flattened event durations (see [`EventTable`](crate::distribution::EventTable))
    /// * `event_mean_occurrences_x100` - Flattened mean occurrence rates, scaled by 100
    pub fn new(
        distances: Vec<V>,
        confidence_percent: i64,
        event_durations: &[i64],
        event_mean_occurrences_x100: &[i64],
    ) -> Result<Self, ModelError> {
        let confidence = confidence_percent as f64 / 100.0;
        check_confidence(confidence)?;
        let distribution = MultiPoissonDistribution::from_events(
            event_durations,
            event_mean_occurrences_x100,
            distances.len(),
        )?;
        Self::with_distribution(
            distances,
            confidence,
            Arc::new(distribution),
            PropagatorConfig::default(),
        )
    }
}

impl<V: Copy, D: Distribution> JointConfidencePropagator<V, D> {
    /// Builds the propagator over an arbitrary distribution model.
    ///
    /// `confidence` is a probability in `[0, 1]`.
    pub fn with_distribution(
        distances: Vec<V>,
        confidence: f64,
        distribution: Arc<D>,
        config: PropagatorConfig,
    ) -> Result<Self, ModelError> {
        check_confidence(confidence)?;
        if distances.is_empty() {
            return Err(ModelError::NoVariables);
        }
        if distribution.variable_count() != distances.len() {
            return Err(ModelError::VariableCountMismatch {
                model: distribution.variable_count(),
                variables: distances.len(),
            });
        }
        config.validate()?;

        Ok(Self {
            distances,
            confidence,
            log_confidence: confidence.ln(),
            distribution,
            config,
        })
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: PropagatorConfig) -> Result<Self, ModelError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// The confidence target `f`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// The distance variable handles, in order.
    pub fn distances(&self) -> &[V] {
        &self.distances
    }

    /// The shared distribution model.
    pub fn distribution(&self) -> &Arc<D> {
        &self.distribution
    }

    /// The propagator configuration.
    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    /// Joint success probability of a full assignment of distances.
    pub fn joint_probability(&self, distances: &[i64]) -> f64 {
        distances
            .iter()
            .enumerate()
            .map(|(i, &d)| self.distribution.probability(i, d))
            .product()
    }

    /// Joint success probability with every variable at its upper bound.
    pub fn best_case_probability<S: DomainStore<Var = V>>(&self, store: &S) -> f64 {
        self.distances
            .iter()
            .enumerate()
            .map(|(i, &var)| {
                self.distribution
                    .max_probability(i, read_bounds(store, var))
            })
            .product()
    }

    /// Raises the lower bound of variable `index` to the quantile of `f`
    /// plus one when its current lower bound is below the target on its own.
    fn pre_tighten<S: DomainStore<Var = V>>(
        &self,
        store: &mut S,
        index: usize,
        var: V,
    ) -> Result<(), EmptyDomain> {
        let bounds = read_bounds(store, var);
        let min_probability = self.distribution.min_probability(index, bounds);
        if min_probability + self.config.epsilon >= self.confidence {
            return Ok(());
        }

        let required = self
            .distribution
            .quantile(index, self.confidence)
            .saturating_add(1);
        if required > bounds.max {
            // Left to the feasibility checks below.
            trace!(index, required, max = bounds.max, "pre-tightening skipped");
            return Ok(());
        }

        let mut reason = Explanation::with_capacity(1);
        reason.push(store.lower_bound_literal(var));
        debug!(
            index,
            from = bounds.min,
            to = required,
            min_probability,
            "raising lower bound to per-variable quantile"
        );
        store.set_lower_bound(var, required, reason)
    }

    /// First pass: per-variable pre-tightening, then accumulation of the
    /// best-case log probabilities with early failure.
    fn check_max_feasibility<S: DomainStore<Var = V>>(
        &self,
        store: &mut S,
    ) -> Result<MaxFeasibility<S::Literal>, Inconsistency<S::Literal>> {
        let mut feasibility = MaxFeasibility::with_capacity(self.distances.len());

        for (i, &var) in self.distances.iter().enumerate() {
            self.pre_tighten(store, i, var)?;

            let bounds = read_bounds(store, var);
            let max_probability = self.distribution.max_probability(i, bounds);
            let log_max = max_probability.ln();
            feasibility.log_max.push(log_max);
            feasibility.sum_log_max += log_max;
            feasibility.max_literals.push(store.upper_bound_literal(var));

            trace!(
                index = i,
                min = bounds.min,
                max = bounds.max,
                max_probability,
                sum_log_max = feasibility.sum_log_max,
                "accumulated best case"
            );

            if max_probability < self.confidence {
                return Err(conflict(
                    feasibility.max_literals.into_iter().collect(),
                    ConflictCause::IndexBelowConfidence { index: i },
                ));
            }
            if feasibility.sum_log_max < self.log_confidence {
                return Err(conflict(
                    feasibility.max_literals.into_iter().collect(),
                    ConflictCause::JointBelowConfidence { index: i },
                ));
            }
        }

        Ok(feasibility)
    }

    /// Second pass: derive each variable's minimum distance from the
    /// best case of all the others.
    fn tighten_to_requirements<S: DomainStore<Var = V>>(
        &self,
        store: &mut S,
        feasibility: &MaxFeasibility<S::Literal>,
    ) -> PropagationStatus<S::Literal> {
        for (i, &var) in self.distances.iter().enumerate() {
            let needed =
                feasibility.min_probability_needed(i, self.log_confidence, self.config.epsilon);
            let minimum_distance = self.distribution.quantile(i, needed);
            let bounds = read_bounds(store, var);

            if minimum_distance > bounds.max {
                let mut explanation: Explanation<S::Literal> =
                    feasibility.max_literals.iter().cloned().collect();
                explanation.push(store.at_most_literal(var, minimum_distance - 1));
                return Err(conflict(
                    explanation,
                    ConflictCause::RequirementExceedsDomain {
                        index: i,
                        required: minimum_distance,
                    },
                ));
            }

            if minimum_distance > bounds.min {
                let mut reason: Explanation<S::Literal> = match self.config.tightening_explanation {
                    TighteningExplanation::WithUpperBounds => {
                        feasibility.max_literals.iter().cloned().collect()
                    }
                    TighteningExplanation::LowerBoundOnly => Explanation::with_capacity(1),
                };
                reason.push(store.lower_bound_literal(var));
                debug!(
                    index = i,
                    from = bounds.min,
                    to = minimum_distance,
                    needed,
                    "raising lower bound to joint requirement"
                );
                store.set_lower_bound(var, minimum_distance, reason)?;
            }
        }
        Ok(())
    }
}

impl<S: DomainStore, D: Distribution> Propagator<S> for JointConfidencePropagator<S::Var, D> {
    fn name(&self) -> &str {
        "JointConfidence"
    }

    fn watched(&self) -> Vec<(S::Var, DomainEvent)> {
        self.distances
            .iter()
            .map(|&var| (var, DomainEvent::LowerBound))
            .collect()
    }

    fn propagate(&self, store: &mut S) -> PropagationStatus<S::Literal> {
        if self.confidence <= 0.0 {
            return Ok(());
        }
        let feasibility = self.check_max_feasibility(store)?;
        self.tighten_to_requirements(store, &feasibility)
    }
}

fn check_confidence(confidence: f64) -> Result<(), ModelError> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(ModelError::ConfidenceOutOfRange(confidence))
    }
}

fn read_bounds<S: DomainStore>(store: &S, var: S::Var) -> DistanceBounds {
    DistanceBounds::new(store.lower_bound(var), store.upper_bound(var))
}

fn conflict<L>(explanation: Explanation<L>, cause: ConflictCause) -> Inconsistency<L> {
    debug!(?cause, literals = explanation.len(), "joint confidence conflict");
    PropagatorConflict { explanation, cause }.into()
}
