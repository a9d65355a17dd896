//! Monte-Carlo estimation of joint success probability.

use super::config::SimulationConfig;
use crate::distribution::Distribution;
use crate::error::ModelError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Result of a robustness simulation.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Number of simulated executions.
    pub samples: usize,

    /// Executions in which every distance absorbed its disruptions.
    pub successes: usize,

    /// Empirical joint success probability.
    pub estimate: f64,

    /// Closed-form joint success probability, `∏_i P_i(d_i)`, as claimed by
    /// the model's CDF.
    pub analytic: f64,

    /// Number of executions in which each distance was exceeded.
    pub failures_per_variable: Vec<usize>,
}

impl SimulationResult {
    /// Standard error of [`estimate`](Self::estimate).
    pub fn standard_error(&self) -> f64 {
        let p = self.estimate;
        (p * (1.0 - p) / self.samples as f64).sqrt()
    }

    /// Whether the empirical probability reaches `confidence`.
    pub fn meets(&self, confidence: f64) -> bool {
        self.estimate >= confidence
    }

    /// Index of the distance that failed most often, if any failed.
    pub fn weakest_variable(&self) -> Option<usize> {
        self.failures_per_variable
            .iter()
            .enumerate()
            .filter(|(_, &f)| f > 0)
            .max_by_key(|(_, &f)| f)
            .map(|(i, _)| i)
    }
}

#[derive(Debug, Clone, Default)]
struct Tally {
    successes: usize,
    failures: Vec<usize>,
}

impl Tally {
    fn merge(mut self, other: Tally) -> Tally {
        self.successes += other.successes;
        if self.failures.is_empty() {
            return Tally {
                successes: self.successes,
                failures: other.failures,
            };
        }
        for (a, b) in self.failures.iter_mut().zip(other.failures) {
            *a += b;
        }
        self
    }
}

/// Simulates executions of a schedule whose distances are fixed.
///
/// In each execution the disruption at every distance is drawn
/// independently with [`Distribution::sample`]; the execution succeeds when
/// every disruption is at most its distance. The estimate is compared with
/// the CDF product, so a model whose CDF disagrees with its process shows up
/// as a gap between [`SimulationResult::estimate`] and
/// [`SimulationResult::analytic`]. Distances are expected to be
/// non-negative.
pub struct RobustnessSimulator;

impl RobustnessSimulator {
    /// Runs the simulation for `distances` under `distribution`.
    pub fn run<D: Distribution>(
        distribution: &D,
        distances: &[i64],
        config: &SimulationConfig,
    ) -> Result<SimulationResult, ModelError> {
        config.validate()?;
        if distances.len() != distribution.variable_count() {
            return Err(ModelError::VariableCountMismatch {
                model: distribution.variable_count(),
                variables: distances.len(),
            });
        }

        let analytic: f64 = distances
            .iter()
            .enumerate()
            .map(|(i, &d)| distribution.probability(i, d))
            .product();

        let base_seed = config.seed.unwrap_or_else(rand::random);
        let chunks: Vec<(u64, usize)> = (0..config.samples.div_ceil(config.chunk_size))
            .map(|c| {
                let start = c * config.chunk_size;
                let len = config.chunk_size.min(config.samples - start);
                (base_seed.wrapping_add(c as u64), len)
            })
            .collect();

        let tally = simulate_chunks(distribution, distances, &chunks, config.parallel);
        let estimate = tally.successes as f64 / config.samples as f64;

        debug!(
            samples = config.samples,
            successes = tally.successes,
            estimate,
            analytic,
            "robustness simulation finished"
        );

        Ok(SimulationResult {
            samples: config.samples,
            successes: tally.successes,
            estimate,
            analytic,
            failures_per_variable: tally.failures,
        })
    }
}

#[cfg(feature = "parallel")]
fn simulate_chunks<D: Distribution>(
    distribution: &D,
    distances: &[i64],
    chunks: &[(u64, usize)],
    parallel: bool,
) -> Tally {
    use rayon::prelude::*;

    if parallel {
        chunks
            .par_iter()
            .map(|&(seed, len)| simulate_chunk(distribution, distances, seed, len))
            .reduce(Tally::default, Tally::merge)
    } else {
        chunks
            .iter()
            .map(|&(seed, len)| simulate_chunk(distribution, distances, seed, len))
            .fold(Tally::default(), Tally::merge)
    }
}

#[cfg(not(feature = "parallel"))]
fn simulate_chunks<D: Distribution>(
    distribution: &D,
    distances: &[i64],
    chunks: &[(u64, usize)],
    _parallel: bool,
) -> Tally {
    chunks
        .iter()
        .map(|&(seed, len)| simulate_chunk(distribution, distances, seed, len))
        .fold(Tally::default(), Tally::merge)
}

fn simulate_chunk<D: Distribution>(
    distribution: &D,
    distances: &[i64],
    seed: u64,
    samples: usize,
) -> Tally {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tally = Tally {
        successes: 0,
        failures: vec![0; distances.len()],
    };

    for _ in 0..samples {
        let mut all_ok = true;
        for (i, &distance) in distances.iter().enumerate() {
            if distribution.sample(i, &mut rng) > distance {
                tally.failures[i] += 1;
                all_ok = false;
            }
        }
        if all_ok {
            tally.successes += 1;
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::DomainArena;
    use crate::distribution::MultiPoissonDistribution;
    use crate::propagation::{JointConfidencePropagator, Propagator};

    fn seeded(samples: usize) -> SimulationConfig {
        SimulationConfig::default()
            .with_samples(samples)
            .with_seed(42)
    }

    #[test]
    fn test_degenerate_always_succeeds() {
        let model = MultiPoissonDistribution::from_events(&[0, 0], &[0, 0], 2).unwrap();
        let result = RobustnessSimulator::run(&model, &[0, 3], &seeded(1_000)).unwrap();
        assert_eq!(result.successes, 1_000);
        assert_eq!(result.estimate, 1.0);
        assert_eq!(result.analytic, 1.0);
        assert_eq!(result.weakest_variable(), None);
    }

    #[test]
    fn test_estimate_matches_cdf() {
        let model = MultiPoissonDistribution::from_events(&[2], &[100], 1).unwrap();
        let result = RobustnessSimulator::run(&model, &[4], &seeded(20_000)).unwrap();
        assert!((result.analytic - 0.947_347).abs() < 1e-5);
        assert!(
            (result.estimate - result.analytic).abs() < 0.01,
            "estimate {} vs analytic {}",
            result.estimate,
            result.analytic
        );
        assert!(result.standard_error() < 0.005);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let model = MultiPoissonDistribution::from_events(&[1, 2], &[100, 100], 2).unwrap();
        let config = seeded(5_000).with_chunk_size(512);
        let a = RobustnessSimulator::run(&model, &[2, 3], &config).unwrap();
        let b = RobustnessSimulator::run(&model, &[2, 3], &config.clone().with_parallel(true))
            .unwrap();
        assert_eq!(a.successes, b.successes);
        assert_eq!(a.failures_per_variable, b.failures_per_variable);
    }

    #[test]
    fn test_weakest_variable() {
        // λ = 1 at distance 4 vs λ = 3 at distance 1.
        let model = MultiPoissonDistribution::from_events(&[1, 3], &[100, 100], 2).unwrap();
        let result = RobustnessSimulator::run(&model, &[4, 1], &seeded(5_000)).unwrap();
        assert_eq!(result.weakest_variable(), Some(1));
        assert_eq!(result.failures_per_variable.len(), 2);
    }

    #[test]
    fn test_audit_propagated_schedule() {
        let mut arena = DomainArena::new();
        let x = arena.new_var("x", 0, 2);
        let y = arena.new_var("y", 0, 2);
        let p = JointConfidencePropagator::new(vec![x, y], 80, &[1, 1], &[100, 100]).unwrap();
        p.propagate(&mut arena).unwrap();

        let distances = [arena.lower_bound(x), arena.lower_bound(y)];
        let result =
            RobustnessSimulator::run(p.distribution().as_ref(), &distances, &seeded(20_000))
                .unwrap();
        assert!(result.meets(0.8), "estimate {}", result.estimate);
    }

    /// Claims a fixed success probability at every distance while its
    /// process always produces a disruption of 5.
    struct Mislabelled;

    impl Distribution for Mislabelled {
        fn variable_count(&self) -> usize {
            1
        }

        fn probability(&self, _index: usize, _distance: i64) -> f64 {
            0.97
        }

        fn quantile(&self, _index: usize, _probability: f64) -> i64 {
            0
        }

        fn sample<R: rand::Rng + ?Sized>(&self, _index: usize, _rng: &mut R) -> i64 {
            5
        }
    }

    #[test]
    fn test_estimate_follows_sampled_disruptions() {
        let result = RobustnessSimulator::run(&Mislabelled, &[3], &seeded(2_000)).unwrap();
        assert_eq!(result.analytic, 0.97);
        assert_eq!(result.successes, 0);
        assert!(!result.meets(0.5));
        assert_eq!(result.weakest_variable(), Some(0));

        let result = RobustnessSimulator::run(&Mislabelled, &[5], &seeded(2_000)).unwrap();
        assert_eq!(result.estimate, 1.0);
    }

    #[test]
    fn test_errors() {
        let model = MultiPoissonDistribution::from_events(&[1], &[100], 1).unwrap();
        assert!(matches!(
            RobustnessSimulator::run(&model, &[1, 2], &seeded(10)),
            Err(ModelError::VariableCountMismatch { .. })
        ));
        assert!(RobustnessSimulator::run(&model, &[1], &seeded(0)).is_err());
    }
}
