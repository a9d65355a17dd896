//! Core trait for distance distributions.

use rand::Rng;

/// Current bounds `[min, max]` of a distance variable, as read from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceBounds {
    /// Current lower bound.
    pub min: i64,
    /// Current upper bound.
    pub max: i64,
}

impl DistanceBounds {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// A stochastic model giving, per distance variable, the probability that a
/// distance is large enough to absorb the disruptions it is exposed to.
///
/// Implementations are immutable after construction: every method is a pure
/// function of the model and the arguments. Variables are addressed by their
/// position in the propagator's ordered variable list.
///
/// # Implementing
///
/// ```ignore
/// struct AlwaysSafe { n: usize }
///
/// impl Distribution for AlwaysSafe {
///     fn variable_count(&self) -> usize { self.n }
///     fn probability(&self, _index: usize, _distance: i64) -> f64 { 1.0 }
///     fn quantile(&self, _index: usize, _probability: f64) -> i64 { 0 }
///     fn sample<R: Rng + ?Sized>(&self, _index: usize, _rng: &mut R) -> i64 { 0 }
/// }
/// ```
pub trait Distribution: Send + Sync {
    /// Number of distance variables covered by the model.
    fn variable_count(&self) -> usize;

    /// Probability that `distance` is enough for variable `index`.
    ///
    /// Must be non-decreasing in `distance`.
    fn probability(&self, index: usize, distance: i64) -> f64;

    /// Smallest integer distance `k` with `probability(index, k) >= probability`.
    ///
    /// Must be non-decreasing in `probability`.
    fn quantile(&self, index: usize, probability: f64) -> i64;

    /// Draws one disruption affecting variable `index` from the underlying
    /// process. A distance `k` absorbs it when the draw is at most `k`.
    fn sample<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> i64;

    /// Success probability at the current lower bound.
    fn min_probability(&self, index: usize, bounds: DistanceBounds) -> f64 {
        self.probability(index, bounds.min)
    }

    /// Success probability at the current upper bound; the best case for
    /// this variable.
    fn max_probability(&self, index: usize, bounds: DistanceBounds) -> f64 {
        self.probability(index, bounds.max)
    }

    /// Adds `distance` to the current upper bound of variable `index`.
    ///
    /// Hook for redistributing slack across variables when generalizing a
    /// conflict; the joint-confidence propagator does not call it.
    fn add_max_distance(&self, distance: i64, _index: usize, bounds: DistanceBounds) -> i64 {
        bounds.max + distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Linear;

    impl Distribution for Linear {
        fn variable_count(&self) -> usize {
            1
        }

        fn probability(&self, _index: usize, distance: i64) -> f64 {
            (distance as f64 / 10.0).clamp(0.0, 1.0)
        }

        fn quantile(&self, _index: usize, probability: f64) -> i64 {
            (probability * 10.0).ceil() as i64
        }

        fn sample<R: Rng + ?Sized>(&self, _index: usize, rng: &mut R) -> i64 {
            rng.random_range(1..=10)
        }
    }

    #[test]
    fn test_default_bound_queries() {
        let d = Linear;
        let bounds = DistanceBounds::new(3, 8);
        assert!((d.min_probability(0, bounds) - 0.3).abs() < 1e-12);
        assert!((d.max_probability(0, bounds) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_sample_within_support() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let d = Linear;
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let k = d.sample(0, &mut rng);
            assert!((1..=10).contains(&k));
            assert!(d.probability(0, k) > 0.0);
        }
    }

    #[test]
    fn test_add_max_distance() {
        let d = Linear;
        assert_eq!(d.add_max_distance(4, 0, DistanceBounds::new(1, 6)), 10);
        assert_eq!(d.add_max_distance(-2, 0, DistanceBounds::new(1, 6)), 4);
    }
}
