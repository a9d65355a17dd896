//! Multi-event Poisson disruption model.

use super::events::EventTable;
use super::types::Distribution;
use crate::error::ModelError;
use rand::Rng;
use rand_distr::Distribution as _;
use statrs::distribution::{DiscreteCDF, Poisson};
use tracing::debug;

/// Upper limit of the quantile search. Reached only for probabilities the
/// CDF never attains numerically.
const QUANTILE_SEARCH_CEILING: i64 = 1 << 40;

/// Poisson counting-process model aggregating several event types per
/// distance variable.
///
/// For variable `i` the total disruption time is modelled as a Poisson
/// variable with intensity `λ_i = Σ_e rate(i, e) * duration(i, e)`; a
/// distance `k` succeeds when the disruption does not exceed it, so the
/// success probability is the Poisson CDF at `k`.
///
/// Variables with `λ_i = 0` are degenerate: they carry no model, always
/// succeed and never need any distance.
///
/// The CDF comes from `statrs`; disruptions are drawn with an independent
/// `rand_distr` Poisson sampler, so simulations do not reuse the CDF.
///
/// # Examples
///
/// ```
/// use u_robustcp::distribution::{Distribution, EventTable, MultiPoissonDistribution};
///
/// let table = EventTable::new(&[2, 0], &[100, 0], 2).unwrap();
/// let model = MultiPoissonDistribution::new(&table).unwrap();
///
/// assert_eq!(model.quantile(0, 0.9), 4);
/// assert!(model.is_degenerate(1));
/// assert_eq!(model.probability(1, 0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct MultiPoissonDistribution {
    intensities: Vec<f64>,
    models: Vec<Option<PoissonModel>>,
}

#[derive(Debug, Clone)]
struct PoissonModel {
    cdf: Poisson,
    sampler: rand_distr::Poisson<f64>,
}

impl MultiPoissonDistribution {
    /// Builds one Poisson model per variable with a positive intensity.
    pub fn new(table: &EventTable) -> Result<Self, ModelError> {
        let intensities: Vec<f64> = (0..table.variable_count())
            .map(|i| table.intensity(i))
            .collect();

        let models = build_models(&intensities)?;

        debug!(
            variables = intensities.len(),
            event_types = table.event_types(),
            degenerate = models.iter().filter(|m| m.is_none()).count(),
            "built multi-poisson distribution"
        );

        Ok(Self {
            intensities,
            models,
        })
    }

    /// Builds the model directly from the flattened integer arrays.
    pub fn from_events(
        durations: &[i64],
        mean_occurrences_x100: &[i64],
        variable_count: usize,
    ) -> Result<Self, ModelError> {
        Self::new(&EventTable::new(
            durations,
            mean_occurrences_x100,
            variable_count,
        )?)
    }

    /// Aggregated intensity `λ` of variable `index`.
    pub fn intensity(&self, index: usize) -> f64 {
        self.intensities[index]
    }

    /// Whether variable `index` has zero intensity.
    pub fn is_degenerate(&self, index: usize) -> bool {
        self.models[index].is_none()
    }
}

#[cfg(not(feature = "parallel"))]
fn build_models(intensities: &[f64]) -> Result<Vec<Option<PoissonModel>>, ModelError> {
    intensities
        .iter()
        .enumerate()
        .map(|(index, &lambda)| build_model(index, lambda))
        .collect()
}

#[cfg(feature = "parallel")]
fn build_models(intensities: &[f64]) -> Result<Vec<Option<PoissonModel>>, ModelError> {
    use rayon::prelude::*;

    intensities
        .par_iter()
        .enumerate()
        .map(|(index, &lambda)| build_model(index, lambda))
        .collect()
}

fn build_model(index: usize, lambda: f64) -> Result<Option<PoissonModel>, ModelError> {
    if lambda <= 0.0 {
        return Ok(None);
    }
    let invalid = ModelError::InvalidIntensity { index, lambda };
    let cdf = Poisson::new(lambda).map_err(|_| invalid.clone())?;
    let sampler = rand_distr::Poisson::new(lambda).map_err(|_| invalid)?;
    Ok(Some(PoissonModel { cdf, sampler }))
}

impl Distribution for MultiPoissonDistribution {
    fn variable_count(&self) -> usize {
        self.models.len()
    }

    fn probability(&self, index: usize, distance: i64) -> f64 {
        match &self.models[index] {
            Some(_) if distance < 0 => 0.0,
            Some(model) => model.cdf.cdf(distance as u64),
            None => 1.0,
        }
    }

    fn quantile(&self, index: usize, probability: f64) -> i64 {
        match &self.models[index] {
            Some(model) => poisson_quantile(&model.cdf, probability),
            None => 0,
        }
    }

    fn sample<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> i64 {
        match &self.models[index] {
            Some(model) => model.sampler.sample(rng) as i64,
            None => 0,
        }
    }
}

/// Smallest `k >= 0` with `CDF(k) >= p`: exponential search for an upper
/// bracket, then bisection.
fn poisson_quantile(poisson: &Poisson, p: f64) -> i64 {
    let cdf = |k: i64| poisson.cdf(k as u64);

    if cdf(0) >= p {
        return 0;
    }

    // Invariant: cdf(lo) < p <= cdf(hi).
    let mut lo = 0i64;
    let mut hi = 1i64;
    while cdf(hi) < p {
        if hi >= QUANTILE_SEARCH_CEILING {
            return QUANTILE_SEARCH_CEILING;
        }
        lo = hi;
        hi *= 2;
    }

    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if cdf(mid) >= p {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}
