//! Simulation configuration.

use crate::error::ModelError;

/// Configuration for the Monte-Carlo robustness simulator.
///
/// Samples are drawn in chunks; chunk `c` uses seed `seed + c`, so results
/// depend only on the seed, the sample count and the chunk size, never on
/// whether chunks run in parallel.
///
/// # Examples
///
/// ```
/// use u_robustcp::sim::SimulationConfig;
///
/// let config = SimulationConfig::default()
///     .with_samples(50_000)
///     .with_seed(7)
///     .with_parallel(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Number of simulated executions of the schedule.
    pub samples: usize,

    /// Samples per chunk.
    pub chunk_size: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,

    /// Whether to simulate chunks in parallel using rayon.
    ///
    /// Ignored unless the `parallel` feature is enabled.
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            samples: 10_000,
            chunk_size: 4_096,
            seed: None,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    pub fn with_samples(mut self, n: usize) -> Self {
        self.samples = n;
        self
    }

    pub fn with_chunk_size(mut self, n: usize) -> Self {
        self.chunk_size = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.samples == 0 {
            return Err(ModelError::InvalidConfig("samples must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(ModelError::InvalidConfig(
                "chunk_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.samples, 10_000);
        assert!(config.seed.is_none());
        assert!(!config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_samples() {
        assert!(SimulationConfig::default()
            .with_samples(0)
            .validate()
            .is_err());
        assert!(SimulationConfig::default()
            .with_chunk_size(0)
            .validate()
            .is_err());
    }
}
