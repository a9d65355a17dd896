//! Propagator configuration.

use crate::error::ModelError;

/// Literals attached to a lower-bound tightening derived in the second
/// (requirement) pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TighteningExplanation {
    /// The upper-bound literals of every variable, which the derived
    /// requirement depends on, plus the previous lower-bound literal of the
    /// tightened variable. A valid reason for clause learning.
    #[default]
    WithUpperBounds,

    /// Only the previous lower-bound literal of the tightened variable.
    ///
    /// Does not imply the new bound on its own; only for hosts that never
    /// learn from reasons.
    LowerBoundOnly,
}

/// Configuration for the joint-confidence propagator.
///
/// # Examples
///
/// ```
/// use u_robustcp::propagation::{PropagatorConfig, TighteningExplanation};
///
/// let config = PropagatorConfig::default()
///     .with_epsilon(1e-9)
///     .with_tightening_explanation(TighteningExplanation::LowerBoundOnly);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropagatorConfig {
    /// Tolerance for probability comparisons, and the amount subtracted from
    /// a required probability of 1 before inverting the CDF.
    pub epsilon: f64,

    /// Explanation attached to second-pass tightenings.
    pub tightening_explanation: TighteningExplanation,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-7,
            tightening_explanation: TighteningExplanation::default(),
        }
    }
}

impl PropagatorConfig {
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_tightening_explanation(mut self, mode: TighteningExplanation) -> Self {
        self.tightening_explanation = mode;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.epsilon > 0.0 && self.epsilon < 1e-2) {
            return Err(ModelError::InvalidConfig(format!(
                "epsilon must be in (0, 0.01), got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
