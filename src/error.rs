//! Construction-time errors.
//!
//! Runtime infeasibility is not an error: it is reported as an
//! [`Inconsistency`](crate::propagation::Inconsistency) by the propagator.

/// Invalid input supplied when building an event table, a distribution
/// model, a propagator, or one of their configurations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("confidence must be in [0, 1], got {0}")]
    ConfidenceOutOfRange(f64),

    #[error("event tables differ in length: {durations} durations vs {occurrences} occurrences")]
    LengthMismatch { durations: usize, occurrences: usize },

    #[error("{entries} event entries cannot be split evenly over {variables} variables")]
    UnevenEventTable { entries: usize, variables: usize },

    #[error("at least one distance variable is required")]
    NoVariables,

    #[error("negative {field} at event entry {position}: {value}")]
    NegativeEventEntry {
        field: &'static str,
        position: usize,
        value: i64,
    },

    #[error("distribution covers {model} variables but {variables} were given")]
    VariableCountMismatch { model: usize, variables: usize },

    #[error("invalid intensity {lambda} for variable {index}")]
    InvalidIntensity { index: usize, lambda: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = ModelError::UnevenEventTable {
            entries: 5,
            variables: 2,
        };
        assert_eq!(
            e.to_string(),
            "5 event entries cannot be split evenly over 2 variables"
        );

        let e = ModelError::ConfidenceOutOfRange(1.5);
        assert!(e.to_string().contains("1.5"));
    }
}
