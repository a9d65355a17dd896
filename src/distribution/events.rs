//! Flattened per-variable disruption event tables.

use crate::error::ModelError;

/// Scale applied to mean occurrence rates supplied as integers.
const OCCURRENCE_SCALE: f64 = 100.0;

/// Disruption events affecting each distance variable.
///
/// Each variable is exposed to the same number of event types. An event type
/// is a `(duration, mean occurrence rate)` pair. Both are stored flattened,
/// entry `variable + event_type * variable_count`.
///
/// Mean occurrence rates are supplied as integers scaled by 100 (`150` means
/// 1.5 occurrences per window).
///
/// # Examples
///
/// ```
/// use u_robustcp::distribution::EventTable;
///
/// // Two variables, two event types each.
/// let table = EventTable::new(&[2, 0, 1, 3], &[100, 0, 50, 100], 2).unwrap();
/// assert_eq!(table.event_types(), 2);
/// assert!((table.intensity(0) - 2.5).abs() < 1e-12);
/// assert!((table.intensity(1) - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventTable {
    durations: Vec<i64>,
    mean_occurrences: Vec<f64>,
    variable_count: usize,
    event_types: usize,
}

impl EventTable {
    /// Builds a table from the integer inputs.
    ///
    /// # Errors
    ///
    /// Fails if `variable_count` is zero, the two arrays differ in length,
    /// their length is not a multiple of `variable_count`, or any entry is
    /// negative.
    pub fn new(
        durations: &[i64],
        mean_occurrences_x100: &[i64],
        variable_count: usize,
    ) -> Result<Self, ModelError> {
        if variable_count == 0 {
            return Err(ModelError::NoVariables);
        }
        if durations.len() != mean_occurrences_x100.len() {
            return Err(ModelError::LengthMismatch {
                durations: durations.len(),
                occurrences: mean_occurrences_x100.len(),
            });
        }
        if durations.len() % variable_count != 0 {
            return Err(ModelError::UnevenEventTable {
                entries: durations.len(),
                variables: variable_count,
            });
        }
        if let Some((position, &value)) = durations.iter().enumerate().find(|(_, &d)| d < 0) {
            return Err(ModelError::NegativeEventEntry {
                field: "duration",
                position,
                value,
            });
        }
        if let Some((position, &value)) = mean_occurrences_x100
            .iter()
            .enumerate()
            .find(|(_, &r)| r < 0)
        {
            return Err(ModelError::NegativeEventEntry {
                field: "mean occurrence",
                position,
                value,
            });
        }

        Ok(Self {
            durations: durations.to_vec(),
            mean_occurrences: mean_occurrences_x100
                .iter()
                .map(|&r| r as f64 / OCCURRENCE_SCALE)
                .collect(),
            variable_count,
            event_types: durations.len() / variable_count,
        })
    }

    /// A table with no events at all: every variable is degenerate.
    pub fn empty(variable_count: usize) -> Result<Self, ModelError> {
        Self::new(&[], &[], variable_count)
    }

    /// Number of distance variables.
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Number of event types per variable.
    pub fn event_types(&self) -> usize {
        self.event_types
    }

    /// Duration and mean occurrence rate of one event type for one variable.
    pub fn event(&self, variable: usize, event_type: usize) -> (i64, f64) {
        let pos = variable + event_type * self.variable_count;
        (self.durations[pos], self.mean_occurrences[pos])
    }

    /// Intensity of variable `index`: the sum over event types of
    /// `mean occurrence * duration`.
    pub fn intensity(&self, index: usize) -> f64 {
        (0..self.event_types)
            .map(|e| {
                let (duration, rate) = self.event(index, e);
                rate * duration as f64
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_single_event_type() {
        let table = EventTable::new(&[2, 5], &[100, 100], 2).unwrap();
        assert_eq!(table.event_types(), 1);
        assert!((table.intensity(0) - 2.0).abs() < 1e-12);
        assert!((table.intensity(1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_layout() {
        // variable 0: (3, 0.5), (1, 2.0); variable 1: (4, 0.25), (0, 9.0)
        let table = EventTable::new(&[3, 4, 1, 0], &[50, 25, 200, 900], 2).unwrap();
        assert_eq!(table.event(0, 1), (1, 2.0));
        assert_eq!(table.event(1, 0), (4, 0.25));
        assert!((table.intensity(0) - 3.5).abs() < 1e-12);
        assert!((table.intensity(1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let table = EventTable::empty(3).unwrap();
        assert_eq!(table.event_types(), 0);
        assert_eq!(table.intensity(2), 0.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            EventTable::new(&[1, 2], &[100], 1),
            Err(ModelError::LengthMismatch {
                durations: 2,
                occurrences: 1
            })
        );
    }

    #[test]
    fn test_uneven_table() {
        assert_eq!(
            EventTable::new(&[1, 2, 3], &[1, 2, 3], 2),
            Err(ModelError::UnevenEventTable {
                entries: 3,
                variables: 2
            })
        );
    }

    #[test]
    fn test_no_variables() {
        assert_eq!(EventTable::new(&[], &[], 0), Err(ModelError::NoVariables));
    }

    #[test]
    fn test_negative_entries() {
        assert!(matches!(
            EventTable::new(&[1, -2], &[100, 100], 2),
            Err(ModelError::NegativeEventEntry {
                field: "duration",
                position: 1,
                value: -2
            })
        ));
        assert!(matches!(
            EventTable::new(&[1, 2], &[-100, 100], 2),
            Err(ModelError::NegativeEventEntry {
                field: "mean occurrence",
                position: 0,
                ..
            })
        ));
    }
}
