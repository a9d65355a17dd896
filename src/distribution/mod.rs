//! Stochastic disruption models for distance variables.
//!
//! A distribution answers, for each distance variable, how likely a given
//! distance is to absorb the disruptions that occur before the next task
//! transition, and which distance is needed to reach a given probability.
//!
//! # Key Components
//!
//! - **Trait**: [`Distribution`]: the capability set the propagator relies on
//! - **Input**: [`EventTable`]: flattened per-variable event durations and rates
//! - **Model**: [`MultiPoissonDistribution`]: one Poisson counting process per
//!   variable, aggregating all event types into a single intensity
//!
//! # References
//!
//! Ross (2014), "Introduction to Probability Models", ch. 5 (Poisson process)

mod events;
mod poisson;
mod types;

pub use events::EventTable;
pub use poisson::MultiPoissonDistribution;
pub use types::{DistanceBounds, Distribution};
