//! Chance-constrained propagation over distance variables.
//!
//! # Key Components
//!
//! - **Host contract**: [`DomainStore`]: bounds, bound literals, tightening
//! - **Explanations**: [`Explanation`]: literals justifying a tightening or conflict
//! - **Outcome**: [`PropagationStatus`], [`Inconsistency`], [`PropagatorConflict`]
//! - **Propagator**: [`JointConfidencePropagator`]: keeps the joint success
//!   probability of a sequence of distances above a confidence target
//!
//! # Design
//!
//! The propagator owns no variables. It reads bounds and requests
//! tightenings through [`DomainStore`], so it runs unchanged on any host that
//! implements the trait (see [`crate::cp`] for a reference host). Conflicts
//! are returned as values; backtracking is the host's concern.
//!
//! # References
//!
//! - Charnes & Cooper (1959), "Chance-Constrained Programming"
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"

mod confidence;
mod config;
mod types;

pub use confidence::JointConfidencePropagator;
pub use config::{PropagatorConfig, TighteningExplanation};
pub use types::{
    ConflictCause, DomainEvent, DomainStore, EmptyDomain, Explanation, Inconsistency,
    PropagationStatus, Propagator, PropagatorConflict,
};
