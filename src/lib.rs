//! Chance-constrained propagation for robust scheduling.
//!
//! Decides, inside a constraint-based search, whether the minimum distances
//! scheduled between consecutive tasks remain robust against recurring
//! stochastic disruptions (machine breakdowns, setups that overrun), and
//! tightens the distance variables so the joint probability that every
//! distance absorbs its disruptions stays above a confidence target.
//!
//! - **Distribution**: Per-distance disruption models behind the
//!   [`distribution::Distribution`] trait, with a multi-event Poisson model.
//! - **Propagation**: The joint-confidence propagator, its host contract
//!   ([`propagation::DomainStore`]) and conflict explanations.
//! - **CP**: A reference host: variable arena, trail, fixpoint loop.
//! - **Simulation**: Monte-Carlo auditing of fixed schedules.
//!
//! # Architecture
//!
//! The propagator owns nothing but an immutable, shareable distribution
//! model. Variables, literals, reasons and backtracking belong to the host;
//! any search engine can drive the propagator by implementing
//! [`propagation::DomainStore`].

pub mod cp;
pub mod distribution;
pub mod error;
pub mod propagation;
pub mod sim;

pub use error::ModelError;
