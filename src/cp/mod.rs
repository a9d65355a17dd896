//! Reference host for propagators.
//!
//! Provides a minimal search-engine side of the [`DomainStore`] contract:
//! an arena of integer variables addressed by handles, bound literals,
//! trail-based backtracking, and a fixpoint loop that re-runs propagators on
//! the domain events they watch.
//!
//! # Key Components
//!
//! - **Variables**: [`IntVar`], [`VarId`], [`BoundLiteral`]
//! - **Arena**: [`DomainArena`]: owns domains, trails changes, logs reasons
//! - **Engine**: [`FixpointEngine`]: watch lists and propagation queue
//!
//! # Design
//!
//! This module does NOT search: there is no branching heuristic and no
//! clause learning. Decisions are made by the caller through
//! [`DomainArena::set_upper_bound`] between [`DomainArena::push_level`] and
//! [`DomainArena::backtrack`].
//!
//! [`DomainStore`]: crate::propagation::DomainStore

mod arena;
mod engine;
mod variables;

pub use arena::{DomainArena, Propagation};
pub use engine::{EngineConfig, FixpointEngine, FixpointReport, FixpointStatus, PropagatorId};
pub use variables::{BoundLiteral, IntVar, VarId};
