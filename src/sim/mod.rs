//! Monte-Carlo robustness auditing.
//!
//! Estimates, by simulation, the probability that a schedule with fixed
//! distances survives its disruptions, and compares it with the closed-form
//! product of per-distance probabilities.
//!
//! # Key Components
//!
//! - **Config**: [`SimulationConfig`]: sample count, seed, chunking, parallelism
//! - **Runner**: [`RobustnessSimulator`]: draws executions, tallies failures
//! - **Result**: [`SimulationResult`]: estimate, analytic value, weakest distance

mod config;
mod runner;

pub use config::SimulationConfig;
pub use runner::{RobustnessSimulator, SimulationResult};
