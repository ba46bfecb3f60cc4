//! Monte Carlo sizing of battery portfolios for frequency-containment reserve.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod io;
/// Simulation engine: SOC rule, slot and year simulators, estimator, search.
pub mod sim;
