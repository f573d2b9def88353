//! # Navigation library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Angle normalisation utilities
pub mod angle;

/// Diagnostics sinks - log and archive what navigation is doing
pub mod diag;

/// Equipment interfaces - position sources and command sinks
pub mod eqpt;

/// Geodesic positions and operations on a spherical earth
pub mod geo;

/// Navigation control module - steers the rover towards a queue of waypoints
pub mod nav_ctrl;

/// Position filter - rejects bad fixes and smooths good ones
pub mod pos_filter;

/// Navigation runner - the cyclic control loop and its handle
pub mod runner;

/// Simulated differential drive rover
pub mod sim;
