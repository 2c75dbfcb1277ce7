//! # Navigation library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to access items defined
//! inside the navigation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Anchor tracker - filters the anchor observations into a continuous state
pub mod tracker;

/// Navigation control - selects the navigation mode and computes body commands
pub mod nav_ctrl;

/// Observation client - receives anchor observations from the camera pipeline
pub mod obs_client;

/// Command client - sends body commands to the flight controller
pub mod cmd_client;

/// Navigation loop - runs the fixed rate control cycle
pub mod nav_loop;

/// Executable parameters
pub mod params;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Smallest time step passed to the controller.
///
/// Units: seconds
pub const MIN_CYCLE_DT_S: f64 = 1e-3;
