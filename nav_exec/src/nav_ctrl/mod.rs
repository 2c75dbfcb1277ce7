//! # Navigation control module
//!
//! NavCtrl owns the navigation mode state machine and computes one [`BodyCommand`] per cycle from
//! the tracked [`AnchorState`](crate::tracker::AnchorState).
//!
//! Without an override the mode is selected from the tracking state each cycle:
//!
//! - `SEARCH` - the anchor is lost, sweep yaw to find it again.
//! - `TRACK` - the anchor is visible (or only just dropped out), steer to centre it.
//! - `APPROACH` - the anchor has been centred for `centered_hold_frames` cycles, advance.
//! - `CAPTURE` - centred and closer than `size_capture`, hold the capture command.
//!
//! `FLY_STRAIGHT` and `LATERAL_ONLY` are only reached through the mode override (or the policy
//! fallback) and are intended for testing on the vehicle.
//!
//! Every mode chosen, by selection or override, is passed through the mode policy so that only
//! modes in `allowed_modes` are ever used.
//!
//! [`BodyCommand`]: comms_if::eqpt::fc::BodyCommand

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod laws;
mod mode_select;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use mode_select::apply_mode_policy;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// An invalid state younger than this is still treated as tracking.
///
/// Units: seconds
pub const RECENTLY_SEEN_AGE_S: f64 = 0.35;

/// Amplitude of the search yaw sweep.
pub const SEARCH_SWEEP_AMPL: f64 = 0.35;

/// Angular rate of the search yaw sweep.
///
/// Units: radians/second
pub const SEARCH_SWEEP_RATE_RADS: f64 = 0.7;

/// Forward demand of TRACK at a fully open gate.
pub const TRACK_CREEP_FORWARD: f64 = 0.10;

/// Additional forward gain of APPROACH, on top of `base_forward`.
pub const APPROACH_GATE_GAIN: f64 = 0.25;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors in the NavCtrl parameters.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Parameter {0} must be finite")]
    NonFiniteParam(&'static str),

    #[error("Gate radius {0} must be positive, found {1}")]
    NonPositiveGate(&'static str, f64),

    #[error("fly_straight_s must not be negative, found {0}")]
    NegativeDuration(f64),
}
