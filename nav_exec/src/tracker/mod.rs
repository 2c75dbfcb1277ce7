//! # Anchor tracker module
//!
//! The tracker turns the single, possibly missing, possibly unreliable observation received each
//! cycle into a continuous [`AnchorState`]:
//!
//! - Accepted observations are smoothed with an exponential moving average and a velocity is
//!   estimated by finite difference against the previous raw sample.
//! - When the anchor drops out the last smoothed state is held as valid for `hold_s` seconds.
//! - Once the hold expires the state is invalid, velocities decay and the size shrinks, and a
//!   stricter confidence (`reacquire_conf_min`) is needed to accept the anchor again.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Smallest time step used for finite differences.
///
/// Units: seconds
pub const MIN_DT_S: f64 = 1e-3;

/// Age reported when no observation has ever been accepted.
///
/// Units: seconds
pub const NEVER_SEEN_AGE_S: f64 = 999.0;

/// Factor applied to the smoothed size on every cycle the state is invalid.
pub const UNSEEN_SIZE_DECAY: f64 = 0.95;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors in the tracker parameters.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrackerError {
    #[error("Parameter {0} must be within [0, 1], found {1}")]
    OutOfUnitRange(&'static str, f64),

    #[error("hold_s must be finite and not negative, found {0}")]
    InvalidHold(f64),
}
