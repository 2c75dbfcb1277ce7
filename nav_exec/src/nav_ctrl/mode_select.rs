//! Mode selection and mode policy

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::fc::Mode;
use crate::tracker::AnchorState;
use super::{DroneController, RECENTLY_SEEN_AGE_S};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Restrict a desired mode to the allowed modes.
///
/// An empty allow list accepts every mode. A disallowed mode falls back to `default` if that is
/// allowed, otherwise to the first allowed mode.
pub fn apply_mode_policy(desired: Mode, allowed: &[Mode], default: Mode) -> Mode {
    if allowed.is_empty() || allowed.contains(&desired) {
        return desired
    }

    if allowed.contains(&default) {
        default
    }
    else {
        allowed[0]
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DroneController {

    /// Select the desired mode from the tracking state, updating the centred counter.
    pub(crate) fn select_mode(&mut self, st: &AnchorState) -> Mode {
        if !st.valid {
            // A momentary dropout keeps the tracking law running on the held estimate
            if st.age_s <= RECENTLY_SEEN_AGE_S {
                return Mode::Track
            }

            self.centered_count = 0;
            return Mode::Search
        }

        if self.is_centred(st) {
            self.centered_count = self.centered_count.saturating_add(1);
        }
        else {
            self.centered_count = 0;
        }

        let held = self.centered_count >= self.params.centered_hold_frames;

        if held && st.size >= self.params.size_capture {
            Mode::Capture
        }
        else if held {
            Mode::Approach
        }
        else {
            Mode::Track
        }
    }

    /// Apply the mode policy using this controller's allow list and default mode.
    pub(crate) fn clamp_mode(&self, desired: Mode) -> Mode {
        apply_mode_policy(
            desired, 
            &self.params.allowed_modes, 
            self.params.default_mode
        )
    }

    /// True if the anchor bearing is inside both tolerances.
    pub(crate) fn is_centred(&self, st: &AnchorState) -> bool {
        st.cx.abs() < self.params.x_tol && st.cy.abs() < self.params.y_tol
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
