//! Parameters structure for the anchor tracker

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::TrackerError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the anchor tracker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackerParams {

    /// Weight of the previous smoothed value in the moving average, 0 disables smoothing.
    pub alpha: f64,

    /// How long the state is reported valid after the last accepted observation.
    ///
    /// Units: seconds
    pub hold_s: f64,

    /// Factor applied to the velocity estimates on every cycle the state is invalid.
    pub decay: f64,

    /// Confidence needed to accept the anchor after the hold has expired. Zero or negative uses
    /// the controller's normal `conf_min` at all times.
    #[serde(default)]
    pub reacquire_conf_min: f64,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            hold_s: 0.5,
            decay: 0.9,
            reacquire_conf_min: 0.0,
        }
    }
}

impl TrackerParams {
    /// Check the parameters are usable by the filter.
    pub fn validate(&self) -> Result<(), TrackerError> {
        for (name, value) in [("alpha", self.alpha), ("decay", self.decay)].iter() {
            if !(*value >= 0.0 && *value <= 1.0) {
                return Err(TrackerError::OutOfUnitRange(*name, *value))
            }
        }

        if !(self.hold_s >= 0.0) || !self.hold_s.is_finite() {
            return Err(TrackerError::InvalidHold(self.hold_s))
        }

        // Anything above 1 would never reacquire
        if !(self.reacquire_conf_min <= 1.0) {
            return Err(TrackerError::OutOfUnitRange("reacquire_conf_min", self.reacquire_conf_min))
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(TrackerParams::default().validate(), Ok(()));

        let p = TrackerParams { alpha: f64::NAN, ..Default::default() };
        assert!(matches!(p.validate(), Err(TrackerError::OutOfUnitRange("alpha", _))));

        let p = TrackerParams { decay: 1.5, ..Default::default() };
        assert_eq!(p.validate(), Err(TrackerError::OutOfUnitRange("decay", 1.5)));

        let p = TrackerParams { hold_s: -0.1, ..Default::default() };
        assert_eq!(p.validate(), Err(TrackerError::InvalidHold(-0.1)));

        let p = TrackerParams { hold_s: f64::INFINITY, ..Default::default() };
        assert_eq!(p.validate(), Err(TrackerError::InvalidHold(f64::INFINITY)));

        let p = TrackerParams { reacquire_conf_min: 2.0, ..Default::default() };
        assert!(p.validate().is_err());

        // Zero or negative disables the reacquire threshold
        let p = TrackerParams { reacquire_conf_min: -1.0, ..Default::default() };
        assert_eq!(p.validate(), Ok(()));
    }
}
