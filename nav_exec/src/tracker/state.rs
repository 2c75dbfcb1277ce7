//! Implementations for the anchor tracker state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use serde::Serialize;

// Internal
use comms_if::eqpt::cam::AnchorObservation;
use super::{TrackerParams, MIN_DT_S, NEVER_SEEN_AGE_S, UNSEEN_SIZE_DECAY};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Filtered anchor state, produced once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnchorState {
    /// Time of the observation this state was produced from.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// True while the anchor is seen, or was seen within the hold time.
    pub valid: bool,

    /// Raw confidence of the observation, 0 if nothing was detected.
    pub confidence: f64,

    /// Smoothed horizontal bearing.
    pub cx: f64,

    /// Smoothed vertical bearing.
    pub cy: f64,

    /// Smoothed apparent size.
    pub size: f64,

    /// Horizontal bearing rate.
    ///
    /// Units: 1/seconds
    pub vx: f64,

    /// Vertical bearing rate.
    ///
    /// Units: 1/seconds
    pub vy: f64,

    /// Apparent size rate.
    ///
    /// Units: 1/seconds
    pub vsize: f64,

    /// Time since the last accepted observation.
    ///
    /// Units: seconds
    pub age_s: f64,
}

/// Anchor tracker.
///
/// All filter memory is owned here and persists between calls to [`AnchorTracker::update`].
#[derive(Debug, Clone, Default)]
pub struct AnchorTracker {
    params: TrackerParams,

    /// Time of the last processed observation, `None` before the first call.
    last_t_s: Option<f64>,

    /// Time of the last accepted observation.
    last_accepted_t_s: Option<f64>,

    /// Last accepted raw sample, used for the velocity finite difference.
    last_raw: Option<RawSample>,

    cx: f64,
    cy: f64,
    size: f64,
    vx: f64,
    vy: f64,
    vsize: f64,

    /// Validity reported on the previous call, only used for logging transitions.
    was_valid: bool,
}

#[derive(Debug, Clone, Copy)]
struct RawSample {
    cx: f64,
    cy: f64,
    size: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AnchorTracker {

    /// Create a new tracker which has never seen the anchor.
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    /// Get the tracker's parameters.
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Forget everything, returning to the never-seen state.
    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    /// Process one observation, returning the filtered state.
    ///
    /// `conf_min` is the confidence an observation needs to be accepted while the anchor is held.
    pub fn update(&mut self, obs: &AnchorObservation, conf_min: f64) -> AnchorState {
        let t = obs.timestamp_s;

        // Time step since the last processed observation. The first call only bootstraps the
        // timers, an acceptable first observation counts as the last accepted one so the normal
        // threshold applies to it.
        let dt = match self.last_t_s {
            Some(last_t) => (t - last_t).max(MIN_DT_S),
            None => {
                if obs.detected && obs.confidence >= conf_min {
                    self.last_accepted_t_s = Some(t);
                }
                MIN_DT_S
            }
        };
        self.last_t_s = Some(t);

        let good = obs.detected && obs.confidence >= self.acceptance_threshold(t, conf_min);

        let (valid, age_s) = if good {
            self.accept(obs, dt);
            self.last_accepted_t_s = Some(t);
            (true, 0.0)
        }
        else {
            let age_s = match self.last_accepted_t_s {
                Some(t0) => (t - t0).max(0.0),
                None => NEVER_SEEN_AGE_S
            };
            let valid = age_s <= self.params.hold_s;

            if !valid {
                self.vx *= self.params.decay;
                self.vy *= self.params.decay;
                self.vsize *= self.params.decay;
                self.size *= UNSEEN_SIZE_DECAY;
            }

            (valid, age_s)
        };

        if valid != self.was_valid {
            if valid {
                debug!("Anchor reacquired at {:.3} s", t);
            }
            else {
                debug!("Anchor lost at {:.3} s (age {:.3} s)", t, age_s);
            }
            self.was_valid = valid;
        }

        AnchorState {
            timestamp_s: t,
            valid,
            confidence: if obs.detected { obs.confidence } else { 0.0 },
            cx: self.cx,
            cy: self.cy,
            size: self.size,
            vx: self.vx,
            vy: self.vy,
            vsize: self.vsize,
            age_s,
        }
    }

    /// Confidence threshold for the observation at time `t`.
    ///
    /// Once the hold has expired (or nothing was ever accepted) the stricter reacquire threshold is
    /// used, if one is configured.
    fn acceptance_threshold(&self, t: f64, conf_min: f64) -> f64 {
        let expired = match self.last_accepted_t_s {
            Some(t0) => (t - t0).max(0.0) > self.params.hold_s,
            None => true
        };

        if expired && self.params.reacquire_conf_min > 0.0 {
            self.params.reacquire_conf_min
        }
        else {
            conf_min
        }
    }

    /// Fold an accepted observation into the filter.
    fn accept(&mut self, obs: &AnchorObservation, dt: f64) {
        if let Some(prev) = self.last_raw {
            self.vx = (obs.cx - prev.cx) / dt;
            self.vy = (obs.cy - prev.cy) / dt;
            self.vsize = (obs.size - prev.size) / dt;
        }

        self.last_raw = Some(RawSample {
            cx: obs.cx,
            cy: obs.cy,
            size: obs.size,
        });

        let a = self.params.alpha;
        self.cx = a * self.cx + (1.0 - a) * obs.cx;
        self.cy = a * self.cy + (1.0 - a) * obs.cy;
        self.size = a * self.size + (1.0 - a) * obs.size;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONF_MIN: f64 = 0.5;

    fn seen(t: f64, cx: f64, cy: f64, size: f64) -> AnchorObservation {
        AnchorObservation {
            timestamp_s: t,
            detected: true,
            confidence: 0.9,
            cx,
            cy,
            size,
        }
    }

    fn params(alpha: f64, hold_s: f64, decay: f64) -> TrackerParams {
        TrackerParams {
            alpha,
            hold_s,
            decay,
            reacquire_conf_min: 0.0,
        }
    }

    #[test]
    fn test_velocity_finite_difference() {
        let mut tr = AnchorTracker::new(params(0.0, 1.0, 0.9));

        let st = tr.update(&seen(0.0, 0.0, 0.0, 0.3), CONF_MIN);
        assert!(st.valid);
        assert_eq!(st.vx, 0.0);
        assert_eq!(st.vy, 0.0);
        assert_eq!(st.vsize, 0.0);

        let st = tr.update(&seen(1.0, 0.2, -0.1, 0.4), CONF_MIN);
        assert_eq!(st.cx, 0.2);
        assert_eq!(st.vx, 0.2);
        assert_eq!(st.vy, -0.1);
        assert_eq!(st.size, 0.4);
        assert!((st.vsize - 0.1).abs() < 1e-12);
        assert_eq!(st.age_s, 0.0);
    }

    #[test]
    fn test_first_accepted_has_no_velocity() {
        let mut tr = AnchorTracker::new(params(0.0, 1.0, 0.9));

        // Nothing seen for a while, then a first detection far from centre
        tr.update(&AnchorObservation::not_detected(0.0), CONF_MIN);
        tr.update(&AnchorObservation::not_detected(0.5), CONF_MIN);
        let st = tr.update(&seen(1.0, 0.8, 0.4, 0.2), CONF_MIN);

        assert!(st.valid);
        assert_eq!(st.vx, 0.0);
        assert_eq!(st.vy, 0.0);
        assert_eq!(st.cx, 0.8);
    }

    #[test]
    fn test_ema_smoothing() {
        let mut tr = AnchorTracker::new(params(0.5, 1.0, 0.9));

        let st = tr.update(&seen(0.0, 0.4, 0.0, 0.0), CONF_MIN);
        assert_eq!(st.cx, 0.2);
        let st = tr.update(&seen(0.1, 0.4, 0.0, 0.0), CONF_MIN);
        assert_eq!(st.cx, 0.30000000000000004);
    }

    #[test]
    fn test_hold_boundary() {
        let hold_s = 1.0;
        let mut tr = AnchorTracker::new(params(0.0, hold_s, 0.9));

        tr.update(&seen(0.0, 0.1, 0.1, 0.3), CONF_MIN);

        // Quarter second steps keep the ages exact
        for i in 1..=8 {
            let t = i as f64 * 0.25;
            let st = tr.update(&AnchorObservation::not_detected(t), CONF_MIN);
            assert_eq!(st.age_s, t);
            assert_eq!(st.valid, t <= hold_s, "t = {}", t);
            assert_eq!(st.confidence, 0.0);
        }
    }

    #[test]
    fn test_invalid_decay() {
        let decay = 0.5;
        let mut tr = AnchorTracker::new(params(0.0, 0.2, decay));

        tr.update(&seen(0.0, 0.0, 0.0, 0.5), CONF_MIN);
        let st = tr.update(&seen(0.1, 0.1, -0.05, 0.6), CONF_MIN);

        let (mut vx, mut vy, mut vsize, mut size) = (st.vx, st.vy, st.vsize, st.size);
        assert!(vx != 0.0 && vy != 0.0 && vsize != 0.0);

        // Still held, nothing decays
        let st = tr.update(&AnchorObservation::not_detected(0.3), CONF_MIN);
        assert!(st.valid);
        assert_eq!((st.vx, st.size), (vx, size));

        for i in 0..5 {
            let t = 0.4 + i as f64 * 0.1;
            let st = tr.update(&AnchorObservation::not_detected(t), CONF_MIN);
            assert!(!st.valid);

            vx *= decay;
            vy *= decay;
            vsize *= decay;
            size *= 0.95;

            assert_eq!(st.vx, vx);
            assert_eq!(st.vy, vy);
            assert_eq!(st.vsize, vsize);
            assert_eq!(st.size, size);
        }
    }

    #[test]
    fn test_reacquire_threshold() {
        let mut tr = AnchorTracker::new(TrackerParams {
            alpha: 0.0,
            hold_s: 0.5,
            decay: 0.9,
            reacquire_conf_min: 0.8,
        });
        let weak = |t: f64| AnchorObservation {
            confidence: 0.6,
            ..seen(t, 0.0, 0.0, 0.2)
        };

        // Bootstrap accepts on the normal threshold
        assert!(tr.update(&weak(0.0), CONF_MIN).valid);

        // Inside the hold a weak detection is still accepted
        let st = tr.update(&weak(0.4), CONF_MIN);
        assert!(st.valid);
        assert_eq!(st.age_s, 0.0);

        // Hold expires
        let st = tr.update(&AnchorObservation::not_detected(1.0), CONF_MIN);
        assert!(!st.valid);

        // A weak blip does not reinstate tracking, but keeps its raw confidence
        let st = tr.update(&weak(1.1), CONF_MIN);
        assert!(!st.valid);
        assert_eq!(st.confidence, 0.6);

        // A strong detection does
        let st = tr.update(&seen(1.2, 0.0, 0.0, 0.2), CONF_MIN);
        assert!(st.valid);
        assert_eq!(st.age_s, 0.0);
    }

    #[test]
    fn test_never_seen() {
        let mut tr = AnchorTracker::new(params(0.5, 1.0, 0.9));

        let st = tr.update(&AnchorObservation::not_detected(3.0), CONF_MIN);
        assert!(!st.valid);
        assert_eq!(st.age_s, NEVER_SEEN_AGE_S);

        // Low confidence detections are not accepted either
        let low = AnchorObservation {
            confidence: 0.2,
            ..seen(3.1, 0.0, 0.0, 0.5)
        };
        let st = tr.update(&low, CONF_MIN);
        assert!(!st.valid);
        assert_eq!(st.age_s, NEVER_SEEN_AGE_S);
        assert_eq!(st.size, 0.0);
    }

    #[test]
    fn test_out_of_order_time() {
        let mut tr = AnchorTracker::new(params(0.0, 0.5, 0.9));

        tr.update(&seen(10.0, 0.1, 0.0, 0.3), CONF_MIN);

        // An observation older than the last accepted one never reports a negative age
        let st = tr.update(&AnchorObservation::not_detected(2.0), CONF_MIN);
        assert_eq!(st.age_s, 0.0);
        assert!(st.valid);

        let st = tr.update(&AnchorObservation::not_detected(10.6), CONF_MIN);
        assert!(!st.valid);
        assert!((st.age_s - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut tr = AnchorTracker::new(params(0.0, 1.0, 0.9));
        tr.update(&seen(0.0, 0.5, 0.5, 0.5), CONF_MIN);
        tr.reset();

        let st = tr.update(&AnchorObservation::not_detected(0.1), CONF_MIN);
        assert!(!st.valid);
        assert_eq!(st.cx, 0.0);
        assert_eq!(tr.params().hold_s, 1.0);
    }
}
