//! Parameters structure for NavCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::fc::Mode;
use serde::{Deserialize, Serialize};

use super::NavCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Constant command offsets applied by a mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ModeCommandParams {
    #[serde(default)]
    pub yaw: f64,

    #[serde(default)]
    pub vertical: f64,

    #[serde(default)]
    pub forward: f64,
}

/// Parameters for navigation control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavCtrlParams {

    // ---- ACCEPTANCE ----

    /// Minimum confidence for an observation to be accepted by the tracker.
    pub conf_min: f64,

    // ---- MODE BASE COMMANDS ----

    pub base_search: ModeCommandParams,

    pub base_track: ModeCommandParams,

    pub base_approach: ModeCommandParams,

    pub base_capture: ModeCommandParams,

    // ---- MODE SELECTION ----

    /// Horizontal bearing tolerance for the anchor to be considered centred.
    pub x_tol: f64,

    /// Vertical bearing tolerance for the anchor to be considered centred.
    pub y_tol: f64,

    /// Number of consecutive centred cycles before approaching.
    pub centered_hold_frames: u32,

    /// Apparent size at which a centred anchor is captured.
    pub size_capture: f64,

    // ---- STEERING ----

    /// Yaw proportional gain on the horizontal bearing error.
    pub kp_x: f64,

    /// Yaw derivative gain on the horizontal bearing rate.
    pub kd_x: f64,

    /// Vertical proportional gain on the vertical bearing error.
    pub kp_y: f64,

    /// Vertical derivative gain on the vertical bearing rate.
    pub kd_y: f64,

    /// Look-ahead used to predict the anchor bearing before computing the error.
    ///
    /// Units: seconds
    pub t_lead: f64,

    // ---- FORWARD SPEED ----

    /// Forward gain of the approach law.
    pub base_forward: f64,

    /// Floor applied to the forward demand of the tracking laws.
    pub forward_min: f64,

    /// Forward demand used when the anchor is centred.
    pub max_forward: f64,

    /// Horizontal bearing at which the forward gate closes.
    pub x_gate: f64,

    /// Vertical bearing at which the forward gate closes.
    pub y_gate: f64,

    // ---- MODE POLICY ----

    /// Modes the controller may use. Empty allows all modes.
    #[serde(default)]
    pub allowed_modes: Vec<Mode>,

    /// Initial mode, and the fallback for disallowed modes.
    #[serde(default = "default_mode")]
    pub default_mode: Mode,

    /// Forced mode, bypassing mode selection.
    #[serde(default)]
    pub mode_override: Option<Mode>,

    // ---- FLY STRAIGHT ----

    /// Duration of a forced fly straight, and the period of the forward ramps.
    ///
    /// Units: seconds
    #[serde(default)]
    pub fly_straight_s: f64,

    #[serde(default)]
    pub fly_straight_forward: f64,

    #[serde(default)]
    pub fly_straight_yaw: f64,

    #[serde(default)]
    pub fly_straight_vertical: f64,

    /// Mode to use once a forced fly straight has finished.
    #[serde(default = "default_mode")]
    pub fly_straight_after_mode: Mode,

    // ---- LAW VARIANTS ----

    #[serde(default)]
    pub fly_straight_profile: FlyStraightProfile,

    #[serde(default)]
    pub lateral_only_profile: LateralOnlyProfile,

    #[serde(default)]
    pub lateral_after_ramp: LateralAfterRamp,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Forward profile of the fly straight law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlyStraightProfile {
    /// Constant `fly_straight_forward`.
    Flat,

    /// Triangular ramp from 0 up to `fly_straight_forward` at half of `fly_straight_s` and back
    /// down to 0 at the end, measured from entering the mode.
    Triangle,
}

/// Forward profile of the lateral only law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralOnlyProfile {
    /// Yaw correction only, forward is always 0.
    YawOnly,

    /// Yaw correction with the fly straight triangular forward ramp layered on top during the
    /// first `fly_straight_s` after entering the mode.
    Ramped,
}

/// Behaviour of the ramped lateral only law once its ramp has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateralAfterRamp {
    /// Continue with yaw correction only.
    YawOnly,

    /// Hold the last emitted command.
    ReplayLast,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for FlyStraightProfile {
    fn default() -> Self {
        FlyStraightProfile::Flat
    }
}

impl Default for LateralOnlyProfile {
    fn default() -> Self {
        LateralOnlyProfile::YawOnly
    }
}

impl Default for LateralAfterRamp {
    fn default() -> Self {
        LateralAfterRamp::YawOnly
    }
}

impl Default for NavCtrlParams {
    fn default() -> Self {
        Self {
            conf_min: 0.5,
            base_search: ModeCommandParams { yaw: 0.2, vertical: 0.0, forward: 0.0 },
            base_track: ModeCommandParams::default(),
            base_approach: ModeCommandParams::default(),
            base_capture: ModeCommandParams { yaw: 0.0, vertical: 0.0, forward: 0.6 },
            x_tol: 0.1,
            y_tol: 0.1,
            centered_hold_frames: 5,
            size_capture: 0.35,
            kp_x: 0.8,
            kd_x: 0.1,
            kp_y: 0.6,
            kd_y: 0.05,
            t_lead: 0.15,
            base_forward: 0.3,
            forward_min: 0.0,
            max_forward: 0.6,
            x_gate: 0.5,
            y_gate: 0.5,
            allowed_modes: Vec::new(),
            default_mode: default_mode(),
            mode_override: None,
            fly_straight_s: 0.0,
            fly_straight_forward: 0.0,
            fly_straight_yaw: 0.0,
            fly_straight_vertical: 0.0,
            fly_straight_after_mode: default_mode(),
            fly_straight_profile: FlyStraightProfile::default(),
            lateral_only_profile: LateralOnlyProfile::default(),
            lateral_after_ramp: LateralAfterRamp::default(),
        }
    }
}

impl NavCtrlParams {
    /// Check the parameters can be used by the controller.
    pub fn validate(&self) -> Result<(), NavCtrlError> {
        let scalars = [
            ("conf_min", self.conf_min),
            ("x_tol", self.x_tol),
            ("y_tol", self.y_tol),
            ("size_capture", self.size_capture),
            ("kp_x", self.kp_x),
            ("kd_x", self.kd_x),
            ("kp_y", self.kp_y),
            ("kd_y", self.kd_y),
            ("t_lead", self.t_lead),
            ("base_forward", self.base_forward),
            ("forward_min", self.forward_min),
            ("max_forward", self.max_forward),
            ("fly_straight_s", self.fly_straight_s),
            ("fly_straight_forward", self.fly_straight_forward),
            ("fly_straight_yaw", self.fly_straight_yaw),
            ("fly_straight_vertical", self.fly_straight_vertical),
        ];

        for (name, value) in scalars.iter() {
            if !value.is_finite() {
                return Err(NavCtrlError::NonFiniteParam(*name))
            }
        }

        for (name, value) in [("x_gate", self.x_gate), ("y_gate", self.y_gate)].iter() {
            if !(*value > 0.0) || !value.is_finite() {
                return Err(NavCtrlError::NonPositiveGate(*name, *value))
            }
        }

        if self.fly_straight_s < 0.0 {
            return Err(NavCtrlError::NegativeDuration(self.fly_straight_s))
        }

        Ok(())
    }
}

fn default_mode() -> Mode {
    Mode::Search
}
