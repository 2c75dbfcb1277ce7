//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;

// Internal
use comms_if::eqpt::fc::{BodyCommand, Mode};
use crate::tracker::AnchorState;
use super::NavCtrlParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation controller, the mode state machine and its control laws.
///
/// All state is owned by the controller and only changed through [`DroneController::step`].
#[derive(Debug, Clone)]
pub struct DroneController {
    pub(crate) params: NavCtrlParams,

    /// The mode used on the last step.
    pub(crate) mode: Mode,

    /// Number of consecutive valid cycles with the anchor centred.
    pub(crate) centered_count: u32,

    /// Accumulated SEARCH time driving the yaw sweep.
    ///
    /// Units: seconds
    pub(crate) search_phase_s: f64,

    /// Time the forced mode was first applied.
    pub(crate) override_start_s: Option<f64>,

    /// Time FLY_STRAIGHT was entered, cleared on leaving it.
    pub(crate) fly_straight_entered_s: Option<f64>,

    /// Time LATERAL_ONLY was entered, cleared on leaving it.
    pub(crate) lateral_entered_s: Option<f64>,

    /// The last command returned by `step`.
    pub(crate) last_cmd: Option<BodyCommand>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DroneController {

    /// Create a new controller, starting in the default mode.
    pub fn new(params: NavCtrlParams) -> Self {
        Self {
            mode: params.default_mode,
            params,
            centered_count: 0,
            search_phase_s: 0.0,
            override_start_s: None,
            fly_straight_entered_s: None,
            lateral_entered_s: None,
            last_cmd: None,
        }
    }

    /// Get the controller's parameters.
    pub fn params(&self) -> &NavCtrlParams {
        &self.params
    }

    /// The mode used on the last step, or the default mode before the first step.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of consecutive centred cycles.
    pub fn centered_count(&self) -> u32 {
        self.centered_count
    }

    /// The last command produced, if any.
    pub fn last_cmd(&self) -> Option<&BodyCommand> {
        self.last_cmd.as_ref()
    }

    /// Force a mode, bypassing mode selection, or clear the override with `None`.
    ///
    /// This is intended to be set before the control loop starts.
    pub fn set_mode_override(&mut self, mode: Option<Mode>) {
        self.params.mode_override = mode;
        self.override_start_s = None;
    }

    /// Compute the command for this cycle.
    ///
    /// `dt_s` is the time since the previous step and only drives the search sweep.
    pub fn step(&mut self, st: &AnchorState, dt_s: f64) -> BodyCommand {
        let cmd = match self.params.mode_override {
            Some(forced) => self.step_override(forced, st, dt_s),
            None => {
                let desired = self.select_mode(st);
                let mode = self.clamp_mode(desired);
                self.enter_mode(mode);
                self.command_for_mode(mode, st, dt_s)
            }
        };

        let cmd = saturate(cmd);
        self.last_cmd = Some(cmd);

        cmd
    }

    /// Step with a forced mode.
    ///
    /// A forced FLY_STRAIGHT only lasts `fly_straight_s` from the first step it was applied on,
    /// after which `fly_straight_after_mode` is used.
    fn step_override(&mut self, forced: Mode, st: &AnchorState, dt_s: f64) -> BodyCommand {
        let start_s = *self.override_start_s.get_or_insert(st.timestamp_s);

        let desired = match forced {
            Mode::FlyStraight if st.timestamp_s - start_s > self.params.fly_straight_s => 
                self.params.fly_straight_after_mode,
            m => m
        };

        let mode = self.clamp_mode(desired);
        self.enter_mode(mode);
        self.command_for_mode(mode, st, dt_s)
    }

    /// Make `mode` the current mode, clearing the timers of any mode being left.
    fn enter_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return
        }

        info!("Mode change: {} -> {}", self.mode, mode);

        if mode != Mode::FlyStraight {
            self.fly_straight_entered_s = None;
        }
        if mode != Mode::LateralOnly {
            self.lateral_entered_s = None;
        }

        self.mode = mode;
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Bound every axis of the command to its range.
fn saturate(cmd: BodyCommand) -> BodyCommand {
    use util::maths::clamp;

    BodyCommand {
        yaw: clamp(cmd.yaw, -1.0, 1.0),
        vertical: clamp(cmd.vertical, -1.0, 1.0),
        forward: clamp(cmd.forward, 0.0, 1.0),
        ..cmd
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
