//! Per-mode control laws

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::fc::{BodyCommand, Mode};
use util::maths::{clamp, triangle_ramp};
use crate::tracker::AnchorState;
use super::{
    DroneController, ModeCommandParams,
    FlyStraightProfile, LateralOnlyProfile, LateralAfterRamp,
    SEARCH_SWEEP_AMPL, SEARCH_SWEEP_RATE_RADS, TRACK_CREEP_FORWARD, APPROACH_GATE_GAIN
};

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DroneController {

    /// Compute the command of the given mode.
    pub(crate) fn command_for_mode(
        &mut self, 
        mode: Mode, 
        st: &AnchorState, 
        dt_s: f64
    ) -> BodyCommand {
        match mode {
            Mode::Search => self.command_search(st, dt_s),
            Mode::Track => self.command_track_like(Mode::Track, self.params.base_track, st),
            Mode::Approach => 
                self.command_track_like(Mode::Approach, self.params.base_approach, st),
            Mode::Capture => self.command_capture(st),
            Mode::FlyStraight => self.command_fly_straight(st),
            Mode::LateralOnly => self.command_lateral_only(st)
        }
    }

    /// Constant search command with a sinusoidal yaw sweep.
    fn command_search(&mut self, st: &AnchorState, dt_s: f64) -> BodyCommand {
        self.search_phase_s += dt_s;

        let base = self.params.base_search;
        let sweep = SEARCH_SWEEP_AMPL * (SEARCH_SWEEP_RATE_RADS * self.search_phase_s).sin();

        BodyCommand {
            timestamp_s: st.timestamp_s,
            mode: Mode::Search,
            yaw: base.yaw + sweep,
            vertical: base.vertical,
            forward: base.forward,
        }
    }

    /// PD steering on the predicted bearing, with a gated forward demand.
    fn command_track_like(
        &self, 
        mode: Mode, 
        base: ModeCommandParams, 
        st: &AnchorState
    ) -> BodyCommand {
        let p = &self.params;

        let (ex, ey) = self.predicted_error(st);

        let yaw = clamp(base.yaw + p.kp_x * ex + p.kd_x * (-st.vx), -1.0, 1.0);
        let vertical = clamp(base.vertical + p.kp_y * ey + p.kd_y * (-st.vy), -1.0, 1.0);

        let mut forward = if self.is_centred(st) {
            p.max_forward
        }
        else {
            let gate = (1.0 - st.cx.abs() / p.x_gate).max(0.0) 
                * (1.0 - st.cy.abs() / p.y_gate).max(0.0);

            match mode {
                Mode::Track => TRACK_CREEP_FORWARD * gate,
                _ => p.max_forward.min(p.base_forward * gate + APPROACH_GATE_GAIN * gate)
            }
        };

        forward = forward.max(base.forward).max(p.forward_min);

        BodyCommand {
            timestamp_s: st.timestamp_s,
            mode,
            yaw,
            vertical,
            forward: clamp(forward, 0.0, 1.0),
        }
    }

    fn command_capture(&self, st: &AnchorState) -> BodyCommand {
        let base = self.params.base_capture;

        BodyCommand {
            timestamp_s: st.timestamp_s,
            mode: Mode::Capture,
            yaw: base.yaw,
            vertical: base.vertical,
            forward: base.forward,
        }
    }

    /// Constant yaw and vertical, forward following the configured profile.
    fn command_fly_straight(&mut self, st: &AnchorState) -> BodyCommand {
        let p = &self.params;
        let entered_s = *self.fly_straight_entered_s.get_or_insert(st.timestamp_s);

        let forward = match p.fly_straight_profile {
            FlyStraightProfile::Triangle if p.fly_straight_s > 0.0 => 
                p.fly_straight_forward 
                * triangle_ramp(st.timestamp_s - entered_s, p.fly_straight_s),
            _ => p.fly_straight_forward
        };

        BodyCommand {
            timestamp_s: st.timestamp_s,
            mode: Mode::FlyStraight,
            yaw: p.fly_straight_yaw,
            vertical: p.fly_straight_vertical,
            forward,
        }
    }

    /// Yaw only correction, optionally with a forward ramp after entering the mode.
    fn command_lateral_only(&mut self, st: &AnchorState) -> BodyCommand {
        let p = &self.params;
        let entered_s = *self.lateral_entered_s.get_or_insert(st.timestamp_s);

        let (ex, _) = self.predicted_error(st);
        let yaw = clamp(p.kp_x * ex + p.kd_x * (-st.vx), -1.0, 1.0);

        let mut cmd = BodyCommand {
            timestamp_s: st.timestamp_s,
            mode: Mode::LateralOnly,
            yaw,
            vertical: 0.0,
            forward: 0.0,
        };

        if p.lateral_only_profile == LateralOnlyProfile::YawOnly {
            return cmd
        }

        let elapsed_s = st.timestamp_s - entered_s;

        if p.fly_straight_s > 0.0 && elapsed_s <= p.fly_straight_s {
            cmd.forward = p.fly_straight_forward * triangle_ramp(elapsed_s, p.fly_straight_s);
            return cmd
        }

        if p.lateral_after_ramp == LateralAfterRamp::ReplayLast {
            let (yaw, vertical, forward) = match self.last_cmd {
                Some(ref last) => (last.yaw, last.vertical, last.forward),
                None => (0.0, 0.0, 0.0)
            };

            cmd.yaw = yaw;
            cmd.vertical = vertical;
            cmd.forward = forward;
        }

        cmd
    }

    /// Bearing error against the anchor position predicted `t_lead` ahead.
    fn predicted_error(&self, st: &AnchorState) -> (f64, f64) {
        let cx = st.cx + st.vx * self.params.t_lead;
        let cy = st.cy + st.vy * self.params.t_lead;

        (-cx, -cy)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
