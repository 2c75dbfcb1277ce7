//! # Navigation Loop
//!
//! The NavLoop drives the fixed rate control cycle:
//!
//! 1. Snapshot the observation mailbox. If no new datagram arrived since the last cycle a "not
//!    detected" observation is synthesised. Either way the observation is stamped with the
//!    current loop time, a sender timestamp is only recorded.
//! 2. Update the anchor tracker.
//! 3. Step the navigation controller.
//! 4. Send the command and, if enabled, trace and archive the cycle.
//!
//! [`NavLoop::cycle`] performs a single cycle for a given loop time and is independent of the wall
//! clock. [`NavLoop::run`] calls it at the configured rate until a [`Shutdown`] is requested or
//! the maximum run time is reached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread,
    time::Instant,
};
use log::{debug, info, warn};
use serde::Serialize;

use comms_if::eqpt::{cam::AnchorObservation, fc::{BodyCommand, Mode}};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    time::seconds_to_std_duration,
};
use crate::{
    cmd_client::CmdClient,
    nav_ctrl::DroneController,
    obs_client::ObsMailbox,
    params::NavExecParams,
    tracker::{AnchorState, AnchorTracker},
    MIN_CYCLE_DT_S
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle used to request the loop and its clients stop.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

pub struct NavLoop {
    params: NavExecParams,

    mailbox: Arc<ObsMailbox>,

    /// Mailbox sequence number seen on the previous cycle.
    last_seq: u64,

    tracker: AnchorTracker,
    ctrl: DroneController,

    cmd_client: Option<CmdClient>,
    archiver: Option<Archiver>,

    last_report: Option<CycleReport>,
    num_cycles: u64,
}

/// Everything computed during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CycleReport {
    /// The observation fed to the tracker.
    pub obs: AnchorObservation,

    /// True if the observation came from a datagram received since the previous cycle.
    pub fresh: bool,

    /// Timestamp carried by a fresh six field datagram, on the sender's clock.
    pub sender_time_s: Option<f64>,

    pub state: AnchorState,
    pub cmd: BodyCommand,
}

/// Flattened cycle report, one archive row per cycle.
#[derive(Debug, Serialize)]
struct CycleRecord {
    cycle: u64,
    obs_time_s: f64,
    obs_fresh: bool,
    obs_detected: bool,
    obs_confidence: f64,
    obs_cx: f64,
    obs_cy: f64,
    obs_size: f64,
    obs_sender_time_s: Option<f64>,
    state_valid: bool,
    state_cx: f64,
    state_cy: f64,
    state_size: f64,
    state_vx: f64,
    state_vy: f64,
    state_vsize: f64,
    state_age_s: f64,
    cmd_mode: Mode,
    cmd_yaw: f64,
    cmd_vertical: f64,
    cmd_forward: f64,
}

/// Statistics of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub num_cycles: u64,
    pub num_overruns: u64,
    pub duration_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this handle to stop.
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Request shutdown when the process receives SIGINT or SIGTERM.
    ///
    /// Only one handler can be installed per process.
    pub fn request_on_signal(&self) -> Result<(), ctrlc::Error> {
        let handle = self.clone();

        ctrlc::set_handler(move || {
            info!("Shutdown signal received");
            handle.request();
        })
    }
}

impl NavLoop {
    /// Create a new loop reading from the given mailbox.
    ///
    /// Commands are only sent if a client is added with [`NavLoop::with_cmd_client`].
    pub fn new(
        params: NavExecParams,
        mailbox: Arc<ObsMailbox>,
        tracker: AnchorTracker,
        ctrl: DroneController,
    ) -> Self {
        Self {
            params,
            mailbox,
            last_seq: 0,
            tracker,
            ctrl,
            cmd_client: None,
            archiver: None,
            last_report: None,
            num_cycles: 0,
        }
    }

    pub fn with_cmd_client(mut self, client: CmdClient) -> Self {
        self.cmd_client = Some(client);
        self
    }

    /// Archive every cycle using the given archiver.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    pub fn ctrl(&self) -> &DroneController {
        &self.ctrl
    }

    pub fn tracker(&self) -> &AnchorTracker {
        &self.tracker
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    /// Perform one cycle at loop time `now_s`, with `dt_s` elapsed since the previous cycle.
    pub fn cycle(&mut self, now_s: f64, dt_s: f64) -> CycleReport {

        // ---- OBSERVATION ----

        let slot = self.mailbox.snapshot();

        let (obs, fresh, sender_time_s) = match slot.latest {
            Some(d) if slot.seq != self.last_seq => {
                (d.into_observation(now_s), true, d.timestamp_s)
            },
            _ => (AnchorObservation::not_detected(now_s), false, None)
        };
        self.last_seq = slot.seq;

        // ---- TRACKING AND CONTROL ----

        let state = self.tracker.update(&obs, self.ctrl.params().conf_min);
        let cmd = self.ctrl.step(&state, dt_s.max(MIN_CYCLE_DT_S));

        // ---- OUTPUT ----

        if let Some(ref mut client) = self.cmd_client {
            client.send(&cmd);
        }

        let report = CycleReport { obs, fresh, sender_time_s, state, cmd };

        if self.params.log.cycle_trace {
            trace_cycle(&report);
        }

        self.last_report = Some(report);

        if self.archiver.is_some() {
            if let Err(e) = self.write() {
                warn!("Could not archive cycle {}: {}", self.num_cycles, e);
            }
        }

        self.num_cycles += 1;

        report
    }

    /// Run cycles at the configured rate until shutdown is requested or `max_run_s` elapses.
    ///
    /// Overrunning cycles are not caught up, the next cycle simply starts late.
    pub fn run(&mut self, shutdown: &Shutdown) -> RunSummary {
        let period = seconds_to_std_duration(self.params.cycle_period_s());
        let max_run = self.params.max_run_s.map(seconds_to_std_duration);

        info!(
            "Starting navigation loop at {} Hz{}", 
            self.params.cycle_frequency_hz,
            match self.params.max_run_s {
                Some(t) => format!(" for {} s", t),
                None => String::new()
            }
        );

        let loop_start = Instant::now();
        let mut last_cycle_start = loop_start;
        let mut summary = RunSummary::default();

        while !shutdown.is_requested() {
            let cycle_start = Instant::now();

            if let Some(max_run) = max_run {
                if cycle_start - loop_start >= max_run {
                    info!("Maximum run time reached");
                    break
                }
            }

            let now_s = (cycle_start - loop_start).as_secs_f64();
            let dt_s = (cycle_start - last_cycle_start).as_secs_f64();
            last_cycle_start = cycle_start;

            self.cycle(now_s, dt_s);
            summary.num_cycles += 1;

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start;

            match period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => {
                    warn!(
                        "Cycle overran by {:.06} s", 
                        cycle_dur.as_secs_f64() - period.as_secs_f64()
                    );
                    summary.num_overruns += 1;
                }
            }
        }

        summary.duration_s = loop_start.elapsed().as_secs_f64();

        info!(
            "Navigation loop stopped after {} cycles ({} overruns) in {:.3} s", 
            summary.num_cycles,
            summary.num_overruns,
            summary.duration_s
        );

        summary
    }

    /// Close the loop's outputs, dropping the command socket and flushing the archive.
    pub fn close(mut self) {
        self.cmd_client = None;

        if let Some(mut archiver) = self.archiver.take() {
            if let Err(e) = archiver.flush() {
                warn!("Could not flush the cycle archive: {}", e);
            }
        }
    }
}

impl Archived for NavLoop {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let report = match self.last_report {
            Some(r) => r,
            None => return Ok(())
        };

        match self.archiver {
            Some(ref mut a) => a.serialise(CycleRecord::new(self.num_cycles, &report)),
            None => Err(ArchiveError::NotInit)
        }
    }
}

impl CycleRecord {
    fn new(cycle: u64, r: &CycleReport) -> Self {
        Self {
            cycle,
            obs_time_s: r.obs.timestamp_s,
            obs_fresh: r.fresh,
            obs_detected: r.obs.detected,
            obs_confidence: r.obs.confidence,
            obs_cx: r.obs.cx,
            obs_cy: r.obs.cy,
            obs_size: r.obs.size,
            obs_sender_time_s: r.sender_time_s,
            state_valid: r.state.valid,
            state_cx: r.state.cx,
            state_cy: r.state.cy,
            state_size: r.state.size,
            state_vx: r.state.vx,
            state_vy: r.state.vy,
            state_vsize: r.state.vsize,
            state_age_s: r.state.age_s,
            cmd_mode: r.cmd.mode,
            cmd_yaw: r.cmd.yaw,
            cmd_vertical: r.cmd.vertical,
            cmd_forward: r.cmd.forward,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn trace_cycle(r: &CycleReport) {
    debug!(
        "{:8.3} mode={:<12} obs(cx={:+.3} cy={:+.3} size={:.3} det={} conf={:.2}) \
        state(cx={:+.3} cy={:+.3} age={:.2} valid={}) \
        cmd(yaw={:+.3} vert={:+.3} fwd={:+.3})",
        r.cmd.timestamp_s,
        r.cmd.mode.as_str(),
        r.obs.cx,
        r.obs.cy,
        r.obs.size,
        r.obs.detected,
        r.obs.confidence,
        r.state.cx,
        r.state.cy,
        r.state.age_s,
        r.state.valid,
        r.cmd.yaw,
        r.cmd.vertical,
        r.cmd.forward
    );
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
