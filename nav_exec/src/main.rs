//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The executable consists of:
//!
//!     - Initialisation:
//!         - Session and logging
//!         - Parameter loading, command line overrides and validation
//!         - Observation client (background receive thread)
//!         - Command client
//!         - SIGINT/SIGTERM handler requesting shutdown
//!     - Main loop, see `nav_lib::nav_loop`:
//!         - Observation acquisition
//!         - Anchor tracking
//!         - Navigation control
//!         - Command output
//!     - Shutdown:
//!         - Observation client stopped
//!         - Command socket closed and archives flushed
//!         - Session save thread drained

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::WrapErr};
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use comms_if::{eqpt::fc::Mode, net::NetParams};
use nav_lib::{
    cmd_client::CmdClient,
    nav_ctrl::{DroneController, NavCtrlParams},
    nav_loop::{NavLoop, Shutdown},
    obs_client::ObsClient,
    params::NavExecParams,
    tracker::{AnchorTracker, TrackerParams},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Anchor navigation executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec")]
struct Cli {
    /// Directory containing the parameter files, defaults to `params` in the software root.
    #[structopt(long, parse(from_os_str))]
    params_dir: Option<PathBuf>,

    /// Endpoint on which observations are received, overrides `net.toml`.
    #[structopt(long)]
    obs_endpoint: Option<String>,

    /// Endpoint to which commands are sent, overrides `net.toml`. An empty string disables output.
    #[structopt(long)]
    cmd_endpoint: Option<String>,

    /// Force a navigation mode, e.g. `FLY_STRAIGHT`.
    #[structopt(long)]
    mode_override: Option<Mode>,

    /// Stop after this many seconds.
    #[structopt(long)]
    max_run_s: Option<f64>,
}

/// The full parameter set in use, saved into the session.
#[derive(Serialize)]
struct EffectiveParams {
    exec: NavExecParams,
    net: NetParams,
    tracker: TrackerParams,
    nav_ctrl: NavCtrlParams,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let cli = Cli::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "nav_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger, the file also gets the per-cycle trace
    logger_init(LevelFilter::Info, LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Anchor Navigation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut net_params: NetParams = load_params(&cli, "net.toml")
        .wrap_err("Could not load net params")?;
    let mut exec_params: NavExecParams = load_params(&cli, "nav_exec.toml")
        .wrap_err("Could not load exec params")?;
    let tracker_params: TrackerParams = load_params(&cli, "tracker.toml")
        .wrap_err("Could not load tracker params")?;
    let mut ctrl_params: NavCtrlParams = load_params(&cli, "nav_ctrl.toml")
        .wrap_err("Could not load nav_ctrl params")?;

    // Command line overrides
    if let Some(ref e) = cli.obs_endpoint {
        net_params.obs_endpoint = e.clone();
    }
    if let Some(ref e) = cli.cmd_endpoint {
        net_params.cmd_endpoint = e.clone();
    }
    if cli.mode_override.is_some() {
        ctrl_params.mode_override = cli.mode_override;
    }
    if cli.max_run_s.is_some() {
        exec_params.max_run_s = cli.max_run_s;
    }

    exec_params.validate(&net_params)
        .wrap_err("Invalid exec params")?;
    tracker_params.validate()
        .wrap_err("Invalid tracker params")?;
    ctrl_params.validate()
        .wrap_err("Invalid nav_ctrl params")?;

    info!("Parameters loaded");
    info!("    Cycle frequency: {} Hz", exec_params.cycle_frequency_hz);
    info!("    Observation endpoint: {}", net_params.obs_endpoint);
    let cmd_endpoint = match net_params.cmd_endpoint.as_str() {
        "" => "disabled",
        e => e
    };
    info!("    Command endpoint: {}", cmd_endpoint);
    if let Some(m) = ctrl_params.mode_override {
        info!("    Mode override: {}", m);
    }

    session.save("params.json", EffectiveParams {
        exec: exec_params.clone(),
        net: net_params.clone(),
        tracker: tracker_params,
        nav_ctrl: ctrl_params.clone(),
    });

    // ---- INITIALISE CLIENTS ----

    let shutdown = Shutdown::new();
    shutdown.request_on_signal()
        .wrap_err("Failed to install the shutdown signal handler")?;

    let mut obs_client = ObsClient::start(&net_params, &shutdown)
        .wrap_err("Failed to initialise the ObsClient")?;

    let mut nav_loop = NavLoop::new(
        exec_params.clone(),
        obs_client.mailbox(),
        AnchorTracker::new(tracker_params),
        DroneController::new(ctrl_params)
    );

    if !net_params.cmd_endpoint.is_empty() {
        nav_loop = nav_loop.with_cmd_client(
            CmdClient::new(&net_params.cmd_endpoint)
                .wrap_err("Failed to initialise the CmdClient")?
        );
    }
    else {
        info!("Command output disabled");
    }

    if exec_params.archive.enabled {
        nav_loop = nav_loop.with_archiver(
            Archiver::from_path(&session, "nav_loop.csv")
                .wrap_err("Failed to create the cycle archive")?
        );
    }

    // ---- MAIN LOOP ----

    nav_loop.run(&shutdown);

    // ---- SHUTDOWN ----

    obs_client.stop();
    nav_loop.close();
    session.exit();

    info!("End of execution");

    Ok(())
}

/// Load a parameter file from the command line directory, or the default one.
fn load_params<P>(cli: &Cli, file: &str) -> Result<P, util::params::LoadError>
where
    P: serde::de::DeserializeOwned
{
    match cli.params_dir {
        Some(ref dir) => util::params::load_from_dir(dir, file),
        None => util::params::load(file)
    }
}
