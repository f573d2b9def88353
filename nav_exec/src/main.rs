//! Main navigation executable entry point.
//!
//! # Architecture
//!
//! The executable drives the simulated rover through a mission file:
//!
//!     - Initialise the session, logging and NavCtrl
//!     - Start the simulated rover in the background
//!     - Start the navigation runner on its own thread
//!     - Queue every waypoint of the mission
//!     - Wait until the queue is exhausted (or the mission times out)
//!     - Interrupt the runner, which stops the rover
//!
//! # Usage
//!
//! `GPS_NAV_SW_ROOT` must point at the software checkout so that `params/` can be found. With no
//! `--mission` argument `$GPS_NAV_SW_ROOT/missions/default.toml` is flown.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use chrono::Utc;
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{info, warn};
use serde::Deserialize;
use std::{path::PathBuf, thread, time::Duration};
use structopt::StructOpt;

// Internal
use nav_lib::{
    diag::{ArchiveDiagnostics, LogDiagnostics},
    nav_ctrl::{NavCtrl, NavMode},
    runner::NavRunner,
    sim::{SimParams, SimRover},
};
use util::{
    host,
    logger::{logger_init, parse_level, LevelFilter},
    module::State,
    session::Session,
    time::duration_to_seconds,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// How often the main thread checks on the runner.
const POLL_PERIOD_S: f64 = 0.25;

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "GPS waypoint navigation for a differential drive rover")]
struct Opts {
    /// Mission file listing the waypoints to visit
    #[structopt(short, long, parse(from_os_str))]
    mission: Option<PathBuf>,

    /// Minimum level of messages to log (info, debug or trace)
    #[structopt(short, long, default_value = "info", parse(try_from_str = parse_level))]
    log_level: LevelFilter,

    /// Override the speed ceiling from the NavCtrl parameters
    #[structopt(short, long)]
    speed: Option<f64>,
}

/// Parameters of the executable itself, loaded from `nav_exec.toml`.
#[derive(Debug, Deserialize)]
struct ExecParams {
    /// Target period of one navigation cycle
    cycle_period_s: f64,

    /// Archive every cycle's status report into the session
    archive: bool,

    /// Give up on the mission after this long
    max_mission_duration_s: f64,

    #[serde(default)]
    sim: SimParams,
}

#[derive(Debug, Deserialize)]
struct Mission {
    waypoints: Vec<Waypoint>,
}

#[derive(Debug, Deserialize)]
struct Waypoint {
    lat_deg: f64,
    lon_deg: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(opts.log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("GPS Navigation Executable\n");
    info!("Running on: {}", host::get_host_desc());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("nav_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    let mission_path = match opts.mission {
        Some(p) => p,
        None => {
            let mut p = host::get_sw_root()
                .wrap_err("GPS_NAV_SW_ROOT must be set to find the default mission")?;
            p.push("missions");
            p.push("default.toml");
            p
        }
    };

    let mission: Mission = util::params::load_path(&mission_path)
        .wrap_err_with(|| format!("Failed to load the mission from {:?}", mission_path))?;

    if mission.waypoints.is_empty() {
        return Err(eyre!("The mission in {:?} has no waypoints", mission_path));
    }

    info!(
        "Loaded mission with {} waypoints from {:?}",
        mission.waypoints.len(),
        mission_path
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut nav_ctrl = NavCtrl::default();
    nav_ctrl
        .init("nav_ctrl.toml", &session)
        .wrap_err("Failed to initialise NavCtrl")?;

    if let Some(speed) = opts.speed {
        let applied = nav_ctrl.set_speed(speed);
        info!("Speed ceiling overridden to {}", applied);
    }

    info!("NavCtrl init complete");

    let mut sim = SimRover::new(exec_params.sim);
    sim.start();
    info!("Simulated rover started at {}", sim.position());

    info!("Module initialisation complete\n");

    // ---- START THE RUNNER ----

    let (mut runner, handle) = NavRunner::new(
        nav_ctrl,
        Box::new(sim.fix()),
        Box::new(sim.drive()),
        exec_params.cycle_period_s,
    )
    .wrap_err("Failed to create the navigation runner")?;

    runner.add_diagnostics(Box::new(LogDiagnostics));
    if exec_params.archive {
        runner.add_diagnostics(Box::new(
            ArchiveDiagnostics::new(&session).wrap_err("Failed to open the status archive")?,
        ));
    }

    let runner_jh = thread::spawn(move || runner.run());

    for wp in mission.waypoints.iter() {
        handle
            .add_target(wp.lat_deg, wp.lon_deg)
            .wrap_err("Failed to queue a waypoint")?;
    }

    // ---- MONITOR THE MISSION ----

    let start = Utc::now();
    let mut completed = false;

    loop {
        thread::sleep(Duration::from_secs_f64(POLL_PERIOD_S));

        let status = handle.status();

        if !status.running && status.num_cycles > 0 {
            warn!("Navigation runner stopped unexpectedly");
            break;
        }

        // Idle with nothing queued once the runner has pulled targets means the mission is done
        if status.num_cycles > 0
            && status.mode == NavMode::Idle
            && status.current_target.is_none()
            && status.num_queued_targets == 0
        {
            completed = true;
            break;
        }

        let elapsed_s = duration_to_seconds(Utc::now() - start).unwrap_or(f64::INFINITY);
        if elapsed_s > exec_params.max_mission_duration_s {
            warn!(
                "Mission did not complete within {:.0} s, aborting",
                exec_params.max_mission_duration_s
            );
            break;
        }
    }

    // ---- SHUTDOWN ----

    handle.interrupt();

    let final_ctrl = match runner_jh.join() {
        Ok(r) => r.wrap_err("The navigation runner failed")?,
        Err(_) => return Err(eyre!("The navigation runner thread panicked")),
    };

    sim.stop();

    info!("Mission summary:");
    info!("    Completed: {}", completed);
    info!("    Cycles: {}", final_ctrl.num_cycles());
    info!("    Distance driven: {:.1} m", sim.odometer());
    info!("    Final position: {}", sim.position());
    info!("    Targets remaining: {}", final_ctrl.targets().len());

    if completed {
        Ok(())
    } else {
        Err(eyre!("Mission aborted before all waypoints were reached"))
    }
}
