//! # Navigation runner
//!
//! Runs navigation control as a fixed rate cyclic task on its own thread. Each cycle the runner:
//!
//! - waits for the cycle deadline, applying any telecommands as soon as they arrive,
//! - reads the latest fix from the position source,
//! - processes NavCtrl and sends any resulting command to the command sink,
//! - publishes a [`NavStatus`] snapshot and notifies the diagnostics sinks.
//!
//! Other threads talk to the runner through a [`NavHandle`]. Cancellation is cooperative, the
//! interrupt flag is checked once per cycle and the vehicle is always stopped before `run`
//! returns.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex, MutexGuard,
    },
    thread,
    time::{Duration, Instant},
};
use thiserror::Error;

use comms_if::{eqpt::drive::WheelDems, tc::nav::NavTc};
use util::module::State;

use crate::{
    diag::{Diagnostics, NavEvent},
    eqpt::{CommandSink, PositionSource},
    geo::GeoPosition,
    nav_ctrl::{InputData, NavCtrl, NavCtrlError, NavMode},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Owns navigation control and its collaborators while the control loop runs.
pub struct NavRunner {
    ctrl: NavCtrl,
    source: Box<dyn PositionSource + Send>,
    sink: Box<dyn CommandSink + Send>,
    diags: Vec<Box<dyn Diagnostics + Send>>,

    cycle_period: Duration,

    tc_rx: Receiver<NavTc>,
    interrupt: Arc<AtomicBool>,
    status: Arc<Mutex<NavStatus>>,
}

/// Cloneable handle used by other threads to command a running [`NavRunner`].
#[derive(Clone)]
pub struct NavHandle {
    tc_tx: Sender<NavTc>,
    interrupt: Arc<AtomicBool>,
    status: Arc<Mutex<NavStatus>>,
}

/// Snapshot of the runner published after every cycle and telecommand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NavStatus {
    pub running: bool,
    pub mode: NavMode,
    pub current: Option<GeoPosition>,
    pub current_target: Option<GeoPosition>,
    pub num_queued_targets: usize,
    pub num_cycles: u64,
    pub speed_pwm: f64,
    pub last_cmd: Option<WheelDems>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("The cycle period must be positive and finite, found {0} s")]
    InvalidCyclePeriod(f64),

    #[error("The runner is no longer accepting telecommands")]
    NotRunning,

    #[error("NavCtrl processing failed: {0}")]
    NavCtrlError(NavCtrlError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavRunner {
    /// Create a new runner and the handle used to command it.
    pub fn new(
        ctrl: NavCtrl,
        source: Box<dyn PositionSource + Send>,
        sink: Box<dyn CommandSink + Send>,
        cycle_period_s: f64,
    ) -> Result<(Self, NavHandle), RunnerError> {
        if !(cycle_period_s > 0.0) {
            return Err(RunnerError::InvalidCyclePeriod(cycle_period_s));
        }

        let cycle_period = Duration::try_from_secs_f64(cycle_period_s)
            .map_err(|_| RunnerError::InvalidCyclePeriod(cycle_period_s))?;

        let (tc_tx, tc_rx) = mpsc::channel();
        let interrupt = Arc::new(AtomicBool::new(false));
        let status = Arc::new(Mutex::new(NavStatus::default()));

        let runner = Self {
            ctrl,
            source,
            sink,
            diags: Vec::new(),
            cycle_period,
            tc_rx,
            interrupt: interrupt.clone(),
            status: status.clone(),
        };

        let handle = NavHandle {
            tc_tx,
            interrupt,
            status,
        };

        Ok((runner, handle))
    }

    /// Add a diagnostics sink which will be notified of every event.
    pub fn add_diagnostics(&mut self, diag: Box<dyn Diagnostics + Send>) {
        self.diags.push(diag);
    }

    /// Run the control loop until interrupted.
    ///
    /// The vehicle is stopped and the sink closed before returning, whatever the outcome. On
    /// success navigation control is handed back so its final state can be inspected.
    pub fn run(mut self) -> Result<NavCtrl, RunnerError> {
        info!(
            "Starting navigation loop with a {:.2} s cycle",
            self.cycle_period.as_secs_f64()
        );

        let initial = self.ctrl.send_commands();
        self.dispatch(initial);
        self.publish_status(true, Some(initial));

        let mut next_cycle = Instant::now() + self.cycle_period;

        let result = loop {
            if self.interrupt.load(Ordering::SeqCst) {
                info!("Navigation loop interrupted");
                break Ok(());
            }

            self.wait_until(next_cycle);

            let input = InputData {
                raw_fix: self.source.latest_fix(),
            };

            let (output, report) = match self.ctrl.proc(&input) {
                Ok(o) => o,
                Err(e) => {
                    error!("Error during NavCtrl processing: {}", e);
                    break Err(RunnerError::NavCtrlError(e));
                }
            };

            if let Some(dems) = output {
                self.dispatch(dems);
            }

            self.publish_status(true, output);
            self.notify(&NavEvent::Cycle(report));

            // Schedule the next cycle, skipping any that were missed
            next_cycle += self.cycle_period;
            let now = Instant::now();
            if next_cycle < now {
                warn!(
                    "Cycle overran by {:.06} s",
                    (now - next_cycle).as_secs_f64()
                );
                next_cycle = now + self.cycle_period;
            }
        };

        self.stop();

        result.map(|_| self.ctrl)
    }

    /// Block until `deadline`, processing telecommands as they arrive.
    fn wait_until(&mut self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return;
            }

            match self.tc_rx.recv_timeout(deadline - now) {
                Ok(tc) => self.handle_tc(tc),
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    thread::sleep(deadline - now);
                    return;
                }
            }
        }
    }

    fn handle_tc(&mut self, tc: NavTc) {
        let mut output = None;

        match tc {
            NavTc::AddTarget { lat_deg, lon_deg } => {
                let target = GeoPosition::new(lat_deg, lon_deg);
                self.ctrl.add_target(target);
                self.notify(&NavEvent::TargetAdded(target));
            }
            NavTc::ClearTargets => {
                let dems = self.ctrl.clear_targets();
                self.notify(&NavEvent::TargetsCleared);
                self.dispatch(dems);
                output = Some(dems);
            }
            NavTc::SetSpeed { pwm } => {
                let speed = self.ctrl.set_speed(pwm);
                self.notify(&NavEvent::SpeedSet(speed));
            }
        }

        self.publish_status(true, output);
    }

    /// Send demands to the sink, dropping them if the transport fails.
    fn dispatch(&mut self, dems: WheelDems) {
        match self.sink.send(&dems.to_string()) {
            Ok(()) => self.notify(&NavEvent::CommandSent(dems)),
            Err(e) => {
                warn!("Failed to send {} to the drive: {}", dems, e);
                self.notify(&NavEvent::CommandFailed {
                    dems,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Stop the vehicle and release the sink.
    fn stop(&mut self) {
        info!("Stopping the vehicle");

        self.dispatch(WheelDems::STOP);
        self.sink.close();

        self.publish_status(false, Some(WheelDems::STOP));
        self.notify(&NavEvent::Stopped);
    }

    fn notify(&mut self, event: &NavEvent) {
        for d in self.diags.iter_mut() {
            d.on_event(event);
        }
    }

    fn publish_status(&self, running: bool, last_cmd: Option<WheelDems>) {
        let mut status = lock_status(&self.status);

        *status = NavStatus {
            running,
            mode: self.ctrl.mode(),
            current: self.ctrl.current().copied(),
            current_target: self.ctrl.current_target().copied(),
            num_queued_targets: self.ctrl.targets().len(),
            num_cycles: self.ctrl.num_cycles(),
            speed_pwm: self.ctrl.speed(),
            last_cmd: last_cmd.or(status.last_cmd),
        };
    }
}

impl NavHandle {
    /// Send a telecommand to the runner.
    pub fn send_tc(&self, tc: NavTc) -> Result<(), RunnerError> {
        self.tc_tx.send(tc).map_err(|_| RunnerError::NotRunning)
    }

    pub fn add_target(&self, lat_deg: f64, lon_deg: f64) -> Result<(), RunnerError> {
        self.send_tc(NavTc::AddTarget { lat_deg, lon_deg })
    }

    pub fn clear_targets(&self) -> Result<(), RunnerError> {
        self.send_tc(NavTc::ClearTargets)
    }

    pub fn set_speed(&self, pwm: f64) -> Result<(), RunnerError> {
        self.send_tc(NavTc::SetSpeed { pwm })
    }

    /// Request the control loop to stop at the next cycle boundary.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
    }

    /// Latest published status.
    pub fn status(&self) -> NavStatus {
        *lock_status(&self.status)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn lock_status(status: &Mutex<NavStatus>) -> MutexGuard<'_, NavStatus> {
    status.lock().unwrap_or_else(|e| e.into_inner())
}
