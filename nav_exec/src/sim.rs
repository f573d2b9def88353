//! # Simulated rover
//!
//! A differential drive vehicle simulated on the sphere, used to run missions without hardware.
//! Wheel demands received through [`SimDrive`] are converted to wheel speeds and integrated over
//! each step, the resulting true position is published into a [`SharedFix`] which the runner
//! reads as its position source.
//!
//! The published fix is jittered with smooth Perlin noise so that a stationary rover still
//! produces distinct readings, as a real receiver does.
//!
//! The simulation can be stepped manually with [`SimRover::step`] or from a background thread
//! started with [`SimRover::start`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use noise::{NoiseFn, Perlin, Seedable};
use serde::Deserialize;
use std::{
    f64::consts::FRAC_PI_2,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::eqpt::drive::WheelDems;
use util::maths::lin_map;

use crate::{
    angle,
    eqpt::{CommandSink, SharedFix, SinkError},
    geo::GeoPosition,
    nav_ctrl::MAX_SPEED_PWM,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the simulated rover.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Starting latitude.
    ///
    /// Units: degrees
    pub start_lat_deg: f64,

    /// Starting longitude.
    ///
    /// Units: degrees
    pub start_lon_deg: f64,

    /// Starting compass heading, clockwise from north.
    ///
    /// Units: degrees
    pub start_heading_deg: f64,

    /// Wheel ground speed at the maximum PWM demand.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Distance between the wheels.
    ///
    /// Units: meters
    pub wheel_track_m: f64,

    /// Real time between background steps.
    ///
    /// Units: seconds
    pub step_period_s: f64,

    /// Simulated seconds per real second in the background thread.
    pub time_scale: f64,

    /// Amplitude of the jitter added to the published fix, zero to disable.
    ///
    /// Units: meters
    pub fix_noise_m: f64,

    /// Rate at which the jitter changes.
    ///
    /// Units: 1/seconds
    pub fix_noise_rate: f64,

    /// Seed of the jitter generator.
    pub fix_noise_seed: u32,
}

/// The simulated vehicle.
pub struct SimRover {
    state: Arc<Mutex<SimState>>,
    fix: SharedFix,
    bg_run: Arc<AtomicBool>,
    bg_jh: Option<JoinHandle<()>>,
}

/// Command sink feeding wheel demands into a [`SimRover`].
#[derive(Clone)]
pub struct SimDrive {
    state: Arc<Mutex<SimState>>,
}

struct SimState {
    params: SimParams,
    position: GeoPosition,
    heading_rad: f64,
    dems: WheelDems,
    odometer_m: f64,
    sim_time_s: f64,
    closed: bool,
    perlin: Perlin,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            start_lat_deg: 50.0,
            start_lon_deg: 20.0,
            start_heading_deg: 0.0,
            max_speed_ms: 0.33,
            wheel_track_m: 0.15,
            step_period_s: 0.1,
            time_scale: 1.0,
            fix_noise_m: 0.3,
            fix_noise_rate: 0.37,
            fix_noise_seed: 0,
        }
    }
}

impl SimRover {
    /// Create a stationary rover at the starting pose and publish its position.
    pub fn new(params: SimParams) -> Self {
        let position = GeoPosition::new(params.start_lat_deg, params.start_lon_deg);
        let fix = SharedFix::new();
        fix.publish(position);

        Self {
            state: Arc::new(Mutex::new(SimState {
                params,
                position,
                heading_rad: angle::denormalize_rad(params.start_heading_deg.to_radians()),
                dems: WheelDems::STOP,
                odometer_m: 0.0,
                sim_time_s: 0.0,
                closed: false,
                perlin: Perlin::new().set_seed(params.fix_noise_seed),
            })),
            fix,
            bg_run: Arc::new(AtomicBool::new(false)),
            bg_jh: None,
        }
    }

    /// The sink through which the rover is driven.
    pub fn drive(&self) -> SimDrive {
        SimDrive {
            state: self.state.clone(),
        }
    }

    /// The cell the rover's position is published into.
    pub fn fix(&self) -> SharedFix {
        self.fix.clone()
    }

    /// Advance the simulation by `dt_s` simulated seconds using the last wheel demands.
    pub fn step(&self, dt_s: f64) {
        step_state(&mut lock_state(&self.state), &self.fix, dt_s);
    }

    /// Step the simulation from a background thread until stopped or dropped.
    pub fn start(&mut self) {
        if self.bg_jh.is_some() {
            warn!("SimRover already started");
            return;
        }

        let params = lock_state(&self.state).params;
        let period = match Duration::try_from_secs_f64(params.step_period_s.max(1e-3)) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    "SimRover not started, invalid step period {} s: {}",
                    params.step_period_s, e
                );
                return;
            }
        };
        let dt_s = period.as_secs_f64() * params.time_scale;

        let state = self.state.clone();
        let fix = self.fix.clone();
        let bg_run = self.bg_run.clone();
        bg_run.store(true, Ordering::SeqCst);

        self.bg_jh = Some(thread::spawn(move || {
            while bg_run.load(Ordering::SeqCst) {
                thread::sleep(period);
                step_state(&mut lock_state(&state), &fix, dt_s);
            }
        }));
    }

    /// Stop the background thread, if running.
    pub fn stop(&mut self) {
        self.bg_run.store(false, Ordering::SeqCst);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                warn!("SimRover background thread panicked");
            }
        }
    }

    /// True position of the rover.
    pub fn position(&self) -> GeoPosition {
        lock_state(&self.state).position
    }

    /// True compass heading in [0, 2pi).
    pub fn heading(&self) -> f64 {
        lock_state(&self.state).heading_rad
    }

    /// Total distance driven.
    ///
    /// Units: meters
    pub fn odometer(&self) -> f64 {
        lock_state(&self.state).odometer_m
    }
}

impl Drop for SimRover {
    fn drop(&mut self) {
        self.stop();
    }
}

impl CommandSink for SimDrive {
    fn send(&mut self, cmd: &str) -> Result<(), SinkError> {
        let mut state = lock_state(&self.state);

        if state.closed {
            return Err(SinkError::Closed);
        }

        state.dems = cmd
            .parse()
            .map_err(|_| SinkError::InvalidCommand(cmd.to_string()))?;

        Ok(())
    }

    fn close(&mut self) {
        let mut state = lock_state(&self.state);
        state.dems = WheelDems::STOP;
        state.closed = true;
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn lock_state(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Integrate the differential drive kinematics over one step.
fn step_state(state: &mut SimState, fix: &SharedFix, dt_s: f64) {
    let max_speed_ms = state.params.max_speed_ms;
    let to_speed = |pwm: i32| lin_map((0.0, MAX_SPEED_PWM), (0.0, max_speed_ms), pwm as f64);

    let left_ms = to_speed(state.dems.left_pwm);
    let right_ms = to_speed(state.dems.right_pwm);

    // Compass headings grow clockwise, a faster right wheel turns the rover anticlockwise
    let rate_rads = (right_ms - left_ms) / state.params.wheel_track_m;
    let mid_heading = state.heading_rad - rate_rads * dt_s / 2.0;
    let dist_m = (left_ms + right_ms) / 2.0 * dt_s;

    if dist_m != 0.0 {
        state.position = state.position.destination_point(mid_heading, dist_m);
    }
    state.heading_rad = angle::denormalize_rad(state.heading_rad - rate_rads * dt_s);
    state.odometer_m += dist_m.abs();
    state.sim_time_s += dt_s;

    debug!(
        "SimRover at {} heading {:.1} deg",
        state.position,
        state.heading_rad.to_degrees()
    );

    fix.publish(measured_fix(state));
}

/// The true position with the receiver jitter applied.
fn measured_fix(state: &SimState) -> GeoPosition {
    let noise_m = state.params.fix_noise_m;
    if noise_m == 0.0 {
        return state.position;
    }

    let t = state.sim_time_s * state.params.fix_noise_rate;
    let north_m = noise_m * state.perlin.get([t, 0.5]);
    let east_m = noise_m * state.perlin.get([t, 7.5]);

    state
        .position
        .destination_point(0.0, north_m)
        .destination_point(FRAC_PI_2, east_m)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        eqpt::PositionSource,
        nav_ctrl::{InputData, NavCtrl, NavMode},
    };
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;
    use util::module::State;

    fn noiseless() -> SimParams {
        SimParams {
            fix_noise_m: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_straight_line() {
        let sim = SimRover::new(noiseless());
        let mut drive = sim.drive();

        drive.send("255|255").unwrap();
        for _ in 0..10 {
            sim.step(1.0);
        }

        let start = GeoPosition::new(50.0, 20.0);
        let end = sim.fix().latest_fix();

        assert_abs_diff_eq!(start.distance_to(&end), 3.3, epsilon = 1e-6);
        assert_abs_diff_eq!(start.bearing_to(&end), 0.0, epsilon = 1e-6);
        assert_eq!(sim.heading(), 0.0);
        assert_abs_diff_eq!(sim.odometer(), 3.3, epsilon = 1e-9);
    }

    #[test]
    fn test_turn_directions() {
        let sim = SimRover::new(noiseless());
        let mut drive = sim.drive();

        // Faster right wheel turns left (anticlockwise)
        drive.send("177|255").unwrap();
        sim.step(0.1);
        assert!(sim.heading() > 1.5 * PI);

        // Spin on the spot to the right
        let sim = SimRover::new(noiseless());
        let mut drive = sim.drive();
        drive.send("255|-255").unwrap();
        sim.step(0.1);

        // 0.66 m/s wheel difference over 0.15 m
        assert_abs_diff_eq!(sim.heading(), 0.44, epsilon = 1e-9);
        assert_eq!(sim.position(), GeoPosition::new(50.0, 20.0));
    }

    #[test]
    fn test_closed_drive() {
        let sim = SimRover::new(SimParams::default());
        let mut drive = sim.drive();

        assert!(matches!(drive.send("fast"), Err(SinkError::InvalidCommand(_))));

        drive.send("255|255").unwrap();
        drive.close();
        assert!(matches!(drive.send("255|255"), Err(SinkError::Closed)));

        // Closing stops the wheels
        sim.step(1.0);
        assert_eq!(sim.position(), GeoPosition::new(50.0, 20.0));
    }

    #[test]
    fn test_background_steps() {
        let mut sim = SimRover::new(SimParams {
            step_period_s: 0.001,
            ..noiseless()
        });
        let mut drive = sim.drive();
        drive.send("255|255").unwrap();

        sim.start();
        thread::sleep(Duration::from_millis(50));
        sim.stop();

        assert!(sim.odometer() > 0.0);
        assert_eq!(sim.fix().latest_fix(), sim.position());
    }

    #[test]
    fn test_start_rejects_huge_step_period() {
        let mut sim = SimRover::new(SimParams {
            step_period_s: 1e20,
            ..noiseless()
        });

        sim.start();
        assert!(sim.bg_jh.is_none());
        assert!(!sim.bg_run.load(Ordering::SeqCst));

        // Manual stepping still works
        sim.drive().send("255|255").unwrap();
        sim.step(1.0);
        assert_abs_diff_eq!(sim.odometer(), 0.33, epsilon = 1e-9);
    }

    #[test]
    fn test_mission() {
        let sim = SimRover::new(SimParams::default());
        let source = sim.fix();
        let mut drive = sim.drive();
        let mut ctrl = NavCtrl::default();

        let targets = [
            GeoPosition::new(50.0002, 20.0001),
            GeoPosition::new(50.0002, 19.9997),
            GeoPosition::new(49.9999, 19.9999),
        ];
        for t in targets.iter() {
            ctrl.add_target(*t);
        }

        drive.send(&ctrl.send_commands().to_string()).unwrap();

        let mut reached = Vec::new();

        for _ in 0..600 {
            sim.step(1.0);

            let target = ctrl.current_target().copied();
            let (output, report) = ctrl
                .proc(&InputData {
                    raw_fix: source.latest_fix(),
                })
                .unwrap();

            if report.mode == NavMode::Reached {
                if let Some(t) = target {
                    assert!(sim.position().distance_to(&t) < 5.0);
                    reached.push(t);
                }
            }

            if let Some(dems) = output {
                drive.send(&dems.to_string()).unwrap();
            }

            if reached.len() == targets.len() {
                break;
            }
        }

        assert_eq!(reached, targets.to_vec());
        assert_eq!(ctrl.mode(), NavMode::Reached);
        assert!(ctrl.targets().is_empty());
    }
}
