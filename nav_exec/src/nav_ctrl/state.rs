//! Implementations for the NavCtrl state structure

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;
use std::collections::VecDeque;

// Internal
use super::{
    NavCtrlError, NavMode, Params, MAX_SPEED_PWM, MAX_TURN_RADIUS_CM, MIN_SPEED_PWM,
    TURN_RADIUS_GAIN, TURN_RADIUS_OFFSET_CM,
};
use crate::{
    angle,
    geo::GeoPosition,
    pos_filter::{FilterOutcome, FilterVerdict, PosFilter},
};
use comms_if::eqpt::drive::WheelDems;
use util::{maths::clamp, module::State, params, session::Session};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Navigation control module state
#[derive(Debug, Clone)]
pub struct NavCtrl {
    pub(crate) params: Params,

    pub(crate) filter: PosFilter,

    pub(crate) previous: Option<GeoPosition>,
    pub(crate) current: Option<GeoPosition>,
    pub(crate) current_target: Option<GeoPosition>,

    pub(crate) targets: VecDeque<GeoPosition>,

    /// Ceiling wheel speed
    pub(crate) speed_pwm: f64,

    pub(crate) heading_rad: Option<f64>,
    pub(crate) desired_angle_rad: Option<f64>,

    /// Set when the target was reached during this cycle
    reached: bool,

    /// Number of calls to `proc`
    pub(crate) num_cycles: u64,
}

/// Input data to navigation control.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputData {
    /// Latest raw fix from the position source.
    pub raw_fix: GeoPosition,
}

/// Status report for NavCtrl processing.
///
/// Kept flat so it can be archived as a CSV row.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    pub cycle: u64,
    pub mode: NavMode,
    pub verdict: Option<FilterVerdict>,
    pub current_lat_deg: Option<f64>,
    pub current_lon_deg: Option<f64>,
    pub target_lat_deg: Option<f64>,
    pub target_lon_deg: Option<f64>,
    pub target_dist_m: Option<f64>,
    pub heading_deg: Option<f64>,
    pub desired_angle_deg: Option<f64>,
    pub num_queued_targets: usize,
    pub speed_pwm: f64,
    pub left_pwm: Option<i32>,
    pub right_pwm: Option<i32>,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl Default for NavCtrl {
    fn default() -> Self {
        Self::from_valid_params(Params::default())
    }
}

impl State for NavCtrl {
    type InitData = &'static str;
    type InitError = NavCtrlError;

    type InputData = InputData;
    type OutputData = Option<WheelDems>;
    type StatusReport = StatusReport;
    type ProcError = NavCtrlError;

    /// Initialise the NavCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, _session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data).map_err(NavCtrlError::ParamLoadError)?;

        *self = Self::new(params)?;

        Ok(())
    }

    /// Perform one control cycle.
    ///
    /// The output is `None` when the cycle produces no command, which happens when the fix is
    /// rejected for any reason other than being distant while a target is active.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        self.num_cycles += 1;
        self.reached = false;

        let outcome = self.filter.ingest(input_data.raw_fix, self.current.as_ref());

        let output = match outcome {
            FilterOutcome::Accepted(smoothed) => {
                self.previous = self.current;
                self.current = Some(smoothed);
                Some(self.send_commands())
            }
            // Sensor outage, keep driving
            FilterOutcome::RejectedDistant if self.current_target.is_some() => {
                Some(self.drive_straight())
            }
            _ => None,
        };

        Ok((output, self.status_report(Some(outcome.verdict()), output)))
    }
}

impl NavCtrl {
    /// Create a new controller from the given parameters.
    pub fn new(params: Params) -> Result<Self, NavCtrlError> {
        params.are_valid().map_err(NavCtrlError::InvalidParams)?;

        Ok(Self::from_valid_params(params))
    }

    fn from_valid_params(params: Params) -> Self {
        Self {
            params,
            filter: PosFilter::new(params.filter),
            previous: None,
            current: None,
            current_target: None,
            targets: VecDeque::new(),
            speed_pwm: clamp(&params.speed_pwm, &MIN_SPEED_PWM, &MAX_SPEED_PWM),
            heading_rad: None,
            desired_angle_rad: None,
            reached: false,
            num_cycles: 0,
        }
    }

    /// Synthesise the wheel demands for the current state.
    ///
    /// The vehicle is stopped whenever the state is not sufficient to steer: no target, no current
    /// position, or the target has just been reached.
    pub fn send_commands(&mut self) -> WheelDems {
        self.reached = false;

        let target = match self.current_target {
            Some(t) => t,
            None => {
                self.next_target();
                return self.emit(WheelDems::STOP);
            }
        };

        let current = match self.current {
            Some(c) => c,
            None => return self.emit(WheelDems::STOP),
        };

        if current.proximity_eq(&target) {
            info!("Reached target {}", target);
            self.reached = true;
            self.current_target = None;
            self.desired_angle_rad = None;
            self.previous = None;
            self.next_target();
            return self.emit(WheelDems::STOP);
        }

        let previous = match self.previous {
            Some(p) => p,
            None => return self.emit(self.drive_straight()),
        };

        let heading = angle::denormalize_rad(previous.bearing_to(&current));
        let desired = angle::denormalize_rad(current.bearing_to(&target));
        let delta = angle::shortest_delta(heading, desired);

        self.heading_rad = Some(heading);
        self.desired_angle_rad = Some(desired);

        debug!(
            "Heading {:.2} deg, desired {:.2} deg, delta {:.2} deg, {:.2} m to target",
            heading.to_degrees(),
            desired.to_degrees(),
            delta.to_degrees(),
            current.distance_to(&target)
        );

        self.emit(self.steer(delta))
    }

    /// Append a target to the end of the queue.
    pub fn add_target(&mut self, target: GeoPosition) {
        info!("Adding target {}", target);
        self.targets.push_back(target);
    }

    /// Drop every target and reset the steering state, returning the stop command which must be
    /// sent immediately.
    pub fn clear_targets(&mut self) -> WheelDems {
        info!("Clearing {} queued targets", self.targets.len());
        self.targets.clear();
        self.current_target = None;
        self.desired_angle_rad = None;
        self.previous = None;
        self.reached = false;

        self.emit(WheelDems::STOP)
    }

    /// Set the ceiling speed, clamped into the supported range. Returns the speed actually set.
    ///
    /// Non-finite speeds are ignored and the current speed is kept.
    pub fn set_speed(&mut self, speed_pwm: f64) -> f64 {
        if !speed_pwm.is_finite() {
            warn!("Ignoring non-finite speed {}, keeping {}", speed_pwm, self.speed_pwm);
            return self.speed_pwm;
        }

        self.speed_pwm = clamp(&speed_pwm, &MIN_SPEED_PWM, &MAX_SPEED_PWM);
        info!("Speed set to {}", self.speed_pwm);
        self.speed_pwm
    }

    /// Number of control cycles processed so far.
    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn speed(&self) -> f64 {
        self.speed_pwm
    }

    /// Last computed heading in [0, 2pi).
    pub fn heading(&self) -> Option<f64> {
        self.heading_rad
    }

    /// Last computed bearing to the target in [0, 2pi).
    pub fn desired_angle(&self) -> Option<f64> {
        self.desired_angle_rad
    }

    pub fn previous(&self) -> Option<&GeoPosition> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> Option<&GeoPosition> {
        self.current.as_ref()
    }

    pub fn current_target(&self) -> Option<&GeoPosition> {
        self.current_target.as_ref()
    }

    /// Targets waiting behind the current one.
    pub fn targets(&self) -> &VecDeque<GeoPosition> {
        &self.targets
    }

    pub fn mode(&self) -> NavMode {
        if self.reached {
            return NavMode::Reached;
        }

        match (self.current_target, self.previous) {
            (None, _) => NavMode::Idle,
            (Some(_), None) => NavMode::Aligning,
            (Some(_), Some(_)) => NavMode::Steering,
        }
    }

    /// Build a status report from the current state.
    pub fn status_report(
        &self,
        verdict: Option<FilterVerdict>,
        output: Option<WheelDems>,
    ) -> StatusReport {
        StatusReport {
            cycle: self.num_cycles,
            mode: self.mode(),
            verdict,
            current_lat_deg: self.current.map(|p| p.lat_deg),
            current_lon_deg: self.current.map(|p| p.lon_deg),
            target_lat_deg: self.current_target.map(|p| p.lat_deg),
            target_lon_deg: self.current_target.map(|p| p.lon_deg),
            target_dist_m: self
                .current
                .zip(self.current_target)
                .map(|(c, t)| c.distance_to(&t)),
            heading_deg: self.heading_rad.map(f64::to_degrees),
            desired_angle_deg: self.desired_angle_rad.map(f64::to_degrees),
            num_queued_targets: self.targets.len(),
            speed_pwm: self.speed_pwm,
            left_pwm: output.map(|o| o.left_pwm),
            right_pwm: output.map(|o| o.right_pwm),
        }
    }

    /// Both wheels at the ceiling speed.
    pub(crate) fn drive_straight(&self) -> WheelDems {
        WheelDems::straight(self.speed_pwm as i32)
    }

    /// Differential wheel demands for a heading error of `delta_rad`.
    ///
    /// Negative errors turn left, positive errors turn right. An error of exactly zero leaves both
    /// wheels at zero.
    fn steer(&self, delta_rad: f64) -> WheelDems {
        let radius_cm =
            (TURN_RADIUS_GAIN / delta_rad.abs().to_degrees() + TURN_RADIUS_OFFSET_CM).min(MAX_TURN_RADIUS_CM);
        let half_track_cm = self.params.wheel_track_cm / 2.0;
        let inner = self.speed_pwm * (radius_cm - half_track_cm) / (radius_cm + half_track_cm);

        let (left, right) = if delta_rad < 0.0 {
            (inner, self.speed_pwm)
        } else if delta_rad > 0.0 {
            (self.speed_pwm, inner)
        } else {
            (0.0, 0.0)
        };

        debug!("Turn radius {:.2} cm", radius_cm);

        WheelDems::new(left as i32, right as i32)
    }

    fn next_target(&mut self) {
        if let Some(t) = self.targets.pop_front() {
            info!("Next target {}", t);
            self.current_target = Some(t);
        }
    }

    fn emit(&self, dems: WheelDems) -> WheelDems {
        trace!("NavCtrl output: {}", dems);
        dems
    }
}
