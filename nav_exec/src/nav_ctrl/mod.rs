//! # Navigation control module
//!
//! Waypoint following for the differential drive rover. Each cycle the latest raw fix is passed
//! through the position filter, the current and previous position estimates are updated and a
//! wheel demand is synthesised from the bearing between them (the heading) and the bearing to
//! the current target.
//!
//! The steering law computes a turn radius from the heading error,
//! `r = min(600 / |delta_deg| + 35, 500000)` in centimeters, and slows the inner wheel by the ratio
//! `(r - track / 2) / (r + track / 2)` while the outer wheel runs at the ceiling speed.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest ceiling speed that can be set.
pub const MIN_SPEED_PWM: f64 = 160.0;

/// Highest ceiling speed that can be set, also the largest value the drive electronics accept.
pub const MAX_SPEED_PWM: f64 = 255.0;

/// Gain of the turn radius heuristic.
///
/// Units: centimeter degrees
pub const TURN_RADIUS_GAIN: f64 = 600.0;

/// Offset added to every turn radius.
///
/// Units: centimeters
pub const TURN_RADIUS_OFFSET_CM: f64 = 35.0;

/// Largest turn radius, used for (nearly) straight driving.
///
/// Units: centimeters
pub const MAX_TURN_RADIUS_CM: f64 = 500_000.0;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Possible errors that can occur during NavCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Could not load the NavCtrl parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid NavCtrl parameters: {0}")]
    InvalidParams(ParamsError),
}

/// The navigation mode, derived from which parts of the state are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavMode {
    /// No current target.
    Idle,

    /// A target is set but there is no previous position yet, so no heading is known.
    Aligning,

    /// A target, the current and previous positions are set.
    Steering,

    /// The target was reached during this cycle.
    Reached,
}

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Idle
    }
}
