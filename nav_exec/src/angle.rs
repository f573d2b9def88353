//! # Angle utilities
//!
//! Normalisation of angles into their canonical ranges. All functions are total for finite inputs
//! and terminate in constant time regardless of the magnitude of the input.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::{PI, TAU};

use util::maths::rem_euclid;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Map an angle into [0, 2pi).
pub fn denormalize_rad(angle_rad: f64) -> f64 {
    denormalize(angle_rad, TAU)
}

/// Map an angle into (-pi, pi].
///
/// Inputs already in range are returned unchanged.
pub fn normalize_rad(angle_rad: f64) -> f64 {
    normalize(angle_rad, TAU)
}

/// Map an angle into [0, 360).
pub fn denormalize_deg(angle_deg: f64) -> f64 {
    denormalize(angle_deg, 360.0)
}

/// Map an angle into (-180, 180].
pub fn normalize_deg(angle_deg: f64) -> f64 {
    normalize(angle_deg, 360.0)
}

/// Unit vector `(cos, sin)` pointing along the given angle.
pub fn to_unit_vector(angle_rad: f64) -> (f64, f64) {
    (angle_rad.cos(), angle_rad.sin())
}

/// Signed shortest rotation from `from_rad` to `to_rad`, in (-pi, pi].
///
/// Negative values are anticlockwise (a left turn for a compass heading), positive values are
/// clockwise.
pub fn shortest_delta(from_rad: f64, to_rad: f64) -> f64 {
    let delta = to_rad - from_rad;

    normalize_rad(delta.sin().atan2(delta.cos()))
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn denormalize(angle: f64, period: f64) -> f64 {
    if angle >= 0.0 && angle < period {
        return angle;
    }

    let r = rem_euclid(angle, period);

    // Round-off can give exactly one period for tiny negative inputs
    if r >= period {
        0.0
    } else {
        r
    }
}

fn normalize(angle: f64, period: f64) -> f64 {
    let half = period / 2.0;

    if angle > -half && angle <= half {
        return angle;
    }

    let r = denormalize(angle, period);

    if r > half {
        r - period
    } else {
        r
    }
}
