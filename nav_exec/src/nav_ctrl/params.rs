//! Parameters structure for NavCtrl

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::pos_filter;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for navigation control.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Params {
    /// Initial ceiling wheel speed, clamped into the supported PWM range.
    pub speed_pwm: f64,

    /// Distance between the centres of the two drive wheels.
    ///
    /// Units: centimeters
    pub wheel_track_cm: f64,

    /// Position filter parameters.
    #[serde(default)]
    pub filter: pos_filter::Params,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The wheel track must be positive and finite, found {0} cm")]
    InvalidWheelTrack(f64),

    #[error("The speed must be finite, found {0}")]
    InvalidSpeed(f64),

    #[error("Invalid filter parameters: {0}")]
    InvalidFilter(pos_filter::ParamsError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            speed_pwm: super::MAX_SPEED_PWM,
            wheel_track_cm: 15.0,
            filter: pos_filter::Params::default(),
        }
    }
}

impl Params {
    /// Check that the parameters are usable.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.wheel_track_cm.is_finite() && self.wheel_track_cm > 0.0) {
            return Err(ParamsError::InvalidWheelTrack(self.wheel_track_cm));
        }

        if !self.speed_pwm.is_finite() {
            return Err(ParamsError::InvalidSpeed(self.speed_pwm));
        }

        self.filter.are_valid().map_err(ParamsError::InvalidFilter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_toml() {
        let params: Params = toml::from_str(
            r#"
            speed_pwm = 200.0
            wheel_track_cm = 15.0

            [filter]
            max_jump_m = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(params.speed_pwm, 200.0);
        assert_eq!(params.filter.max_jump_m, 4.0);
        assert_eq!(params.filter.max_attempts, 3);
        assert_eq!(params.are_valid(), Ok(()));
    }

    #[test]
    fn test_invalid_params() {
        let mut params = Params::default();
        params.wheel_track_cm = 0.0;
        assert_eq!(params.are_valid(), Err(ParamsError::InvalidWheelTrack(0.0)));

        let mut params = Params::default();
        params.filter.max_jump_m = -1.0;
        assert_eq!(
            params.are_valid(),
            Err(ParamsError::InvalidFilter(pos_filter::ParamsError::InvalidMaxJump(-1.0)))
        );
    }
}
