//! # Drive Equipment Commands
//!
//! The drive electronics accept a plain text command of the form `<left>|<right>` where both
//! values are integer PWM duty values. `0|0` is a full stop and `255|255` is straight ahead at the
//! highest possible speed. No framing or terminator is added, the transport sends the string as is.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Separator between the left and right values in the wire format.
pub const WHEEL_DEMS_SEPARATOR: char = '|';

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Wheel demands sent to the drive electronics.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelDems {
    /// Demanded PWM value for the left wheel.
    pub left_pwm: i32,

    /// Demanded PWM value for the right wheel.
    pub right_pwm: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur while parsing a wheel demand string.
#[derive(Debug, Error, PartialEq)]
pub enum WheelDemsParseError {
    #[error("Expected a `<left>|<right>` command, found {0:?}")]
    MissingSeparator(String),

    #[error("Expected an integer wheel demand, found {0:?}")]
    InvalidValue(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WheelDems {
    /// Demands which bring the vehicle to a full stop.
    pub const STOP: WheelDems = WheelDems {
        left_pwm: 0,
        right_pwm: 0,
    };

    /// Create a new set of demands.
    pub fn new(left_pwm: i32, right_pwm: i32) -> Self {
        Self {
            left_pwm,
            right_pwm,
        }
    }

    /// Demands to drive straight ahead with both wheels at the given PWM.
    pub fn straight(pwm: i32) -> Self {
        Self::new(pwm, pwm)
    }
}

impl fmt::Display for WheelDems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.left_pwm, WHEEL_DEMS_SEPARATOR, self.right_pwm)
    }
}

impl FromStr for WheelDems {
    type Err = WheelDemsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (left, right) = match s.trim().split_once(WHEEL_DEMS_SEPARATOR) {
            Some(p) => p,
            None => return Err(WheelDemsParseError::MissingSeparator(s.to_string())),
        };

        let parse = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| WheelDemsParseError::InvalidValue(v.to_string()))
        };

        Ok(Self::new(parse(left)?, parse(right)?))
    }
}
