//! Parameters structure for the position filter

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Parameters for the position filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Largest distance between the current position and a new fix before the fix is treated as
    /// an outlier.
    ///
    /// Units: meters
    pub max_jump_m: f64,

    /// Number of consecutive outliers rejected before one is accepted anyway.
    pub max_attempts: u8,
}

/// Problems found while validating filter parameters.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("The maximum jump distance must be positive and finite, found {0}")]
    InvalidMaxJump(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            max_jump_m: 5.0,
            max_attempts: 3,
        }
    }
}

impl Params {
    /// Check that the parameters are usable.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        if !(self.max_jump_m.is_finite() && self.max_jump_m > 0.0) {
            return Err(ParamsError::InvalidMaxJump(self.max_jump_m));
        }

        Ok(())
    }
}
