//! # Position filter module
//!
//! Turns the stream of raw position fixes into a smoothed position estimate. Raw fixes are
//! checked against three guards before being accepted:
//!
//! 1. A zero fix before any fix has been accepted is a placeholder from the decoder.
//! 2. A fix which jumped too far from the current position is an outlier, unless the retry budget
//!    is exhausted in which case it is accepted so the filter can never get stuck.
//! 3. A fix identical to the last accepted one is a stale repeat from the sensor.
//!
//! Accepted fixes go into a small cyclic buffer whose average is the smoothed output.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cyclic_buffer;
mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use cyclic_buffer::*;
pub use params::*;
pub use state::*;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPosition;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of accepted fixes averaged together.
pub const BUFFER_LEN: usize = 3;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of passing one raw fix through the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOutcome {
    /// The fix was accepted, carrying the smoothed position.
    Accepted(GeoPosition),

    /// An all zero fix arrived before any real fix.
    RejectedZeroBeforeFix,

    /// The fix is too far from the current position.
    RejectedDistant,

    /// The fix is identical to the last accepted fix.
    RejectedDuplicate,
}

/// Outcome of the filter without the position, for status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterVerdict {
    Accepted,
    RejectedZeroBeforeFix,
    RejectedDistant,
    RejectedDuplicate,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FilterOutcome {
    /// Get the verdict of this outcome.
    pub fn verdict(&self) -> FilterVerdict {
        match self {
            FilterOutcome::Accepted(_) => FilterVerdict::Accepted,
            FilterOutcome::RejectedZeroBeforeFix => FilterVerdict::RejectedZeroBeforeFix,
            FilterOutcome::RejectedDistant => FilterVerdict::RejectedDistant,
            FilterOutcome::RejectedDuplicate => FilterVerdict::RejectedDuplicate,
        }
    }
}
