//! # Equipment interfaces
//!
//! The navigation core talks to the outside world through two capabilities: a source of the
//! latest position fix and a sink for wheel demand strings. The real transport (serial port and
//! sentence decoder) lives outside this crate, anything implementing these traits can drive the
//! runner.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::geo::GeoPosition;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which can provide the latest raw position fix.
pub trait PositionSource {
    /// Get a snapshot of the latest fix without blocking on the sensor.
    ///
    /// An all zero latitude and longitude means no fix has been decoded yet.
    fn latest_fix(&self) -> GeoPosition;
}

/// Something which accepts wheel demand strings (`"<left>|<right>"`).
pub trait CommandSink {
    /// Send a command to the drive electronics.
    fn send(&mut self, cmd: &str) -> Result<(), SinkError>;

    /// Release the transport. Sends after closing fail.
    fn close(&mut self);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors raised by a command sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("The command sink has been closed")]
    Closed,

    #[error("The command {0:?} was not understood by the sink")]
    InvalidCommand(String),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot cell holding the latest fix, shared between the decoder and the control loop.
///
/// Readers always copy the whole fix under the lock, so they never see a half written update.
#[derive(Debug, Clone, Default)]
pub struct SharedFix {
    fix: Arc<Mutex<GeoPosition>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SharedFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole fix.
    pub fn publish(&self, fix: GeoPosition) {
        *self.lock() = fix;
    }

    /// Update only the position part of the fix (from a position sentence).
    pub fn publish_position(&self, lat_deg: f64, lon_deg: f64, alt_m: f64) {
        let mut fix = self.lock();
        fix.lat_deg = lat_deg;
        fix.lon_deg = lon_deg;
        fix.alt_m = alt_m;
    }

    /// Update only the speed part of the fix (from a speed sentence).
    pub fn publish_speed(&self, speed_kmh: f64) {
        self.lock().speed_kmh = speed_kmh;
    }

    fn lock(&self) -> MutexGuard<'_, GeoPosition> {
        // Poisoning is ignored, every GeoPosition is a valid value
        self.fix.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PositionSource for SharedFix {
    fn latest_fix(&self) -> GeoPosition {
        *self.lock()
    }
}
