//! Cyclic module interface
//!
//! Navigation control is driven through this trait so that the runner, the benchmarks and the
//! tests all initialise and step it the same way.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::session::Session;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A module stepped once per control cycle.
pub trait State {
    /// Data needed to initialise the module, usually a parameter file name.
    type InitData;
    type InitError;

    /// Sensor data consumed by one cycle.
    type InputData;
    /// Commands produced by one cycle.
    type OutputData;
    /// Snapshot of the module after one cycle, suitable for archiving.
    type StatusReport;
    type ProcError;

    /// (Re)initialise the module, replacing any previous state.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Run one cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
