//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand definitions (commands sent to the navigation exec)
pub mod tc;

/// Command definitions for equipment (like the drive electronics)
pub mod eqpt;
