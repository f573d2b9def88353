//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface. Telecommands are instructions sent to the navigation exec from
//! other threads (a mission loader, an operator console, tests).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod nav;
