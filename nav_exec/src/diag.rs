//! # Diagnostics
//!
//! The runner reports everything it does as a [`NavEvent`] to a set of injected [`Diagnostics`]
//! sinks. Two sinks are provided, one writing through the logger and one archiving every cycle's
//! status report as a CSV row in the session directory.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use std::path::Path;

use comms_if::eqpt::drive::WheelDems;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    session::Session,
};

use crate::{geo::GeoPosition, nav_ctrl::StatusReport};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Path of the status report archive, relative to the session's archive root.
pub const STATUS_REPORT_ARCHIVE: &str = "nav_ctrl/status_report.csv";

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for navigation events.
pub trait Diagnostics {
    fn on_event(&mut self, event: &NavEvent);
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Something that happened in the navigation runner.
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    /// A control cycle completed.
    Cycle(StatusReport),

    /// A command was delivered to the sink.
    CommandSent(WheelDems),

    /// A command could not be delivered.
    CommandFailed { dems: WheelDems, reason: String },

    TargetAdded(GeoPosition),

    TargetsCleared,

    SpeedSet(f64),

    /// The runner has stopped the vehicle and released the sink.
    Stopped,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Writes events to the log.
#[derive(Debug, Default)]
pub struct LogDiagnostics;

/// Archives every cycle's status report.
pub struct ArchiveDiagnostics {
    arch_report: Archiver,

    /// Report of the last cycle, not yet written
    report: Option<StatusReport>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Diagnostics for LogDiagnostics {
    fn on_event(&mut self, event: &NavEvent) {
        match event {
            NavEvent::Cycle(r) => info!(
                "Cycle {}: {:?}, fix {:?}, target {}, {} queued",
                r.cycle,
                r.mode,
                r.verdict,
                match r.target_dist_m {
                    Some(d) => format!("{:.1} m away", d),
                    None => "none".to_string(),
                },
                r.num_queued_targets
            ),
            NavEvent::CommandSent(d) => trace!("Sent {}", d),
            NavEvent::CommandFailed { dems, reason } => {
                debug!("Dropped {} ({})", dems, reason)
            }
            NavEvent::TargetAdded(t) => info!("Target {} added", t),
            NavEvent::TargetsCleared => info!("Targets cleared"),
            NavEvent::SpeedSet(s) => info!("Speed ceiling now {}", s),
            NavEvent::Stopped => info!("Navigation stopped"),
        }
    }
}

impl ArchiveDiagnostics {
    /// Archive into the session's archive directory.
    pub fn new(session: &Session) -> Result<Self, ArchiveError> {
        Ok(Self {
            arch_report: Archiver::from_path(session, STATUS_REPORT_ARCHIVE)?,
            report: None,
        })
    }

    /// Archive into an explicit file.
    pub fn from_file_path<P: AsRef<Path>>(path: P) -> Result<Self, ArchiveError> {
        Ok(Self {
            arch_report: Archiver::from_file_path(path)?,
            report: None,
        })
    }
}

impl Archived for ArchiveDiagnostics {
    /// Write the pending report, if any. Each report is written once.
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.report.take() {
            Some(r) => self.arch_report.serialise(r),
            None => Ok(()),
        }
    }
}

impl Diagnostics for ArchiveDiagnostics {
    fn on_event(&mut self, event: &NavEvent) {
        if let NavEvent::Cycle(report) = event {
            self.report = Some(*report);

            if let Err(e) = self.write() {
                warn!("Could not archive the NavCtrl status report: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::nav_ctrl::NavMode;

    #[test]
    fn test_archive_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STATUS_REPORT_ARCHIVE);
        let mut diag = ArchiveDiagnostics::from_file_path(&path).unwrap();

        diag.on_event(&NavEvent::Cycle(StatusReport {
            cycle: 1,
            ..Default::default()
        }));
        diag.on_event(&NavEvent::CommandSent(WheelDems::STOP));
        diag.on_event(&NavEvent::Cycle(StatusReport {
            cycle: 2,
            mode: NavMode::Steering,
            left_pwm: Some(177),
            right_pwm: Some(255),
            ..Default::default()
        }));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("cycle,mode,verdict,"));
        assert!(lines[1].starts_with("1,Idle,,"));
        assert!(lines[2].starts_with("2,Steering,,"));
        assert!(lines[2].ends_with(",177,255"));
    }

    #[test]
    fn test_write_only_pending_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STATUS_REPORT_ARCHIVE);
        let mut diag = ArchiveDiagnostics::from_file_path(&path).unwrap();

        // Nothing pending, nothing written
        diag.write().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

        diag.on_event(&NavEvent::Cycle(StatusReport {
            cycle: 7,
            ..Default::default()
        }));

        // The report was consumed by the event, writing again adds no row
        diag.write().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.lines().nth(1).unwrap().starts_with("7,Idle,"));
    }
}
