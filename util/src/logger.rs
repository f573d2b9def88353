//! Logger setup for the navigation executable
//!
//! Messages go to stdout and to the session's log file, each line prefixed with the seconds
//! elapsed since the session epoch and a coloured level tag.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info, Level};
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Targets which log every simulation step, only shown when tracing.
const CHATTY_TARGETS: [&str; 1] = ["nav_lib::sim"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Log levels below `INFO` are not supported, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Unknown log level `{0}`")]
    UnknownLevel(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must be `INFO` or more verbose. Can only succeed once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_line(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(min_level);

    for target in CHATTY_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, chatty_level(min_level));
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level name as given on the command line (e.g. `debug`).
///
/// Levels which would hide `INFO` messages are refused, as they are by `logger_init`.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggerInitError> {
    let min_level: LevelFilter = level
        .parse()
        .map_err(|_| LoggerInitError::UnknownLevel(level.to_string()))?;

    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    Ok(min_level)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build one log line. The target is only included for debug and trace messages.
fn format_line(
    elapsed_s: f64,
    level: Level,
    target: &str,
    message: impl std::fmt::Display
) -> String {
    if level > Level::Info {
        format!("[{:10.6} {}] {}: {}", elapsed_s, level_to_str(level), target, message)
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level_to_str(level), message)
    }
}

/// Level for the chatty targets, capped at `INFO` unless tracing everything.
fn chatty_level(min_level: LevelFilter) -> LevelFilter {
    if min_level == LevelFilter::Trace {
        LevelFilter::Trace
    }
    else {
        LevelFilter::Info
    }
}

/// Get the string representation of a log level
fn level_to_str(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info  => "INF".normal(),
        Level::Warn  => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("TRACE").unwrap(), LevelFilter::Trace);
        assert!(matches!(
            parse_level("warn"),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
        assert!(matches!(
            parse_level("loud"),
            Err(LoggerInitError::UnknownLevel(_))
        ));
    }

    #[test]
    fn test_format_line() {
        colored::control::set_override(false);

        assert_eq!(
            format_line(1.5, Level::Info, "nav_lib::runner", "Navigation stopped"),
            "[  1.500000 INF] Navigation stopped"
        );
        assert_eq!(
            format_line(0.25, Level::Debug, "nav_lib::nav_ctrl", "Turn radius 41.67 cm"),
            "[  0.250000 DBG] nav_lib::nav_ctrl: Turn radius 41.67 cm"
        );
    }

    #[test]
    fn test_chatty_level() {
        assert_eq!(chatty_level(LevelFilter::Info), LevelFilter::Info);
        assert_eq!(chatty_level(LevelFilter::Debug), LevelFilter::Info);
        assert_eq!(chatty_level(LevelFilter::Trace), LevelFilter::Trace);
    }
}
