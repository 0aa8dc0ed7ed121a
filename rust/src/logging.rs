//! Logging macros with verbosity level control.
//!
//! Records are emitted through the `log` facade, so the host decides where
//! they go. Verbosity is set per call via `ScheduleOptions::verbosity`:
//! - 0: SILENT (nothing)
//! - 1: CHANGES (phase placements, deferrals, buffers) at `info`
//! - 2: CHECKS (capacity checks, ready-set decisions) at `debug`
//! - 3: DEBUG (pass internals) at `trace`

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: task placements, leveling deferrals, buffer sizing.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            ::log::info!(target: "obra_schedule", $($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: capacity checks, ready-set ordering.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            ::log::debug!(target: "obra_schedule", $($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
///
/// Used for: forward/backward pass values, seasonal walks.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            ::log::trace!(target: "obra_schedule", $($arg)*);
        }
    };
}
