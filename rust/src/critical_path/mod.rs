//! Critical path analysis.
//!
//! Forward and backward passes over the task network in working-day offsets,
//! honoring all four link types with lags. Produces per-task slack, the
//! zero-slack set and the driving chain of work tasks that sets the project
//! end.

mod calculation;
mod types;

pub use calculation::{calculate_critical_path, Network};
pub use types::{CriticalPathResult, TaskTiming};
