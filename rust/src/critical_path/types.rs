//! Types for critical path analysis.

use rustc_hash::FxHashMap;

/// Per-task timing in working-day offsets from the project's first working day.
///
/// Finishes are exclusive: a task occupying offsets 0..5 has
/// `earliest_finish == 5`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TaskTiming {
    /// Earliest possible start (forward pass).
    pub earliest_start: i64,
    /// Earliest possible finish (forward pass).
    pub earliest_finish: i64,
    /// Latest allowable start (backward pass).
    pub latest_start: i64,
    /// Latest allowable finish (backward pass).
    pub latest_finish: i64,
    /// `latest_start - earliest_start`, or `latest_finish - earliest_finish`
    /// for summaries.
    pub slack: i64,
    /// Longest chain of durations ending at this task.
    pub cumulative_duration: i64,
}

impl TaskTiming {
    pub fn is_critical(&self) -> bool {
        self.slack <= 0
    }
}

/// Result of analyzing a task network.
#[derive(Clone, Debug, Default)]
pub struct CriticalPathResult {
    /// Timing for every task, keyed by uid.
    pub timings: FxHashMap<u32, TaskTiming>,
    /// Zero-slack tasks (work and summaries) by early start, then longer
    /// cumulative duration, then uid.
    pub critical_path: Vec<u32>,
    /// Project length in working days (latest early finish).
    pub project_length: i64,
    /// Work tasks that determine the project end, in execution order.
    pub driving_chain: Vec<u32>,
}

impl CriticalPathResult {
    pub fn timing(&self, uid: u32) -> Option<&TaskTiming> {
        self.timings.get(&uid)
    }

    pub fn is_critical(&self, uid: u32) -> bool {
        self.timing(uid).is_some_and(TaskTiming::is_critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_timing_critical() {
        let timing = TaskTiming {
            earliest_start: 0,
            earliest_finish: 5,
            latest_start: 0,
            latest_finish: 5,
            slack: 0,
            cumulative_duration: 5,
        };
        assert!(timing.is_critical());

        let timing_with_slack = TaskTiming {
            latest_start: 2,
            latest_finish: 7,
            slack: 2,
            ..timing
        };
        assert!(!timing_with_slack.is_critical());
    }

    #[test]
    fn test_result_lookup() {
        let mut result = CriticalPathResult::default();
        result.timings.insert(3, TaskTiming::default());
        assert!(result.is_critical(3));
        assert!(!result.is_critical(4));
    }
}
