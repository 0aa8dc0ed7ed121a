//! Ready-set ordering for the resource leveler.
//!
//! Longest base duration goes first; ties keep WBS order.

use std::cmp::Ordering;

/// Sort key for a task waiting to be placed (lower = placed sooner).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelingKey {
    pub duration_days: u32,
    /// Position of the task within its phase, in WBS order.
    pub wbs_order: usize,
}

impl Ord for LevelingKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .duration_days
            .cmp(&self.duration_days)
            .then(self.wbs_order.cmp(&other.wbs_order))
    }
}

impl PartialOrd for LevelingKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort ready tasks by their keys, returning their indices in placement order.
pub fn sort_ready(mut ready: Vec<(usize, LevelingKey)>) -> Vec<usize> {
    ready.sort_by(|a, b| a.1.cmp(&b.1));
    ready.into_iter().map(|(idx, _)| idx).collect()
}
