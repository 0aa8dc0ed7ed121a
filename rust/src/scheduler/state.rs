//! Placement bookkeeping shared across phases during one leveling run.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::calendar::WorkdayIndex;
use crate::models::{LinkType, Predecessor, ScheduleTask};

/// Span of a placed task in working-day offsets: `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedSpan {
    pub start: i64,
    pub end: i64,
}

/// Earliest start allowed by one link to a placed predecessor.
pub fn link_bound(link: LinkType, lag: i64, pred: PlacedSpan, duration: u32) -> i64 {
    link.earliest_start(lag, pred.start, pred.end, i64::from(duration))
}

/// Tasks placed so far and the working-day index they are placed on.
#[derive(Clone, Debug)]
pub struct LevelerState {
    index: WorkdayIndex,
    placed: FxHashMap<u32, PlacedSpan>,
}

impl LevelerState {
    pub fn new(origin: NaiveDate) -> Self {
        Self {
            index: WorkdayIndex::new(origin),
            placed: FxHashMap::default(),
        }
    }

    pub fn date_at(&mut self, offset: i64) -> NaiveDate {
        self.index.date_at(offset)
    }

    pub fn span(&self, uid: u32) -> Option<PlacedSpan> {
        self.placed.get(&uid).copied()
    }

    pub fn record(&mut self, uid: u32, start: i64, end: i64) {
        self.placed.insert(uid, PlacedSpan { start, end });
    }

    /// Record a task that already carries dates (procurement, rolled-up summaries).
    pub fn record_task(&mut self, task: &ScheduleTask) {
        let start = self.index.offset_of(task.start_date);
        let end = if task.duration_days == 0 {
            start
        } else {
            self.index.offset_of(task.finish_date) + 1
        };
        self.record(task.uid, start, end);
    }

    /// Earliest offset satisfying every link to an already placed predecessor.
    ///
    /// Links to tasks not placed yet are ignored. Never before offset 0.
    pub fn earliest_start(&self, predecessors: &[Predecessor], duration: u32) -> i64 {
        predecessors
            .iter()
            .filter_map(|p| {
                self.span(p.uid)
                    .map(|span| link_bound(p.link_type, i64::from(p.lag_days), span, duration))
            })
            .fold(0, i64::max)
    }
}
