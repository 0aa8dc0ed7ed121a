//! Per-floor expansion of repetitive work.
//!
//! In multi-storey buildings the staggered phases are split into one
//! sub-task per floor. Floor k+1 may begin once floor k is partly done,
//! which is expressed as a start-to-start link with a lag.

use chrono::NaiveDate;

use crate::config::ScheduleOptions;
use crate::context::ScheduleContext;
use crate::graph::ArticleWork;
use crate::models::{LinkType, Predecessor, ScheduleTask};

/// Lag between consecutive floors: the configured value, or half a floor's
/// duration rounded up (at least one day).
pub fn floor_lag(sub_duration: u32, options: &ScheduleOptions) -> u32 {
    options
        .floor_lag_days
        .unwrap_or_else(|| sub_duration.div_ceil(2).max(1))
}

/// Expand one article into its detail task(s).
///
/// Returns a single task unless the phase is staggered and the building has
/// more than one floor.
pub fn expand_article(
    work: &ArticleWork,
    floors: u32,
    parent_uid: u32,
    options: &ScheduleOptions,
    start: NaiveDate,
    ctx: &mut ScheduleContext,
) -> Vec<ScheduleTask> {
    if floors <= 1 || !work.phase.is_staggered() {
        let task = work.to_task(
            ctx.next_uid(),
            parent_uid,
            work.code.clone(),
            work.name.clone(),
            options,
            start,
        );
        return vec![task];
    }

    let share = work.share(floors);
    let mut tasks: Vec<ScheduleTask> = Vec::with_capacity(floors as usize);
    for floor in 1..=floors {
        let mut task = share.to_task(
            ctx.next_uid(),
            parent_uid,
            format!("{}.P{}", work.code, floor),
            format!("{} (floor {})", work.name, floor),
            options,
            start,
        );
        task.floor = Some(floor);
        if let Some(below) = tasks.last() {
            let lag = i32::try_from(floor_lag(below.duration_days, options)).unwrap_or(i32::MAX);
            task.predecessors
                .push(Predecessor::new(below.uid, LinkType::SS, lag));
        }
        tasks.push(task);
    }
    tasks
}
