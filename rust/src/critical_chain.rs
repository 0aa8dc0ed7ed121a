//! Critical Chain buffers on top of a CPM result.
//!
//! Chain tasks lose their safety margin (aggressive durations); the removed
//! time is pooled into a project buffer after the chain and feeding buffers
//! where non-critical work merges into it. Buffer consumption is tracked
//! against reported progress.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::calendar::{subtract_working_days, working_days_between, WorkdayIndex};
use crate::config::ScheduleOptions;
use crate::context::ScheduleContext;
use crate::critical_path::{CriticalPathResult, Network};
use crate::error::ScheduleError;
use crate::models::{
    BufferType, BufferZone, CriticalChainBuffer, CriticalChainData, ProjectSchedule, ScheduleTask,
    TaskKind,
};
use crate::{log_changes, log_checks};

/// Duration with the safety margin `safety_reduction` removed, at least one day.
pub fn aggressive_duration(duration_days: u32, safety_reduction: f64) -> u32 {
    if duration_days == 0 {
        return 0;
    }
    let reduced = (f64::from(duration_days) * (1.0 - safety_reduction)).ceil();
    (reduced as u32).max(1)
}

/// Aggressive duration of a task: detail work is cut, everything else keeps its length.
fn aggressive_for(task: &ScheduleTask, safety_reduction: f64) -> u32 {
    match task.kind {
        TaskKind::Detail => aggressive_duration(task.duration_days, safety_reduction),
        _ => task.duration_days,
    }
}

#[allow(clippy::too_many_arguments)]
fn buffer(
    uid: u32,
    buffer_type: BufferType,
    name: String,
    duration_days: u32,
    start_date: NaiveDate,
    finish_date: NaiveDate,
    feeding_chain: Vec<u32>,
    protects_task: Option<u32>,
) -> CriticalChainBuffer {
    CriticalChainBuffer {
        uid,
        buffer_type,
        name,
        duration_days,
        consumed_percent: 0.0,
        zone: BufferZone::Green,
        start_date,
        finish_date,
        feeding_chain,
        protects_task,
    }
}

/// Size and place Critical Chain buffers for an analyzed schedule.
///
/// `tasks` must carry their final dates; `origin` is the project's first
/// working day, which CPM offsets are counted from.
pub fn plan_critical_chain(
    tasks: &[ScheduleTask],
    network: &Network,
    cpm: &CriticalPathResult,
    options: &ScheduleOptions,
    origin: NaiveDate,
    ctx: &mut ScheduleContext,
) -> CriticalChainData {
    let verbosity = ctx.verbosity;
    let by_uid: FxHashMap<u32, &ScheduleTask> = tasks.iter().map(|t| (t.uid, t)).collect();
    let safety = options.safety_reduction;
    let chain: Vec<u32> = cpm.driving_chain.clone();

    // Aggressive chain
    let overrides: FxHashMap<u32, u32> = chain
        .iter()
        .filter_map(|uid| by_uid.get(uid))
        .filter(|t| t.kind == TaskKind::Detail)
        .map(|t| (t.uid, aggressive_duration(t.duration_days, safety)))
        .collect();
    let original = cpm.project_length.max(0);
    let aggressive = network.analyze_with(&overrides).project_length.max(0).min(original);

    let sized = (options.project_buffer_ratio * aggressive as f64).ceil() as i64;
    let project_buffer_days = sized.min(original - aggressive).max(0);
    let ccpm = aggressive + project_buffer_days;

    let mut index = WorkdayIndex::new(origin);
    let pb_start = index.date_at(aggressive);
    let pb_finish = index.date_at(aggressive + (project_buffer_days - 1).max(0));
    let mut buffers = vec![buffer(
        ctx.next_uid(),
        BufferType::Project,
        "Project buffer".to_string(),
        project_buffer_days as u32,
        pb_start,
        pb_finish,
        chain.clone(),
        None,
    )];
    log_changes!(
        verbosity,
        "Critical chain: {} tasks, {} -> {} days, project buffer {} days",
        chain.len(),
        original,
        aggressive,
        project_buffer_days
    );

    // Feeding buffers
    let chain_set: FxHashSet<u32> = chain.iter().copied().collect();
    let feeds = |uid: u32| {
        !chain_set.contains(&uid)
            && !cpm.is_critical(uid)
            && matches!(network.kind(uid), Some(TaskKind::Detail | TaskKind::Procurement))
    };
    let cumulative = |uid: u32| cpm.timing(uid).map_or(0, |t| t.cumulative_duration);
    let mut claimed: FxHashSet<u32> = FxHashSet::default();

    for &merge_uid in &chain {
        let Some(merge_task) = by_uid.get(&merge_uid) else {
            continue;
        };

        let mut candidates: Vec<u32> = Vec::new();
        for pred in network.predecessors(merge_uid) {
            if network.is_rollup(pred) {
                let siblings = network.children(pred);
                for child in &siblings {
                    let ends_sub_chain = !network
                        .successors(*child)
                        .iter()
                        .any(|s| siblings.contains(s) && feeds(*s));
                    if feeds(*child) && ends_sub_chain {
                        candidates.push(*child);
                    }
                }
            } else if feeds(pred) {
                candidates.push(pred);
            }
        }
        candidates.sort_by_key(|&uid| (Reverse(cumulative(uid)), uid));
        candidates.dedup();

        for candidate in candidates {
            if !claimed.insert(candidate) {
                continue;
            }
            let mut sub_chain = vec![candidate];
            let mut current = candidate;
            loop {
                let next = network
                    .predecessors(current)
                    .into_iter()
                    .filter(|p| feeds(*p) && !claimed.contains(p))
                    .max_by_key(|&p| (cumulative(p), Reverse(p)));
                let Some(next) = next else {
                    break;
                };
                claimed.insert(next);
                sub_chain.push(next);
                current = next;
            }
            sub_chain.reverse();

            let feeding_work: u32 = sub_chain
                .iter()
                .filter_map(|uid| by_uid.get(uid))
                .map(|t| aggressive_for(t, safety))
                .sum();
            let days = ((options.feeding_buffer_ratio * f64::from(feeding_work)).ceil() as u32).max(1);
            let finish = subtract_working_days(merge_task.start_date, 1);
            let start = subtract_working_days(finish, days - 1);
            log_checks!(
                verbosity,
                "  Feeding buffer of {} days before {} for {:?}",
                days,
                merge_task.wbs,
                sub_chain
            );
            buffers.push(buffer(
                ctx.next_uid(),
                BufferType::Feeding,
                format!("Feeding buffer before {}", merge_task.name),
                days,
                start,
                finish,
                sub_chain,
                Some(merge_uid),
            ));
        }
    }

    let buffer_ratio = if ccpm > 0 {
        project_buffer_days as f64 / ccpm as f64
    } else {
        0.0
    };

    CriticalChainData {
        chain_task_uids: chain,
        buffers,
        original_duration_days: original as u32,
        aggressive_duration_days: aggressive as u32,
        ccpm_duration_days: ccpm as u32,
        safety_reduction_percent: safety * 100.0,
        buffer_ratio,
    }
}

/// Reported progress as of a status date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActualProgress {
    pub status_date: NaiveDate,
    /// Percent complete in [0, 100] per task uid.
    pub percent_complete: HashMap<u32, f64>,
}

impl ActualProgress {
    pub fn new(status_date: NaiveDate) -> Self {
        Self {
            status_date,
            percent_complete: HashMap::new(),
        }
    }

    pub fn with(mut self, uid: u32, percent: f64) -> Self {
        self.percent_complete.insert(uid, percent);
        self
    }

    fn validate(&self, schedule: &ProjectSchedule) -> Result<(), ScheduleError> {
        for (&uid, &percent) in &self.percent_complete {
            let field = format!("percent_complete[{}]", uid);
            if !(percent.is_finite() && (0.0..=100.0).contains(&percent)) {
                return Err(ScheduleError::input(
                    field,
                    format!("must be between 0 and 100, got {}", percent),
                ));
            }
            if schedule.task(uid).is_none() {
                return Err(ScheduleError::input(field, "no task with this uid"));
            }
        }
        Ok(())
    }
}

/// Days a task is behind its aggressive plan as of `status_date`.
fn lateness(task: &ScheduleTask, aggressive: u32, status_date: NaiveDate, percent: f64) -> f64 {
    if aggressive == 0 {
        return 0.0;
    }
    let elapsed = match status_date.pred_opt() {
        Some(day_before) => working_days_between(task.start_date, day_before),
        None => 0,
    };
    let expected = (f64::from(elapsed) / f64::from(aggressive)).clamp(0.0, 1.0);
    let actual = (percent / 100.0).clamp(0.0, 1.0);
    (expected - actual).max(0.0) * f64::from(aggressive)
}

/// Apply progress to a schedule's buffers, returning the updated schedule.
///
/// Task `percent_complete` values are updated from the report. Buffer
/// consumption only ever increases; zones are re-derived. A schedule without
/// Critical Chain data is returned with only its task progress updated.
pub fn update_buffer_consumption(
    schedule: &ProjectSchedule,
    progress: &ActualProgress,
) -> Result<ProjectSchedule, ScheduleError> {
    progress.validate(schedule)?;

    let mut updated = schedule.clone();
    for task in &mut updated.tasks {
        if let Some(&percent) = progress.percent_complete.get(&task.uid) {
            task.percent_complete = percent;
        }
    }

    let tasks = &updated.tasks;
    let Some(chain) = updated.critical_chain.as_mut() else {
        return Ok(updated);
    };
    let safety = chain.safety_reduction_percent / 100.0;
    let chain_uids = chain.chain_task_uids.clone();

    for buffer in &mut chain.buffers {
        let protected = match buffer.buffer_type {
            BufferType::Project => &chain_uids,
            BufferType::Feeding => &buffer.feeding_chain,
        };
        let total_lateness: f64 = protected
            .iter()
            .filter_map(|uid| tasks.iter().find(|t| t.uid == *uid))
            .map(|task| {
                lateness(
                    task,
                    aggressive_for(task, safety),
                    progress.status_date,
                    task.percent_complete,
                )
            })
            .sum();

        let consumed = if buffer.duration_days == 0 {
            if total_lateness > 0.0 {
                100.0
            } else {
                0.0
            }
        } else {
            total_lateness / f64::from(buffer.duration_days) * 100.0
        };
        buffer.record_consumption(consumed);
    }

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::critical_path::calculate_critical_path;
    use crate::models::{LinkType, Predecessor, TeamSummary};

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn task(
        uid: u32,
        kind: TaskKind,
        duration: u32,
        start: NaiveDate,
        finish: NaiveDate,
        parent_uid: Option<u32>,
    ) -> ScheduleTask {
        ScheduleTask {
            uid,
            wbs: format!("{}", uid),
            name: format!("Task {}", uid),
            kind,
            duration_days: duration,
            duration_hours: f64::from(duration) * 8.0,
            start_date: start,
            finish_date: finish,
            predecessors: Vec::new(),
            phase: None,
            outline_level: if parent_uid.is_some() { 2 } else { 1 },
            resources: Vec::new(),
            cost: 0.0,
            percent_complete: 0.0,
            parent_uid,
            floor: None,
            match_confidence: None,
        }
    }

    /// Two phases: a (10d) and b (4d) in parallel, then c (6d).
    fn tasks() -> Vec<ScheduleTask> {
        let mut s2 = task(4, TaskKind::Summary, 6, d(2026, 3, 16), d(2026, 3, 23), None);
        s2.predecessors.push(Predecessor::new(1, LinkType::FS, 0));
        vec![
            task(1, TaskKind::Summary, 10, d(2026, 3, 2), d(2026, 3, 13), None),
            task(2, TaskKind::Detail, 10, d(2026, 3, 2), d(2026, 3, 13), Some(1)),
            task(3, TaskKind::Detail, 4, d(2026, 3, 2), d(2026, 3, 5), Some(1)),
            s2,
            task(5, TaskKind::Detail, 6, d(2026, 3, 16), d(2026, 3, 23), Some(4)),
        ]
    }

    fn plan() -> CriticalChainData {
        let tasks = tasks();
        let network = Network::build(&tasks).unwrap();
        let cpm = network.analyze();
        let mut ctx = ScheduleContext::new(0);
        for _ in 0..5 {
            ctx.next_uid();
        }
        let options = ScheduleOptions {
            use_critical_chain: true,
            ..ScheduleOptions::default()
        };
        plan_critical_chain(&tasks, &network, &cpm, &options, d(2026, 3, 2), &mut ctx)
    }

    fn schedule() -> ProjectSchedule {
        ProjectSchedule {
            project_name: "Moradia".to_string(),
            start_date: d(2026, 3, 2),
            finish_date: d(2026, 3, 23),
            total_duration_days: 16,
            total_cost: 0.0,
            tasks: tasks(),
            resources: Vec::new(),
            critical_path: vec![1, 2, 4, 5],
            team_summary: TeamSummary::default(),
            critical_chain: Some(plan()),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_aggressive_duration() {
        assert_eq!(aggressive_duration(10, 0.5), 5);
        assert_eq!(aggressive_duration(3, 0.5), 2);
        assert_eq!(aggressive_duration(1, 0.9), 1);
        assert_eq!(aggressive_duration(0, 0.5), 0);
    }

    #[test]
    fn test_project_buffer() {
        let data = plan();
        assert_eq!(data.chain_task_uids, vec![2, 5]);
        assert_eq!(data.original_duration_days, 16);
        assert_eq!(data.aggressive_duration_days, 8);
        assert_eq!(data.ccpm_duration_days, 12);
        assert!(data.ccpm_duration_days <= data.original_duration_days);
        assert!((data.safety_reduction_percent - 50.0).abs() < 1e-9);
        assert!((data.buffer_ratio - 4.0 / 12.0).abs() < 1e-9);

        let pb = data.project_buffer().unwrap();
        assert_eq!(pb.uid, 6);
        assert_eq!(pb.duration_days, 4);
        assert_eq!(pb.consumed_percent, 0.0);
        assert_eq!(pb.zone, BufferZone::Green);
        assert_eq!(pb.start_date, d(2026, 3, 12));
        assert_eq!(pb.finish_date, d(2026, 3, 17));
        assert_eq!(pb.feeding_chain, vec![2, 5]);
    }

    #[test]
    fn test_feeding_buffer_through_summary() {
        let data = plan();
        let feeding: Vec<&CriticalChainBuffer> = data.feeding_buffers().collect();
        assert_eq!(feeding.len(), 1);
        let fb = feeding[0];
        assert_eq!(fb.feeding_chain, vec![3]);
        assert_eq!(fb.protects_task, Some(5));
        assert_eq!(fb.duration_days, 1);
        assert_eq!(fb.finish_date, d(2026, 3, 13));
        assert_eq!(fb.start_date, d(2026, 3, 13));
    }

    #[test]
    fn test_buffer_cap_keeps_ccpm_within_original() {
        // A single task: nothing saved beyond the aggressive cut
        let tasks = vec![task(1, TaskKind::Detail, 1, d(2026, 3, 2), d(2026, 3, 2), None)];
        let network = Network::build(&tasks).unwrap();
        let cpm = calculate_critical_path(&tasks).unwrap();
        let mut ctx = ScheduleContext::new(0);
        let data = plan_critical_chain(
            &tasks,
            &network,
            &cpm,
            &ScheduleOptions::default(),
            d(2026, 3, 2),
            &mut ctx,
        );
        assert_eq!(data.aggressive_duration_days, 1);
        assert_eq!(data.project_buffer().unwrap().duration_days, 0);
        assert_eq!(data.ccpm_duration_days, 1);
        assert_eq!(data.buffer_ratio, 0.0);
    }

    #[test]
    fn test_consumption_from_late_chain_task() {
        let progress = ActualProgress::new(d(2026, 3, 9)).with(2, 40.0).with(3, 100.0);
        let updated = update_buffer_consumption(&schedule(), &progress).unwrap();

        let chain = updated.critical_chain.as_ref().unwrap();
        let pb = chain.project_buffer().unwrap();
        // 5 elapsed days of a 5-day aggressive task, 40% done: 3 days late of 4
        assert!((pb.consumed_percent - 75.0).abs() < 1e-6);
        assert_eq!(pb.zone, BufferZone::Red);

        let fb = chain.feeding_buffers().next().unwrap();
        assert_eq!(fb.consumed_percent, 0.0);
        assert_eq!(fb.zone, BufferZone::Green);

        assert_eq!(updated.task(2).unwrap().percent_complete, 40.0);
    }

    #[test]
    fn test_consumption_never_decreases() {
        let late = ActualProgress::new(d(2026, 3, 9)).with(2, 40.0);
        let first = update_buffer_consumption(&schedule(), &late).unwrap();
        let caught_up = ActualProgress::new(d(2026, 3, 10)).with(2, 100.0);
        let second = update_buffer_consumption(&first, &caught_up).unwrap();

        let pb = second.critical_chain.as_ref().unwrap().project_buffer().unwrap();
        assert!((pb.consumed_percent - 75.0).abs() < 1e-6);
        assert_eq!(pb.zone, BufferZone::Red);
    }

    #[test]
    fn test_on_time_progress_consumes_nothing() {
        let progress = ActualProgress::new(d(2026, 3, 2));
        let updated = update_buffer_consumption(&schedule(), &progress).unwrap();
        let pb = updated.critical_chain.as_ref().unwrap().project_buffer().unwrap();
        assert_eq!(pb.consumed_percent, 0.0);
    }

    #[test]
    fn test_invalid_progress_rejected() {
        for bad in [-1.0, 100.5, f64::NAN] {
            let progress = ActualProgress::new(d(2026, 3, 9)).with(2, bad);
            assert!(matches!(
                update_buffer_consumption(&schedule(), &progress),
                Err(ScheduleError::InputValidation { .. })
            ));
        }
        let unknown = ActualProgress::new(d(2026, 3, 9)).with(99, 10.0);
        assert!(update_buffer_consumption(&schedule(), &unknown).is_err());
    }

    #[test]
    fn test_schedule_without_chain_is_returned() {
        let mut plain = schedule();
        plain.critical_chain = None;
        let progress = ActualProgress::new(d(2026, 3, 9)).with(5, 10.0);
        let updated = update_buffer_consumption(&plain, &progress).unwrap();
        assert!(updated.critical_chain.is_none());
        assert_eq!(updated.task(5).unwrap().percent_complete, 10.0);
    }
}
