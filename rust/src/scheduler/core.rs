//! Core resource leveler implementation.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::config::ScheduleOptions;
use crate::graph::{PhaseGroup, HOURS_PER_DAY};
use crate::models::{LinkType, Predecessor, ScheduleTask};
use crate::seasonal::SeasonalAdjuster;
use crate::sorting::{sort_ready, LevelingKey};
use crate::{log_changes, log_checks, log_debug};

use super::capacity::WorkerCapacity;
use super::state::LevelerState;

/// Places the detail tasks of each phase under a daily worker cap.
///
/// A greedy serial heuristic: tasks are placed one at a time at the earliest
/// day where their whole span fits, deferring behind the earliest release of
/// an already placed sibling otherwise. It does not search for an optimal
/// resource-constrained schedule.
pub struct ResourceLeveler {
    max_workers: u32,
    adjuster: SeasonalAdjuster,
    verbosity: u8,
}

impl ResourceLeveler {
    pub fn new(options: &ScheduleOptions) -> Self {
        Self {
            max_workers: options.max_workers,
            adjuster: SeasonalAdjuster::from_options(options),
            verbosity: options.verbosity,
        }
    }

    /// Assign dates to every phase group, in the order given.
    ///
    /// `fixed` tasks (procurement) already carry dates and only constrain
    /// phase windows. Each group's summary is rolled up once its children are
    /// placed, so later phases can chain off it.
    pub fn level(&self, groups: &mut [PhaseGroup], fixed: &[ScheduleTask], origin: NaiveDate) {
        let mut state = LevelerState::new(origin);
        for task in fixed {
            state.record_task(task);
        }
        for group in groups.iter_mut() {
            self.level_group(group, &mut state);
        }
    }

    fn level_group(&self, group: &mut PhaseGroup, state: &mut LevelerState) {
        let verbosity = self.verbosity;
        let window = state.earliest_start(&group.summary.predecessors, 0);
        log_changes!(
            verbosity,
            "Leveling {} ({} tasks) from {}",
            group.phase.as_str(),
            group.children.len(),
            state.date_at(window)
        );

        let position: FxHashMap<u32, usize> = group
            .children
            .iter()
            .enumerate()
            .map(|(i, t)| (t.uid, i))
            .collect();
        let mut capacity = WorkerCapacity::new(self.max_workers);
        let mut placed = vec![false; group.children.len()];

        for _ in 0..group.children.len() {
            let ready: Vec<(usize, LevelingKey)> = group
                .children
                .iter()
                .enumerate()
                .filter(|(i, _)| !placed[*i])
                .filter(|(_, task)| {
                    task.predecessors
                        .iter()
                        .all(|p| position.get(&p.uid).map_or(true, |&j| placed[j]))
                })
                .map(|(i, task)| {
                    (
                        i,
                        LevelingKey {
                            duration_days: task.duration_days,
                            wbs_order: i,
                        },
                    )
                })
                .collect();

            log_debug!(verbosity, "  Ready tasks: {}", ready.len());
            let Some(&next) = sort_ready(ready).first() else {
                log_checks!(
                    verbosity,
                    "  No ready task in {}; remaining tasks wait on each other",
                    group.phase.as_str()
                );
                break;
            };
            self.place(&mut group.children[next], window, &mut capacity, state);
            placed[next] = true;
        }

        group.roll_up();
        state.record_task(&group.summary);
        log_checks!(
            verbosity,
            "  {} spans {} to {} (peak {} workers)",
            group.phase.as_str(),
            group.summary.start_date,
            group.summary.finish_date,
            capacity.peak()
        );
    }

    /// Place one task at the first offset where its seasonal span fits.
    fn place(
        &self,
        task: &mut ScheduleTask,
        window: i64,
        capacity: &mut WorkerCapacity,
        state: &mut LevelerState,
    ) {
        let verbosity = self.verbosity;
        let base = task.duration_days;
        let workers = task.team_size();
        let mut candidate = window.max(state.earliest_start(&task.predecessors, base));
        let mut released_by: Option<u32> = None;

        let duration = loop {
            let start_date = state.date_at(candidate);
            let duration = self.adjuster.adjusted_duration(start_date, base);
            if capacity.fits(candidate, duration, workers) {
                break duration;
            }
            match capacity.next_release(candidate) {
                Some(release) => {
                    log_checks!(
                        verbosity,
                        "    {} needs {} workers on {}; waiting for task {}",
                        task.wbs,
                        workers,
                        start_date,
                        release.uid
                    );
                    released_by = Some(release.uid);
                    candidate = release.end;
                }
                None => {
                    released_by = None;
                    candidate += 1;
                }
            }
        };

        capacity.reserve(task.uid, candidate, duration, workers);
        state.record(task.uid, candidate, candidate + i64::from(duration));

        task.start_date = state.date_at(candidate);
        task.finish_date = state.date_at(candidate + i64::from(duration.max(1)) - 1);
        task.duration_days = duration;
        task.duration_hours = f64::from(duration) * HOURS_PER_DAY;

        // Existing links must imply the deferred start, or the CPM pass would
        // pull the task back before its releasing sibling finishes
        if let Some(uid) = released_by {
            let implied = window.max(state.earliest_start(&task.predecessors, duration));
            if implied < candidate {
                task.predecessors.push(Predecessor::new(uid, LinkType::FS, 0));
            }
        }

        log_changes!(
            verbosity,
            "  Placed {} from {} to {} ({} days, {} workers{})",
            task.wbs,
            task.start_date,
            task.finish_date,
            duration,
            workers,
            if duration != base { ", seasonal" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{is_working_day, working_days_between};
    use crate::config::NEUTRAL_SEASONAL_FACTORS;
    use crate::models::{ResourceType, TaskKind, TaskResource};
    use crate::phases::Phase;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn options(max_workers: u32) -> ScheduleOptions {
        ScheduleOptions {
            max_workers,
            seasonal_factors: NEUTRAL_SEASONAL_FACTORS.to_vec(),
            ..ScheduleOptions::default()
        }
    }

    fn task(uid: u32, kind: TaskKind, duration: u32, team: u32) -> ScheduleTask {
        let resources = if team > 0 {
            vec![TaskResource {
                name: "Crew".to_string(),
                resource_type: ResourceType::Labor,
                units: f64::from(team),
                rate: 15.0,
                hours: f64::from(duration * team * 8),
                team_size: Some(team),
            }]
        } else {
            Vec::new()
        };
        ScheduleTask {
            uid,
            wbs: format!("T{}", uid),
            name: format!("Task {}", uid),
            kind,
            duration_days: duration,
            duration_hours: f64::from(duration) * 8.0,
            start_date: d(2026, 3, 2),
            finish_date: d(2026, 3, 2),
            predecessors: Vec::new(),
            phase: Some(Phase::Structure),
            outline_level: 2,
            resources,
            cost: 100.0,
            percent_complete: 0.0,
            parent_uid: None,
            floor: None,
            match_confidence: None,
        }
    }

    fn group(phase: Phase, summary_uid: u32, children: Vec<ScheduleTask>) -> PhaseGroup {
        let mut summary = task(summary_uid, TaskKind::Summary, 0, 0);
        summary.phase = Some(phase);
        let children = children
            .into_iter()
            .map(|mut c| {
                c.parent_uid = Some(summary_uid);
                c.phase = Some(phase);
                c
            })
            .collect();
        PhaseGroup {
            phase,
            summary,
            children,
        }
    }

    fn max_daily_workers(tasks: &[ScheduleTask]) -> u32 {
        let start = tasks.iter().map(|t| t.start_date).min().unwrap();
        let finish = tasks.iter().map(|t| t.finish_date).max().unwrap();
        start
            .iter_days()
            .take_while(|day| *day <= finish)
            .filter(|day| is_working_day(*day))
            .map(|day| {
                tasks
                    .iter()
                    .filter(|t| t.is_active_on(day))
                    .map(|t| t.team_size())
                    .sum::<u32>()
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_parallel_when_capacity_allows() {
        let mut groups = vec![group(
            Phase::Structure,
            1,
            vec![task(2, TaskKind::Detail, 5, 3), task(3, TaskKind::Detail, 5, 3)],
        )];
        ResourceLeveler::new(&options(10)).level(&mut groups, &[], d(2026, 3, 2));

        let g = &groups[0];
        assert_eq!(g.children[0].start_date, d(2026, 3, 2));
        assert_eq!(g.children[1].start_date, d(2026, 3, 2));
        assert_eq!(g.summary.finish_date, d(2026, 3, 6));
        assert!(g.children.iter().all(|c| c.predecessors.is_empty()));
    }

    #[test]
    fn test_defers_and_records_leveling_link() {
        let mut groups = vec![group(
            Phase::Structure,
            1,
            vec![task(2, TaskKind::Detail, 3, 3), task(3, TaskKind::Detail, 5, 3)],
        )];
        ResourceLeveler::new(&options(4)).level(&mut groups, &[], d(2026, 3, 2));

        let g = &groups[0];
        // Longer task goes first
        let long = &g.children[1];
        let short = &g.children[0];
        assert_eq!(long.start_date, d(2026, 3, 2));
        assert_eq!(long.finish_date, d(2026, 3, 6));
        assert_eq!(short.start_date, d(2026, 3, 9));
        assert_eq!(short.predecessors, vec![Predecessor::new(3, LinkType::FS, 0)]);
        assert!(max_daily_workers(&g.children) <= 4);
    }

    #[test]
    fn test_capacity_holds_for_many_tasks() {
        let children: Vec<ScheduleTask> = (0..12)
            .map(|i| task(10 + i, TaskKind::Detail, 2 + i % 5, 1 + i % 4))
            .collect();
        let mut groups = vec![group(Phase::Structure, 1, children)];
        ResourceLeveler::new(&options(5)).level(&mut groups, &[], d(2026, 3, 2));

        let g = &groups[0];
        assert!(max_daily_workers(&g.children) <= 5);
        for child in &g.children {
            assert!(child.finish_date >= child.start_date);
            assert!(g.summary.start_date <= child.start_date);
            assert!(child.finish_date <= g.summary.finish_date);
            assert_eq!(
                working_days_between(child.start_date, child.finish_date),
                child.duration_days
            );
        }
    }

    #[test]
    fn test_phase_window_follows_summary_predecessors() {
        let mut first = group(Phase::Foundations, 1, vec![task(2, TaskKind::Detail, 5, 2)]);
        first.summary.wbs = "PH04".to_string();
        let mut second = group(Phase::Structure, 3, vec![task(4, TaskKind::Detail, 2, 2)]);
        second.summary.predecessors.push(Predecessor::new(1, LinkType::FS, 0));

        let mut groups = vec![first, second];
        ResourceLeveler::new(&options(10)).level(&mut groups, &[], d(2026, 3, 2));

        assert_eq!(groups[0].summary.finish_date, d(2026, 3, 6));
        assert_eq!(groups[1].children[0].start_date, d(2026, 3, 9));
    }

    #[test]
    fn test_procurement_gates_phase() {
        let mut steel = task(9, TaskKind::Procurement, 15, 0);
        steel.start_date = d(2026, 3, 2);
        steel.finish_date = d(2026, 3, 20);
        let mut structure = group(Phase::Structure, 1, vec![task(2, TaskKind::Detail, 2, 2)]);
        structure.summary.predecessors.push(Predecessor::new(9, LinkType::FS, 0));

        let mut groups = vec![structure];
        ResourceLeveler::new(&options(10)).level(&mut groups, &[steel], d(2026, 3, 2));
        assert_eq!(groups[0].children[0].start_date, d(2026, 3, 23));
    }

    #[test]
    fn test_floor_ss_links_are_honored() {
        let floor1 = task(2, TaskKind::Detail, 6, 2);
        let mut floor2 = task(3, TaskKind::Detail, 6, 2);
        floor2.predecessors.push(Predecessor::new(2, LinkType::SS, 3));
        let mut groups = vec![group(Phase::Structure, 1, vec![floor1, floor2])];
        ResourceLeveler::new(&options(10)).level(&mut groups, &[], d(2026, 3, 2));

        assert_eq!(groups[0].children[0].start_date, d(2026, 3, 2));
        assert_eq!(groups[0].children[1].start_date, d(2026, 3, 5));
    }

    #[test]
    fn test_deferred_floor_gets_leveling_link_despite_ss_link() {
        let floor1 = task(2, TaskKind::Detail, 6, 2);
        let mut floor2 = task(3, TaskKind::Detail, 6, 2);
        floor2.predecessors.push(Predecessor::new(2, LinkType::SS, 3));
        let mut groups = vec![group(Phase::Structure, 1, vec![floor1, floor2])];
        ResourceLeveler::new(&options(2)).level(&mut groups, &[], d(2026, 3, 2));

        let upper = &groups[0].children[1];
        // Floor 1 holds the whole crew until Mar 9
        assert_eq!(upper.start_date, d(2026, 3, 10));
        assert_eq!(
            upper.predecessors,
            vec![
                Predecessor::new(2, LinkType::SS, 3),
                Predecessor::new(2, LinkType::FS, 0)
            ]
        );
    }

    #[test]
    fn test_ss_lag_past_release_needs_no_leveling_link() {
        let floor1 = task(2, TaskKind::Detail, 3, 2);
        let mut floor2 = task(3, TaskKind::Detail, 3, 2);
        floor2.predecessors.push(Predecessor::new(2, LinkType::SS, 5));
        let mut groups = vec![group(Phase::Structure, 1, vec![floor1, floor2])];
        ResourceLeveler::new(&options(2)).level(&mut groups, &[], d(2026, 3, 2));

        let upper = &groups[0].children[1];
        assert_eq!(upper.start_date, d(2026, 3, 9));
        assert_eq!(upper.predecessors, vec![Predecessor::new(2, LinkType::SS, 5)]);
    }

    #[test]
    fn test_seasonal_stretch_applies_at_placement() {
        let opts = ScheduleOptions {
            max_workers: 10,
            ..ScheduleOptions::default()
        };
        let mut groups = vec![group(Phase::Structure, 1, vec![task(2, TaskKind::Detail, 7, 2)])];
        ResourceLeveler::new(&opts).level(&mut groups, &[], d(2026, 8, 3));

        let placed = &groups[0].children[0];
        assert_eq!(placed.duration_days, 10);
        assert_eq!(placed.finish_date, d(2026, 8, 14));
        assert!((placed.duration_hours - 80.0).abs() < 1e-9);
    }
}
