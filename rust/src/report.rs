//! Schedule-level aggregates: project resources and crew statistics.

use chrono::{Datelike, Days, NaiveDate};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

use crate::calendar::{is_working_day, working_days_between};
use crate::models::{ProjectResource, ScheduleTask, TaskKind, TeamSummary};

/// Aggregate task resources by name, in order of first appearance.
///
/// Uids are assigned from 1; the standard rate is the first rate seen.
pub fn aggregate_resources(tasks: &[ScheduleTask]) -> Vec<ProjectResource> {
    let mut resources: Vec<ProjectResource> = Vec::new();
    let mut slots: FxHashMap<&str, usize> = FxHashMap::default();

    for resource in tasks.iter().flat_map(|t| t.resources.iter()) {
        let slot = *slots.entry(resource.name.as_str()).or_insert_with(|| {
            resources.push(ProjectResource {
                uid: resources.len() as u32 + 1,
                name: resource.name.clone(),
                resource_type: resource.resource_type,
                total_hours: 0.0,
                total_cost: 0.0,
                standard_rate: resource.rate,
            });
            resources.len() - 1
        });
        let entry = &mut resources[slot];
        entry.total_hours += resource.hours;
        entry.total_cost += resource.cost();
    }
    resources
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date)
}

/// Crew statistics over detail tasks for the project span `[start, finish]`.
pub fn team_summary(tasks: &[ScheduleTask], start: NaiveDate, finish: NaiveDate) -> TeamSummary {
    let mut daily: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    let mut total_man_hours = 0.0;

    for task in tasks.iter().filter(|t| t.kind == TaskKind::Detail) {
        total_man_hours += task.labor_hours();
        let team = task.team_size();
        if team == 0 {
            continue;
        }
        for day in task
            .start_date
            .iter_days()
            .take_while(|day| *day <= task.finish_date)
            .filter(|day| is_working_day(*day))
        {
            *daily.entry(day).or_insert(0) += team;
        }
    }

    let max_workers = daily.values().copied().max().unwrap_or(0);
    let span_days = working_days_between(start, finish);
    let average_workers = if span_days > 0 {
        f64::from(daily.values().sum::<u32>()) / f64::from(span_days)
    } else {
        0.0
    };

    let mut weekly: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for (day, workers) in &daily {
        *weekly.entry(week_start(*day)).or_insert(0) += workers;
    }
    // Earliest week wins ties
    let peak_week = weekly
        .iter()
        .fold(None, |best: Option<(NaiveDate, u32)>, (week, total)| match best {
            Some((_, best_total)) if best_total >= *total => best,
            _ => Some((*week, *total)),
        })
        .map(|(week, _)| week);

    TeamSummary {
        max_workers,
        average_workers,
        total_man_hours,
        peak_week,
    }
}
