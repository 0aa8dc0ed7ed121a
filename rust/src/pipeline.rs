//! End-to-end schedule construction.

use std::collections::HashMap;

use crate::calendar::{next_working_day, working_days_between};
use crate::config::ScheduleOptions;
use crate::context::ScheduleContext;
use crate::critical_chain::plan_critical_chain;
use crate::critical_path::Network;
use crate::error::ScheduleError;
use crate::graph::{build_task_graph, PhaseGroup, TaskGraph};
use crate::milestones::insert_milestones;
use crate::models::{ProjectSchedule, ScheduleTask, TaskKind};
use crate::phases::sequence_phases;
use crate::procurement::inject_procurement;
use crate::report::{aggregate_resources, team_summary};
use crate::scheduler::ResourceLeveler;
use crate::wbs::{PriceMatch, WbsProject};
use crate::{log_changes, log_checks};

/// Build a dated, resource-leveled schedule for a priced WBS.
///
/// `options` is either a bare worker cap or a full [`ScheduleOptions`].
/// Every call is independent: uids start at 1 and no state outlives the call.
///
/// # Errors
/// * `Configuration` for out-of-range options
/// * `InputValidation` for malformed WBS or price data
/// * `CycleDetected` if the task network is not acyclic
pub fn schedule_project(
    project: &WbsProject,
    matches: &HashMap<String, PriceMatch>,
    options: impl Into<ScheduleOptions>,
) -> Result<ProjectSchedule, ScheduleError> {
    let options = options.into();
    options.validate()?;
    project.validate()?;

    let mut ctx = ScheduleContext::new(options.verbosity);
    let verbosity = ctx.verbosity;
    let origin = next_working_day(project.start_date);
    log_changes!(
        verbosity,
        "Scheduling '{}' from {} with {} workers per phase",
        project.name,
        origin,
        options.max_workers
    );

    let TaskGraph { mut groups, warnings } = build_task_graph(project, matches, &options, &mut ctx)?;
    let procurement = inject_procurement(&mut groups, origin, &mut ctx);
    sequence_phases(&mut groups, &procurement.gated);
    ResourceLeveler::new(&options).level(&mut groups, &procurement.tasks, origin);
    let milestones = insert_milestones(&groups, &mut ctx);

    let tasks = assemble_tasks(procurement.tasks, groups, milestones);
    let network = Network::build(&tasks)?;
    let cpm = network.analyze();
    log_checks!(
        verbosity,
        "Critical path: {} tasks over {} working days",
        cpm.critical_path.len(),
        cpm.project_length
    );

    let critical_chain = if options.use_critical_chain {
        Some(plan_critical_chain(&tasks, &network, &cpm, &options, origin, &mut ctx))
    } else {
        None
    };

    let finish_date = tasks.iter().map(|t| t.finish_date).max().unwrap_or(origin);
    let total_duration_days = if tasks.is_empty() {
        0
    } else {
        working_days_between(origin, finish_date)
    };
    let total_cost = tasks
        .iter()
        .filter(|t| t.kind == TaskKind::Detail)
        .map(|t| t.cost)
        .sum();
    let resources = aggregate_resources(&tasks);
    let team_summary = team_summary(&tasks, origin, finish_date);

    log_changes!(
        verbosity,
        "Scheduled {} tasks: {} to {} ({} working days, peak crew {})",
        tasks.len(),
        origin,
        finish_date,
        total_duration_days,
        team_summary.max_workers
    );

    Ok(ProjectSchedule {
        project_name: project.name.clone(),
        start_date: origin,
        finish_date,
        total_duration_days,
        total_cost,
        tasks,
        resources,
        critical_path: cpm.critical_path,
        team_summary,
        critical_chain,
        warnings,
    })
}

/// Output order: procurement, then each phase's summary, its children and
/// its milestones.
fn assemble_tasks(
    procurement: Vec<ScheduleTask>,
    groups: Vec<PhaseGroup>,
    milestones: Vec<(usize, ScheduleTask)>,
) -> Vec<ScheduleTask> {
    let mut by_group: Vec<Vec<ScheduleTask>> = vec![Vec::new(); groups.len()];
    for (index, milestone) in milestones {
        if let Some(slot) = by_group.get_mut(index) {
            slot.push(milestone);
        }
    }

    let mut tasks = procurement;
    for (group, group_milestones) in groups.into_iter().zip(by_group) {
        tasks.push(group.summary);
        tasks.extend(group.children);
        tasks.extend(group_milestones);
    }
    tasks
}
