//! Procurement lead-time gating.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use crate::calendar::{finish_from_start, next_working_day};
use crate::context::ScheduleContext;
use crate::graph::{PhaseGroup, HOURS_PER_DAY};
use crate::models::{LinkType, Predecessor, ScheduleTask, TaskKind};
use crate::phases::Phase;
use crate::log_changes;

/// Long-lead material for a phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeadTime {
    pub phase: Phase,
    pub material: &'static str,
    /// Working days from order to delivery.
    pub days: u32,
}

pub const LEAD_TIMES: [LeadTime; 5] = [
    LeadTime { phase: Phase::Structure, material: "structural steel", days: 15 },
    LeadTime { phase: Phase::Roof, material: "roofing panels", days: 10 },
    LeadTime { phase: Phase::ExternalFrames, material: "window and door frames", days: 30 },
    LeadTime { phase: Phase::RoughHvac, material: "HVAC equipment", days: 25 },
    LeadTime { phase: Phase::Elevators, material: "elevator equipment", days: 60 },
];

pub fn lead_time_for(phase: Phase) -> Option<&'static LeadTime> {
    LEAD_TIMES.iter().find(|lead| lead.phase == phase)
}

/// Procurement tasks and the phases they gate.
#[derive(Clone, Debug, Default)]
pub struct ProcurementPlan {
    pub tasks: Vec<ScheduleTask>,
    pub gated: FxHashSet<Phase>,
}

/// Add one procurement task per present long-lead phase, starting on the
/// project's first working day, as an FS predecessor of the phase summary.
pub fn inject_procurement(
    groups: &mut [PhaseGroup],
    project_start: NaiveDate,
    ctx: &mut ScheduleContext,
) -> ProcurementPlan {
    let start = next_working_day(project_start);
    let mut plan = ProcurementPlan::default();

    for group in groups.iter_mut() {
        if group.children.is_empty() {
            continue;
        }
        let Some(lead) = lead_time_for(group.phase) else {
            continue;
        };

        let uid = ctx.next_uid();
        let task = ScheduleTask {
            uid,
            wbs: format!("PR{:02}", group.phase.ordinal() + 1),
            name: format!("Procurement: {}", lead.material),
            kind: TaskKind::Procurement,
            duration_days: lead.days,
            duration_hours: f64::from(lead.days) * HOURS_PER_DAY,
            start_date: start,
            finish_date: finish_from_start(start, lead.days),
            predecessors: Vec::new(),
            phase: Some(group.phase),
            outline_level: 1,
            resources: Vec::new(),
            cost: 0.0,
            percent_complete: 0.0,
            parent_uid: None,
            floor: None,
            match_confidence: None,
        };
        log_changes!(
            ctx.verbosity,
            "Procurement {} ({} days) gates {}",
            lead.material,
            lead.days,
            group.phase.as_str()
        );

        group
            .summary
            .predecessors
            .push(Predecessor::new(uid, LinkType::FS, 0));
        plan.gated.insert(group.phase);
        plan.tasks.push(task);
    }

    plan
}
