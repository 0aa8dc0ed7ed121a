//! Inspection and approval milestones.

use crate::context::ScheduleContext;
use crate::graph::PhaseGroup;
use crate::models::{LinkType, Predecessor, ScheduleTask, TaskKind};
use crate::phases::Phase;

/// Milestone raised when a phase completes.
pub const MILESTONE_RULES: [(Phase, &str); 6] = [
    (Phase::Foundations, "Foundation inspection"),
    (Phase::Structure, "Structural inspection"),
    (Phase::RoughPlumbing, "Plumbing pressure test"),
    (Phase::RoughElectrical, "Electrical installation inspection"),
    (Phase::Gas, "Gas installation certification"),
    (Phase::Cleanup, "Final inspection and occupancy licence"),
];

pub fn milestone_name(phase: Phase) -> Option<&'static str> {
    MILESTONE_RULES
        .iter()
        .find(|(p, _)| *p == phase)
        .map(|(_, name)| *name)
}

/// Milestone following a placed phase summary, if the phase has one.
///
/// Groups must already carry their final dates.
pub fn milestone_for(group: &PhaseGroup, ctx: &mut ScheduleContext) -> Option<ScheduleTask> {
    if group.children.is_empty() {
        return None;
    }
    let name = milestone_name(group.phase)?;
    let date = group.summary.finish_date;
    Some(ScheduleTask {
        uid: ctx.next_uid(),
        wbs: format!("M{:02}", group.phase.ordinal() + 1),
        name: name.to_string(),
        kind: TaskKind::Milestone,
        duration_days: 0,
        duration_hours: 0.0,
        start_date: date,
        finish_date: date,
        predecessors: vec![Predecessor::new(group.summary.uid, LinkType::FS, 0)],
        phase: Some(group.phase),
        outline_level: 1,
        resources: Vec::new(),
        cost: 0.0,
        percent_complete: 0.0,
        parent_uid: None,
        floor: None,
        match_confidence: None,
    })
}

/// Milestones for every group, keyed by the index of their group.
pub fn insert_milestones(
    groups: &[PhaseGroup],
    ctx: &mut ScheduleContext,
) -> Vec<(usize, ScheduleTask)> {
    groups
        .iter()
        .enumerate()
        .filter_map(|(i, group)| milestone_for(group, ctx).map(|m| (i, m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn placed_group(phase: Phase, uid: u32) -> PhaseGroup {
        let summary = ScheduleTask {
            uid,
            wbs: String::new(),
            name: phase.label(),
            kind: TaskKind::Summary,
            duration_days: 5,
            duration_hours: 40.0,
            start_date: d(2026, 3, 2),
            finish_date: d(2026, 3, 6),
            predecessors: Vec::new(),
            phase: Some(phase),
            outline_level: 1,
            resources: Vec::new(),
            cost: 0.0,
            percent_complete: 0.0,
            parent_uid: None,
            floor: None,
            match_confidence: None,
        };
        let child = ScheduleTask {
            uid: uid + 1,
            kind: TaskKind::Detail,
            parent_uid: Some(uid),
            ..summary.clone()
        };
        PhaseGroup {
            phase,
            summary,
            children: vec![child],
        }
    }

    #[test]
    fn test_milestone_follows_summary() {
        let groups = vec![
            placed_group(Phase::Foundations, 1),
            placed_group(Phase::Painting, 3),
            placed_group(Phase::Cleanup, 5),
        ];
        let mut ctx = ScheduleContext::new(0);
        for _ in 0..6 {
            ctx.next_uid();
        }
        let milestones = insert_milestones(&groups, &mut ctx);

        assert_eq!(milestones.len(), 2);
        let (idx, inspection) = &milestones[0];
        assert_eq!(*idx, 0);
        assert_eq!(inspection.name, "Foundation inspection");
        assert!(inspection.is_milestone());
        assert_eq!(inspection.duration_days, 0);
        assert_eq!(inspection.start_date, inspection.finish_date);
        assert_eq!(inspection.finish_date, d(2026, 3, 6));
        assert_eq!(inspection.predecessors, vec![Predecessor::new(1, LinkType::FS, 0)]);
        assert!(inspection.resources.is_empty());

        assert_eq!(milestones[1].0, 2);
        assert_eq!(milestones[1].1.name, "Final inspection and occupancy licence");
    }

    #[test]
    fn test_empty_phase_gets_no_milestone() {
        let mut group = placed_group(Phase::Gas, 1);
        group.children.clear();
        let mut ctx = ScheduleContext::new(0);
        assert!(milestone_for(&group, &mut ctx).is_none());
    }
}
