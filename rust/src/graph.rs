//! Task graph construction from WBS articles and their price matches.

use chrono::NaiveDate;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, HashMap};

use crate::calendar::{next_working_day, working_days_between};
use crate::config::ScheduleOptions;
use crate::context::ScheduleContext;
use crate::error::{ScheduleError, ScheduleWarning};
use crate::models::{ResourceType, ScheduleTask, TaskKind, TaskResource};
use crate::phases::Phase;
use crate::stagger::expand_article;
use crate::wbs::{PriceMatch, WbsArticle, WbsProject};
use crate::log_checks;

/// Working hours per crew member per day.
pub const HOURS_PER_DAY: f64 = 8.0;

/// Schedulable work derived from one matched article.
#[derive(Clone, Debug, PartialEq)]
pub struct ArticleWork {
    pub code: String,
    pub name: String,
    pub phase: Phase,
    /// Quantity in price units (article quantity x conversion factor).
    pub quantity: f64,
    pub labor_hours: f64,
    pub cost: f64,
    pub materials_rate: f64,
    pub machinery_rate: f64,
    pub confidence: f64,
}

impl ArticleWork {
    pub fn new(article: &WbsArticle, price: &PriceMatch, phase: Phase, hourly_rate: f64) -> Self {
        let quantity = article.quantity * price.conversion_factor;
        let labor_hours = quantity * price.labor / hourly_rate;
        let priced = quantity * price.unit_total();
        let cost = if priced > 0.0 {
            priced
        } else {
            article.quantity * article.unit_cost
        };
        Self {
            code: article.code.clone(),
            name: article.name.clone(),
            phase,
            quantity,
            labor_hours,
            cost,
            materials_rate: price.materials,
            machinery_rate: price.machinery,
            confidence: price.confidence,
        }
    }

    /// One of `parts` equal shares of this work.
    pub fn share(&self, parts: u32) -> Self {
        let parts = f64::from(parts.max(1));
        Self {
            quantity: self.quantity / parts,
            labor_hours: self.labor_hours / parts,
            cost: self.cost / parts,
            ..self.clone()
        }
    }

    /// Build the detail task for this work. Dates are placeholders until leveling.
    pub fn to_task(
        &self,
        uid: u32,
        parent_uid: u32,
        wbs: String,
        name: String,
        options: &ScheduleOptions,
        start: NaiveDate,
    ) -> ScheduleTask {
        let (team, duration) = size_crew(self.labor_hours, options);

        let mut resources = vec![TaskResource {
            name: self.phase.crew_name(),
            resource_type: ResourceType::Labor,
            units: f64::from(team),
            rate: options.hourly_rate,
            hours: self.labor_hours,
            team_size: Some(team),
        }];
        if self.materials_rate > 0.0 {
            resources.push(TaskResource {
                name: self.name.clone(),
                resource_type: ResourceType::Material,
                units: self.quantity,
                rate: self.materials_rate,
                hours: 0.0,
                team_size: None,
            });
        }
        if self.machinery_rate > 0.0 {
            resources.push(TaskResource {
                name: format!("{} equipment", self.phase.label()),
                resource_type: ResourceType::Machinery,
                units: self.quantity,
                rate: self.machinery_rate,
                hours: 0.0,
                team_size: None,
            });
        }

        ScheduleTask {
            uid,
            wbs,
            name,
            kind: TaskKind::Detail,
            duration_days: duration,
            duration_hours: f64::from(duration) * HOURS_PER_DAY,
            start_date: start,
            finish_date: start,
            predecessors: Vec::new(),
            phase: Some(self.phase),
            outline_level: 2,
            resources,
            cost: self.cost,
            percent_complete: 0.0,
            parent_uid: Some(parent_uid),
            floor: None,
            match_confidence: Some(self.confidence),
        }
    }
}

/// Crew size and duration for `labor_hours` of work.
///
/// The crew is sized to finish in about `target_task_days`, bounded by
/// `[1, team_cap]`; the duration then follows from the crew, minimum one day.
pub fn size_crew(labor_hours: f64, options: &ScheduleOptions) -> (u32, u32) {
    let hours = labor_hours.max(0.0);
    let target_capacity = f64::from(options.target_task_days) * HOURS_PER_DAY;
    let team = ((hours / target_capacity).ceil() as u32).clamp(1, options.team_cap());
    let duration = ((hours / (f64::from(team) * HOURS_PER_DAY)).ceil() as u32).max(1);
    (team, duration)
}

/// One phase: its synthetic summary and the detail tasks under it.
#[derive(Clone, Debug)]
pub struct PhaseGroup {
    pub phase: Phase,
    pub summary: ScheduleTask,
    pub children: Vec<ScheduleTask>,
}

impl PhaseGroup {
    pub(crate) fn new(phase: Phase, uid: u32, start: NaiveDate) -> Self {
        let summary = ScheduleTask {
            uid,
            wbs: format!("PH{:02}", phase.ordinal() + 1),
            name: phase.label(),
            kind: TaskKind::Summary,
            duration_days: 0,
            duration_hours: 0.0,
            start_date: start,
            finish_date: start,
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
        Self {
            phase,
            summary,
            children: Vec::new(),
        }
    }

    /// Re-derive the summary span, hours and cost from the children.
    pub fn roll_up(&mut self) {
        let Some(start) = self.children.iter().map(|t| t.start_date).min() else {
            return;
        };
        let finish = self
            .children
            .iter()
            .map(|t| t.finish_date)
            .max()
            .unwrap_or(start);
        let duration = working_days_between(start, finish);
        self.summary.start_date = start;
        self.summary.finish_date = finish;
        self.summary.duration_days = duration;
        self.summary.duration_hours = self.children.iter().map(|t| t.duration_hours).sum();
        self.summary.cost = self.children.iter().map(|t| t.cost).sum();
    }
}

/// Detail and summary tasks for a project, grouped by phase in canonical order.
#[derive(Clone, Debug)]
pub struct TaskGraph {
    pub groups: Vec<PhaseGroup>,
    pub warnings: Vec<ScheduleWarning>,
}

/// Build phase groups from the WBS and its price matches.
///
/// Unmatched articles are skipped with a warning. Phases without any matched
/// article get no summary.
pub fn build_task_graph(
    project: &WbsProject,
    matches: &HashMap<String, PriceMatch>,
    options: &ScheduleOptions,
    ctx: &mut ScheduleContext,
) -> Result<TaskGraph, ScheduleError> {
    let start = next_working_day(project.start_date);
    let mut warnings = Vec::new();
    let mut unmapped_chapters: FxHashSet<&str> = FxHashSet::default();
    let mut work_by_phase: BTreeMap<Phase, Vec<ArticleWork>> = BTreeMap::new();

    for (chapter, article) in project.articles() {
        let phase = match Phase::from_chapter(&chapter.code, &chapter.name) {
            Some(phase) => phase,
            None => {
                if unmapped_chapters.insert(chapter.code.as_str()) {
                    warnings.push(ScheduleWarning::unmapped_chapter(&chapter.code, &chapter.name));
                }
                Phase::SiteSetup
            }
        };

        let Some(price) = matches.get(&article.code) else {
            log_checks!(ctx.verbosity, "Skipping unmatched article {}", article.code);
            warnings.push(ScheduleWarning::unmatched_article(&article.code, &article.name));
            continue;
        };
        price.validate(&article.code)?;

        work_by_phase
            .entry(phase)
            .or_default()
            .push(ArticleWork::new(article, price, phase, options.hourly_rate));
    }

    let mut groups = Vec::with_capacity(work_by_phase.len());
    for (phase, works) in work_by_phase {
        let mut group = PhaseGroup::new(phase, ctx.next_uid(), start);
        for work in &works {
            let tasks = expand_article(
                work,
                project.number_of_floors,
                group.summary.uid,
                options,
                start,
                ctx,
            );
            group.children.extend(tasks);
        }
        group.roll_up();
        groups.push(group);
    }

    Ok(TaskGraph { groups, warnings })
}
