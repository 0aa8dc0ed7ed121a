//! Core data types of a computed schedule.

use chrono::NaiveDate;
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleWarning};
use crate::phases::Phase;

/// Dependency link type between two tasks.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Finish-to-start.
    FS,
    /// Start-to-start.
    SS,
    /// Finish-to-finish.
    FF,
    /// Start-to-finish.
    SF,
}

impl LinkType {
    /// Earliest start offset a successor of `duration` days may take, given
    /// the predecessor's span `[pred_start, pred_end)`.
    pub fn earliest_start(self, lag: i64, pred_start: i64, pred_end: i64, duration: i64) -> i64 {
        match self {
            LinkType::FS => pred_end + lag,
            LinkType::SS => pred_start + lag,
            LinkType::FF => pred_end + lag - duration,
            LinkType::SF => pred_start + lag - duration,
        }
    }

    /// Latest exclusive finish a predecessor of `pred_duration` days may take,
    /// given the successor's late span `[succ_start, succ_end)`.
    pub fn latest_finish(self, lag: i64, succ_start: i64, succ_end: i64, pred_duration: i64) -> i64 {
        match self {
            LinkType::FS => succ_start - lag,
            LinkType::SS => succ_start - lag + pred_duration,
            LinkType::FF => succ_end - lag,
            LinkType::SF => succ_end - lag + pred_duration,
        }
    }
}

/// A dependency on another task with a lag in working days.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predecessor {
    pub uid: u32,
    pub link_type: LinkType,
    pub lag_days: i32,
}

impl Predecessor {
    pub fn new(uid: u32, link_type: LinkType, lag_days: i32) -> Self {
        Self {
            uid,
            link_type,
            lag_days,
        }
    }
}

#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Labor,
    Material,
    Machinery,
    Subcontractor,
}

/// A resource assignment on one task.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskResource {
    pub name: String,
    pub resource_type: ResourceType,
    /// Crew size for labor, quantity for material and machinery.
    pub units: f64,
    /// Cost per hour (labor) or per unit (everything else).
    pub rate: f64,
    pub hours: f64,
    pub team_size: Option<u32>,
}

impl TaskResource {
    pub fn cost(&self) -> f64 {
        match self.resource_type {
            ResourceType::Labor => self.hours * self.rate,
            _ => self.units * self.rate,
        }
    }
}

/// What a task represents in the schedule.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Work derived from a WBS article (or one floor of it).
    Detail,
    /// Phase roll-up spanning its children.
    Summary,
    /// Material lead time gating a phase.
    Procurement,
    /// Zero-duration inspection or approval.
    Milestone,
}

/// A task in the computed schedule.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTask {
    pub uid: u32,
    pub wbs: String,
    pub name: String,
    pub kind: TaskKind,
    /// Working days from start to finish, inclusive.
    pub duration_days: u32,
    pub duration_hours: f64,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub predecessors: Vec<Predecessor>,
    pub phase: Option<Phase>,
    pub outline_level: u32,
    pub resources: Vec<TaskResource>,
    pub cost: f64,
    pub percent_complete: f64,
    /// Phase summary this task rolls up into.
    pub parent_uid: Option<u32>,
    /// Floor number for per-floor sub-tasks.
    pub floor: Option<u32>,
    /// Price match confidence, carried for reporting only.
    pub match_confidence: Option<f64>,
}

impl ScheduleTask {
    pub fn is_summary(&self) -> bool {
        self.kind == TaskKind::Summary
    }

    pub fn is_milestone(&self) -> bool {
        self.kind == TaskKind::Milestone
    }

    /// Crew size working this task (0 for tasks without labor).
    pub fn team_size(&self) -> u32 {
        self.resources
            .iter()
            .filter(|r| r.resource_type == ResourceType::Labor)
            .filter_map(|r| r.team_size)
            .sum()
    }

    /// Total labor hours booked on this task.
    pub fn labor_hours(&self) -> f64 {
        self.resources
            .iter()
            .filter(|r| r.resource_type == ResourceType::Labor)
            .map(|r| r.hours)
            .sum()
    }

    /// Whether `date` falls within the task's span.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.finish_date
    }
}

/// One named resource aggregated across the schedule.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectResource {
    pub uid: u32,
    pub name: String,
    pub resource_type: ResourceType,
    pub total_hours: f64,
    pub total_cost: f64,
    pub standard_rate: f64,
}

#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferType {
    Project,
    Feeding,
}

/// Buffer health zone.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferZone {
    Green,
    Yellow,
    Red,
}

impl BufferZone {
    /// Zone for a consumption percentage: <=33 green, <=67 yellow, else red.
    pub fn from_consumed(consumed_percent: f64) -> Self {
        if consumed_percent <= 33.0 {
            BufferZone::Green
        } else if consumed_percent <= 67.0 {
            BufferZone::Yellow
        } else {
            BufferZone::Red
        }
    }
}

/// A Critical Chain time buffer.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalChainBuffer {
    pub uid: u32,
    pub buffer_type: BufferType,
    pub name: String,
    pub duration_days: u32,
    pub consumed_percent: f64,
    pub zone: BufferZone,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    /// Tasks protected by this buffer, in execution order.
    pub feeding_chain: Vec<u32>,
    /// Chain task the buffer sits in front of (feeding buffers only).
    pub protects_task: Option<u32>,
}

impl CriticalChainBuffer {
    /// Raise consumption to `consumed_percent` (never lowers it) and re-derive the zone.
    pub fn record_consumption(&mut self, consumed_percent: f64) {
        let clamped = consumed_percent.clamp(0.0, 100.0);
        if clamped > self.consumed_percent {
            self.consumed_percent = clamped;
        }
        self.zone = BufferZone::from_consumed(self.consumed_percent);
    }
}

/// Critical Chain view of the schedule.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalChainData {
    pub chain_task_uids: Vec<u32>,
    /// Project buffer first, then feeding buffers in chain order.
    pub buffers: Vec<CriticalChainBuffer>,
    pub original_duration_days: u32,
    pub aggressive_duration_days: u32,
    pub ccpm_duration_days: u32,
    pub safety_reduction_percent: f64,
    pub buffer_ratio: f64,
}

impl CriticalChainData {
    pub fn project_buffer(&self) -> Option<&CriticalChainBuffer> {
        self.buffers
            .iter()
            .find(|b| b.buffer_type == BufferType::Project)
    }

    pub fn feeding_buffers(&self) -> impl Iterator<Item = &CriticalChainBuffer> {
        self.buffers
            .iter()
            .filter(|b| b.buffer_type == BufferType::Feeding)
    }
}

/// Crew statistics over the project span.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    /// Largest number of workers on site on any working day.
    pub max_workers: u32,
    pub average_workers: f64,
    pub total_man_hours: f64,
    /// Monday of the week with the most man-days.
    pub peak_week: Option<NaiveDate>,
}

/// A fully computed project schedule.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectSchedule {
    pub project_name: String,
    pub start_date: NaiveDate,
    pub finish_date: NaiveDate,
    pub total_duration_days: u32,
    pub total_cost: f64,
    pub tasks: Vec<ScheduleTask>,
    pub resources: Vec<ProjectResource>,
    /// Zero-slack tasks ordered by early start.
    pub critical_path: Vec<u32>,
    pub team_summary: TeamSummary,
    pub critical_chain: Option<CriticalChainData>,
    pub warnings: Vec<ScheduleWarning>,
}

impl ProjectSchedule {
    pub fn task(&self, uid: u32) -> Option<&ScheduleTask> {
        self.tasks.iter().find(|t| t.uid == uid)
    }

    /// Tasks rolled up into the summary `summary_uid`.
    pub fn children_of(&self, summary_uid: u32) -> impl Iterator<Item = &ScheduleTask> {
        self.tasks
            .iter()
            .filter(move |t| t.parent_uid == Some(summary_uid))
    }

    pub fn phase_summary(&self, phase: Phase) -> Option<&ScheduleTask> {
        self.tasks
            .iter()
            .find(|t| t.is_summary() && t.phase == Some(phase))
    }

    /// Critical tasks in critical-path order.
    pub fn critical_tasks(&self) -> impl Iterator<Item = &ScheduleTask> {
        self.critical_path.iter().filter_map(|uid| self.task(*uid))
    }

    /// Serialize for the interchange exporter.
    pub fn to_json(&self) -> Result<String, ScheduleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ScheduleError> {
        Ok(serde_json::from_str(json)?)
    }
}
