//! PyO3 bindings for embedding the scheduler in a Python host.

use chrono::NaiveDate;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::collections::HashMap;

use crate::calendar;
use crate::config::ScheduleOptions;
use crate::critical_chain::{self, ActualProgress};
use crate::error::{ScheduleError, ScheduleWarning, WarningKind};
use crate::models::{
    BufferType, BufferZone, CriticalChainBuffer, CriticalChainData, LinkType, Predecessor,
    ProjectResource, ProjectSchedule, ResourceType, ScheduleTask, TaskKind, TaskResource,
    TeamSummary,
};
use crate::phases::Phase;
use crate::wbs::{PriceMatch, WbsProject};

impl From<ScheduleError> for PyErr {
    fn from(err: ScheduleError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pymethods]
impl ProjectSchedule {
    /// Lossless JSON export.
    #[pyo3(name = "to_json")]
    fn py_to_json(&self) -> PyResult<String> {
        Ok(self.to_json()?)
    }

    fn __repr__(&self) -> String {
        format!(
            "ProjectSchedule(name={:?}, start={}, finish={}, tasks={})",
            self.project_name,
            self.start_date,
            self.finish_date,
            self.tasks.len()
        )
    }
}

/// Build a schedule from JSON-encoded WBS and price matches.
///
/// # Arguments
/// * `project_json` - The WBS project
/// * `matches_json` - Object mapping article code to price match
/// * `options` - Scheduling options (defaults when omitted)
///
/// # Raises
/// * ValueError on invalid input, configuration or a dependency cycle
#[pyfunction]
#[pyo3(name = "schedule_project", signature = (project_json, matches_json, options=None))]
fn py_schedule_project(
    project_json: &str,
    matches_json: &str,
    options: Option<ScheduleOptions>,
) -> PyResult<ProjectSchedule> {
    let project = WbsProject::from_json(project_json)?;
    let matches: HashMap<String, PriceMatch> =
        serde_json::from_str(matches_json).map_err(ScheduleError::from)?;
    Ok(crate::schedule_project(
        &project,
        &matches,
        options.unwrap_or_default(),
    )?)
}

/// Apply reported progress to a schedule's Critical Chain buffers.
#[pyfunction]
#[pyo3(name = "update_buffer_consumption")]
fn py_update_buffer_consumption(
    schedule: ProjectSchedule,
    status_date: NaiveDate,
    percent_complete: HashMap<u32, f64>,
) -> PyResult<ProjectSchedule> {
    let progress = ActualProgress {
        status_date,
        percent_complete,
    };
    Ok(critical_chain::update_buffer_consumption(
        &schedule, &progress,
    )?)
}

#[pyfunction]
fn is_portuguese_holiday(date: NaiveDate) -> bool {
    calendar::is_portuguese_holiday(date)
}

#[pyfunction]
fn is_working_day(date: NaiveDate) -> bool {
    calendar::is_working_day(date)
}

#[pyfunction]
fn add_working_days(date: NaiveDate, n: u32) -> NaiveDate {
    calendar::add_working_days(date, n)
}

#[pyfunction]
fn portuguese_holidays(year: i32) -> Vec<NaiveDate> {
    calendar::portuguese_holidays(year)
}

/// The obra_schedule Python module.
#[pymodule]
fn obra_schedule(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Schedule types
    m.add_class::<ProjectSchedule>()?;
    m.add_class::<ScheduleTask>()?;
    m.add_class::<Predecessor>()?;
    m.add_class::<TaskResource>()?;
    m.add_class::<ProjectResource>()?;
    m.add_class::<TeamSummary>()?;
    m.add_class::<CriticalChainData>()?;
    m.add_class::<CriticalChainBuffer>()?;
    m.add_class::<ScheduleWarning>()?;

    // Enums
    m.add_class::<LinkType>()?;
    m.add_class::<TaskKind>()?;
    m.add_class::<ResourceType>()?;
    m.add_class::<BufferType>()?;
    m.add_class::<BufferZone>()?;
    m.add_class::<WarningKind>()?;
    m.add_class::<Phase>()?;

    // Config types
    m.add_class::<ScheduleOptions>()?;

    // Algorithms
    m.add_function(wrap_pyfunction!(py_schedule_project, m)?)?;
    m.add_function(wrap_pyfunction!(py_update_buffer_consumption, m)?)?;

    // Calendar
    m.add_function(wrap_pyfunction!(is_portuguese_holiday, m)?)?;
    m.add_function(wrap_pyfunction!(is_working_day, m)?)?;
    m.add_function(wrap_pyfunction!(add_working_days, m)?)?;
    m.add_function(wrap_pyfunction!(portuguese_holidays, m)?)?;

    Ok(())
}
