//! Construction scheduling core.
//!
//! Turns a quantified work-breakdown structure with matched unit prices into
//! a dated, resource-leveled schedule on the Portuguese working calendar,
//! with critical path analysis and optional Critical Chain buffers.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

pub mod calendar;
pub mod config;
pub mod context;
pub mod critical_chain;
pub mod critical_path;
pub mod error;
pub mod graph;
pub mod logging;
pub mod milestones;
pub mod models;
mod pipeline;
pub mod phases;
pub mod procurement;
#[cfg(feature = "python")]
mod python;
pub mod report;
pub mod scheduler;
pub mod seasonal;
pub mod sorting;
pub mod stagger;
pub mod wbs;

pub use config::ScheduleOptions;
pub use critical_chain::{update_buffer_consumption, ActualProgress};
pub use critical_path::{calculate_critical_path, CriticalPathResult, TaskTiming};
pub use error::{ScheduleError, ScheduleWarning, WarningKind};
pub use models::{
    BufferType, BufferZone, CriticalChainBuffer, CriticalChainData, LinkType, Predecessor,
    ProjectResource, ProjectSchedule, ResourceType, ScheduleTask, TaskKind, TaskResource,
    TeamSummary,
};
pub use phases::Phase;
pub use pipeline::schedule_project;
pub use wbs::{PriceMatch, WbsArticle, WbsChapter, WbsProject, WbsSubChapter};
