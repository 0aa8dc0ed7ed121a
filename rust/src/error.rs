//! Error and warning types for schedule construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Fatal failures. Any of these aborts the call; no partial schedule is returned.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Malformed WBS, article, price or progress data.
    #[error("Invalid input for '{field}': {reason}")]
    InputValidation { field: String, reason: String },
    /// The predecessor graph contains a cycle through these task uids.
    #[error("Dependency cycle detected between tasks {uids:?}")]
    CycleDetected { uids: Vec<u32> },
    /// Out-of-range option values.
    #[error("Invalid configuration for '{field}': {reason}")]
    Configuration { field: String, reason: String },
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl ScheduleError {
    pub(crate) fn input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScheduleError::InputValidation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ScheduleError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Category of a non-fatal finding.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Article had no price match and was left out of the schedule.
    UnmatchedArticle,
    /// Chapter code matched no phase; its articles were filed under site setup.
    UnmappedChapter,
}

/// Non-fatal finding surfaced as schedule metadata.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleWarning {
    pub kind: WarningKind,
    /// Article or chapter code the warning refers to.
    pub code: String,
    pub message: String,
}

impl ScheduleWarning {
    pub fn unmatched_article(code: &str, name: &str) -> Self {
        Self {
            kind: WarningKind::UnmatchedArticle,
            code: code.to_string(),
            message: format!("Article {} ({}) has no price match and was skipped", code, name),
        }
    }

    pub fn unmapped_chapter(code: &str, name: &str) -> Self {
        Self {
            kind: WarningKind::UnmappedChapter,
            code: code.to_string(),
            message: format!(
                "Chapter {} ({}) matches no construction phase; scheduled with site setup",
                code, name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = ScheduleError::CycleDetected { uids: vec![3, 7] };
        assert_eq!(err.to_string(), "Dependency cycle detected between tasks [3, 7]");

        let err = ScheduleError::config("max_workers", "must be at least 1");
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_warning_constructors() {
        let w = ScheduleWarning::unmatched_article("02.01.003", "Betão C25/30");
        assert_eq!(w.kind, WarningKind::UnmatchedArticle);
        assert_eq!(w.code, "02.01.003");
        assert!(w.message.contains("skipped"));
    }
}
