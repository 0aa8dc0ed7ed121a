//! Configuration types for schedule construction.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Month productivity multipliers for mainland Portugal (index 0 = January).
///
/// Summer heat and the August shutdown dominate; winter rain costs a little.
pub const PORTUGUESE_SEASONAL_FACTORS: [f64; 12] = [
    0.90, 0.92, 0.97, 1.00, 1.00, 0.95, 0.80, 0.70, 0.95, 1.00, 0.95, 0.88,
];

/// Multipliers that leave every duration unchanged.
pub const NEUTRAL_SEASONAL_FACTORS: [f64; 12] = [1.0; 12];

/// Hard ceiling on an inferred crew size.
pub const MAX_TEAM_SIZE: u32 = 10;

/// Longest configurable lag between consecutive floors, in working days.
pub const MAX_FLOOR_LAG_DAYS: u32 = 365;

/// Options for one scheduling call.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleOptions {
    /// Worker cap per phase and working day.
    pub max_workers: u32,
    /// Append Critical Chain buffers to the result.
    pub use_critical_chain: bool,
    /// Fraction of each chain task's duration removed as safety margin.
    pub safety_reduction: f64,
    /// Project buffer size as a fraction of the aggressive chain.
    pub project_buffer_ratio: f64,
    /// Feeding buffer size as a fraction of the feeding sub-chain.
    pub feeding_buffer_ratio: f64,
    /// Productivity multiplier per month, January first. Must hold 12 values.
    pub seasonal_factors: Vec<f64>,
    /// Labor cost per man-hour used to turn labor cost into hours.
    pub hourly_rate: f64,
    /// Duration a crew is sized to finish one article in.
    pub target_task_days: u32,
    /// Start-to-start lag between floors; `None` derives it from the sub-task duration.
    pub floor_lag_days: Option<u32>,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            max_workers: 20,
            use_critical_chain: false,
            safety_reduction: 0.5,
            project_buffer_ratio: 0.5,
            feeding_buffer_ratio: 0.5,
            seasonal_factors: PORTUGUESE_SEASONAL_FACTORS.to_vec(),
            hourly_rate: 15.0,
            target_task_days: 10,
            floor_lag_days: None,
            verbosity: 0,
        }
    }
}

/// A bare worker cap selects defaults for everything else.
impl From<u32> for ScheduleOptions {
    fn from(max_workers: u32) -> Self {
        Self {
            max_workers,
            ..Self::default()
        }
    }
}

fn check_open_unit(field: &str, value: f64) -> Result<(), ScheduleError> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ScheduleError::config(
            field,
            format!("must be strictly between 0 and 1, got {}", value),
        ))
    }
}

impl ScheduleOptions {
    /// Reject out-of-range values before any scheduling work starts.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.max_workers == 0 {
            return Err(ScheduleError::config("max_workers", "must be at least 1"));
        }
        check_open_unit("safety_reduction", self.safety_reduction)?;
        check_open_unit("project_buffer_ratio", self.project_buffer_ratio)?;
        check_open_unit("feeding_buffer_ratio", self.feeding_buffer_ratio)?;

        if self.seasonal_factors.len() != 12 {
            return Err(ScheduleError::config(
                "seasonal_factors",
                format!("expected 12 monthly values, got {}", self.seasonal_factors.len()),
            ));
        }
        if let Some((month, factor)) = self
            .seasonal_factors
            .iter()
            .enumerate()
            .find(|(_, f)| !(f.is_finite() && **f > 0.0 && **f <= 2.0))
        {
            return Err(ScheduleError::config(
                "seasonal_factors",
                format!("month {} factor {} must be in (0, 2]", month + 1, factor),
            ));
        }

        if !(self.hourly_rate.is_finite() && self.hourly_rate > 0.0) {
            return Err(ScheduleError::config("hourly_rate", "must be positive"));
        }
        if self.target_task_days == 0 {
            return Err(ScheduleError::config("target_task_days", "must be at least 1"));
        }
        if let Some(lag) = self.floor_lag_days {
            if lag > MAX_FLOOR_LAG_DAYS {
                return Err(ScheduleError::config(
                    "floor_lag_days",
                    format!("{} exceeds the limit of {} working days", lag, MAX_FLOOR_LAG_DAYS),
                ));
            }
        }
        Ok(())
    }

    /// Largest crew a single task may get under this configuration.
    pub fn team_cap(&self) -> u32 {
        MAX_TEAM_SIZE.min(self.max_workers).max(1)
    }

    /// Seasonal factors as a fixed array. Call after `validate`.
    pub(crate) fn monthly_factors(&self) -> [f64; 12] {
        let mut factors = NEUTRAL_SEASONAL_FACTORS;
        for (slot, value) in factors.iter_mut().zip(&self.seasonal_factors) {
            *slot = *value;
        }
        factors
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl ScheduleOptions {
    #[new]
    #[pyo3(signature = (
        max_workers=None,
        use_critical_chain=None,
        safety_reduction=None,
        project_buffer_ratio=None,
        feeding_buffer_ratio=None,
        seasonal_factors=None,
        hourly_rate=None,
        target_task_days=None,
        floor_lag_days=None,
        verbosity=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        max_workers: Option<u32>,
        use_critical_chain: Option<bool>,
        safety_reduction: Option<f64>,
        project_buffer_ratio: Option<f64>,
        feeding_buffer_ratio: Option<f64>,
        seasonal_factors: Option<Vec<f64>>,
        hourly_rate: Option<f64>,
        target_task_days: Option<u32>,
        floor_lag_days: Option<u32>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            max_workers: max_workers.unwrap_or(defaults.max_workers),
            use_critical_chain: use_critical_chain.unwrap_or(defaults.use_critical_chain),
            safety_reduction: safety_reduction.unwrap_or(defaults.safety_reduction),
            project_buffer_ratio: project_buffer_ratio.unwrap_or(defaults.project_buffer_ratio),
            feeding_buffer_ratio: feeding_buffer_ratio.unwrap_or(defaults.feeding_buffer_ratio),
            seasonal_factors: seasonal_factors.unwrap_or(defaults.seasonal_factors),
            hourly_rate: hourly_rate.unwrap_or(defaults.hourly_rate),
            target_task_days: target_task_days.unwrap_or(defaults.target_task_days),
            floor_lag_days: floor_lag_days.or(defaults.floor_lag_days),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "ScheduleOptions(max_workers={}, use_critical_chain={}, safety_reduction={})",
            self.max_workers, self.use_critical_chain, self.safety_reduction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = ScheduleOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.seasonal_factors.len(), 12);
        assert!((options.seasonal_factors[7] - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_from_bare_worker_cap() {
        let options = ScheduleOptions::from(4);
        assert_eq!(options.max_workers, 4);
        assert_eq!(options.team_cap(), 4);
        assert_eq!(ScheduleOptions::from(50).team_cap(), MAX_TEAM_SIZE);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let err = ScheduleOptions::from(0).validate().unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration { ref field, .. } if field == "max_workers"));
    }

    #[test]
    fn test_rejects_ratios_outside_open_unit_interval() {
        for bad in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let options = ScheduleOptions {
                project_buffer_ratio: bad,
                ..Default::default()
            };
            assert!(options.validate().is_err(), "{} accepted", bad);
        }
        let options = ScheduleOptions {
            safety_reduction: 1.0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_seasonal_factors() {
        let short = ScheduleOptions {
            seasonal_factors: vec![1.0; 11],
            ..Default::default()
        };
        assert!(short.validate().is_err());

        let mut factors = NEUTRAL_SEASONAL_FACTORS.to_vec();
        factors[3] = 0.0;
        let zero = ScheduleOptions {
            seasonal_factors: factors,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_floor_lag_bounds() {
        for lag in [0, MAX_FLOOR_LAG_DAYS] {
            let options = ScheduleOptions {
                floor_lag_days: Some(lag),
                ..Default::default()
            };
            assert!(options.validate().is_ok(), "{} rejected", lag);
        }
        for lag in [MAX_FLOOR_LAG_DAYS + 1, 2_147_483_648, u32::MAX] {
            let options = ScheduleOptions {
                floor_lag_days: Some(lag),
                ..Default::default()
            };
            let err = options.validate().unwrap_err();
            assert!(matches!(err, ScheduleError::Configuration { ref field, .. } if field == "floor_lag_days"));
        }
    }
}
