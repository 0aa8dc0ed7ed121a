//! Seasonal productivity adjustment.
//!
//! Each calendar month carries a productivity factor (fraction of a normal
//! working day achieved). A task's duration is stretched by walking working
//! days from its start and crediting each day with its month's factor until
//! the base duration is covered.

use chrono::{Datelike, NaiveDate};

use crate::calendar::{add_working_days, next_working_day};
use crate::config::ScheduleOptions;

const EPSILON: f64 = 1e-9;

/// Guard against pathological factor tables; 1000 years of working days.
const MAX_WALK_DAYS: u32 = 250_000;

#[derive(Clone, Debug)]
pub struct SeasonalAdjuster {
    factors: [f64; 12],
}

impl SeasonalAdjuster {
    pub fn new(factors: [f64; 12]) -> Self {
        Self { factors }
    }

    pub fn from_options(options: &ScheduleOptions) -> Self {
        Self::new(options.monthly_factors())
    }

    pub fn factor_for(&self, date: NaiveDate) -> f64 {
        self.factors[date.month0() as usize]
    }

    /// Working days needed to deliver `base_days` of work starting on `start`.
    ///
    /// Zero stays zero. With all factors at 1.0 the result equals `base_days`;
    /// factors below 1.0 never shorten the task.
    pub fn adjusted_duration(&self, start: NaiveDate, base_days: u32) -> u32 {
        if base_days == 0 {
            return 0;
        }
        let target = f64::from(base_days);
        let mut day = next_working_day(start);
        let mut credited = 0.0;
        let mut walked = 0;
        while walked < MAX_WALK_DAYS {
            credited += self.factor_for(day);
            walked += 1;
            if credited + EPSILON >= target {
                return walked;
            }
            day = add_working_days(day, 1);
        }
        walked
    }
}
