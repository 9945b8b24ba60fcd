//! Apportioning of elapsed time across calendar days.

use std::fmt::Debug;

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc, Weekday};

use crate::dates::{epoch_to_datetime, SECONDS_PER_DAY};
use crate::error::SurfaceError;

/// Weight given to each calendar day when measuring elapsed time.
///
/// The default is uniform: every day counts as one day.
pub trait WeightFunction: Send + Sync + Debug {
    /// Weight of the UTC day containing `day`.
    fn weight_on_day(&self, _day: DateTime<Utc>) -> f64 {
        1.0
    }
}

/// Every day weighs one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeights;

impl WeightFunction for UniformWeights {}

/// Saturdays and Sundays weigh `weekend_weight`, other days one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekendWeights {
    pub weekend_weight: f64,
}

impl Default for WeekendWeights {
    fn default() -> Self {
        Self {
            weekend_weight: 0.0,
        }
    }
}

impl WeightFunction for WeekendWeights {
    fn weight_on_day(&self, day: DateTime<Utc>) -> f64 {
        match day.weekday() {
            Weekday::Sat | Weekday::Sun => self.weekend_weight,
            _ => 1.0,
        }
    }
}

/// Weighted number of days between two epochs.
///
/// `[from, to]` is split at UTC midnights into a first partial day, whole
/// days and a last partial day; each segment contributes
/// `weight_on_day(segment start) * segment length in days`.
pub fn weight_between(weights: &dyn WeightFunction, from: i64, to: i64) -> Result<f64> {
    if to < from {
        return Err(SurfaceError::input(format!(
            "weight window ends ({to}) before it starts ({from})"
        ))
        .into());
    }

    let mut total = 0.0;
    let mut start = from;
    while start < to {
        let next_midnight = start - start.rem_euclid(SECONDS_PER_DAY) + SECONDS_PER_DAY;
        let end = next_midnight.min(to);
        let day = epoch_to_datetime(start)?;
        total += weights.weight_on_day(day) * (end - start) as f64 / SECONDS_PER_DAY as f64;
        start = end;
    }
    Ok(total)
}
