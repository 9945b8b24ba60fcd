//! Time-weighted variance table built from the raw tenor quotes.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::debug;

use super::weight::{weight_between, WeightFunction};
use crate::dates::{EffectiveDateCalculator, SECONDS_PER_DAY};
use crate::error::SurfaceError;
use crate::market::{PointVariances, RawSurface, SmilePoint};

/// Hour (NY) to which tenor expiries are anchored.
const EXPIRY_ANCHOR_HOUR_NY: i64 = 10;

/// Epoch seconds to cumulative variance per smile point.
///
/// Variance is `vol² × days` with time measured from the recorded timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarianceTable {
    entries: BTreeMap<i64, PointVariances>,
}

impl VarianceTable {
    pub fn get(&self, epoch: i64) -> Option<&PointVariances> {
        self.entries.get(&epoch)
    }

    /// Table keys, strictly increasing.
    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &PointVariances)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nearest key strictly below and strictly above `epoch`.
    fn bracket(&self, epoch: i64) -> Option<((i64, &PointVariances), (i64, &PointVariances))> {
        let low = self.entries.range(..epoch).next_back()?;
        let high = self.entries.range((Excluded(epoch), Unbounded)).next()?;
        Some(((*low.0, low.1), (*high.0, high.1)))
    }
}

/// Variance term structure of one surface.
#[derive(Debug, Clone)]
pub struct VarianceTermStructure {
    table: VarianceTable,
    /// Key of each tenor with smile data.
    expiries: BTreeMap<i64, i64>,
    weights: Arc<dyn WeightFunction>,
}

impl VarianceTermStructure {
    /// Expiry epoch of `days` for a surface whose effective date is `effective`.
    ///
    /// Expiries sit at the provider's 10:00 NY cut on the tenor's day.
    pub fn expiry_epoch(
        calendar: &EffectiveDateCalculator,
        effective: DateTime<Utc>,
        days: i64,
    ) -> i64 {
        let eff_epoch = effective.timestamp();
        let offset = i64::from(calendar.ny_offset_hours_at(eff_epoch));
        let seconds_after_midnight =
            (eff_epoch + (EXPIRY_ANCHOR_HOUR_NY - offset) * 3600).rem_euclid(SECONDS_PER_DAY);
        eff_epoch + seconds_after_midnight + days * SECONDS_PER_DAY
    }

    pub fn build(
        raw: &RawSurface,
        recorded: DateTime<Utc>,
        effective: DateTime<Utc>,
        calendar: &EffectiveDateCalculator,
        weights: Arc<dyn WeightFunction>,
    ) -> Self {
        let recorded_epoch = recorded.timestamp();
        let mut entries: BTreeMap<i64, PointVariances> = BTreeMap::new();
        let mut expiries = BTreeMap::new();
        let mut all_points: Vec<SmilePoint> = Vec::new();

        for (days, smile) in raw.smiles() {
            let key = Self::expiry_epoch(calendar, effective, days);
            let duration_days = (key - recorded_epoch) as f64 / SECONDS_PER_DAY as f64;
            let variances: PointVariances = smile
                .iter()
                .map(|(point, vol)| (*point, vol * vol * duration_days))
                .collect();
            all_points.extend(smile.keys().copied());
            entries.insert(key, variances);
            expiries.insert(days, key);
        }

        // Zero-time boundary at the recorded instant.
        let zero: PointVariances = all_points.into_iter().map(|p| (p, 0.0)).collect();
        entries.insert(recorded_epoch, zero);

        debug!(
            "built variance table with {} entries from {} tenors",
            entries.len(),
            expiries.len()
        );

        Self {
            table: VarianceTable { entries },
            expiries,
            weights,
        }
    }

    pub fn table(&self) -> &VarianceTable {
        &self.table
    }

    /// Table key of the tenor `days`, if it carries smile data.
    pub fn expiry_for(&self, days: i64) -> Option<i64> {
        self.expiries.get(&days).copied()
    }

    /// `(tenor days, expiry epoch)` in increasing tenor order.
    pub fn expiries(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.expiries.iter().map(|(d, e)| (*d, *e))
    }

    pub fn weights(&self) -> &Arc<dyn WeightFunction> {
        &self.weights
    }

    /// Weighted days between two epochs.
    pub fn weight(&self, from: i64, to: i64) -> Result<f64> {
        weight_between(self.weights.as_ref(), from, to)
    }

    /// Variance per smile point at `epoch`.
    ///
    /// Exact table keys are returned as stored. Other instants are
    /// interpolated linearly in weighted time between the nearest keys below
    /// and above; instants outside the table fail.
    pub fn variances_at(&self, epoch: i64) -> Result<PointVariances> {
        if let Some(exact) = self.table.get(epoch) {
            return Ok(exact.clone());
        }
        if self.table.len() < 2 {
            return Err(SurfaceError::term_structure(format!(
                "{} variance entries, need at least 2",
                self.table.len()
            ))
            .into());
        }
        let ((low_key, low), (high_key, high)) = self.table.bracket(epoch).ok_or_else(|| {
            SurfaceError::term_structure(format!(
                "epoch {epoch} is outside the variance table"
            ))
        })?;

        let w1 = self.weight(low_key, epoch)?;
        let w2 = w1 + self.weight(epoch, high_key)?;
        let (w1, w2) = if w2 > 0.0 {
            (w1, w2)
        } else {
            // Nothing weighs anything in this window: fall back to calendar time.
            ((epoch - low_key) as f64, (high_key - low_key) as f64)
        };

        Ok(low
            .iter()
            .filter_map(|(point, v_low)| {
                high.get(point)
                    .map(|v_high| (*point, v_low + (v_high - v_low) / w2 * w1))
            })
            .collect())
    }
}
