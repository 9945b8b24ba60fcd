use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};

use super::offset_cache::NyOffsetCache;
use crate::error::SurfaceError;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// New York hour at which the trading day rolls over.
const ROLLOVER_HOUR_NY: i64 = 17;

/// Hours from the NY rollover to the following GMT midnight, before the
/// NY offset is applied.
const ROLLOVER_TO_GMT_MIDNIGHT: i64 = 24 - ROLLOVER_HOUR_NY;

/// Seconds since the Unix epoch as a UTC instant.
pub fn epoch_to_datetime(epoch: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(epoch, 0)
        .single()
        .ok_or_else(|| SurfaceError::input(format!("epoch {epoch} is out of range")).into())
}

/// Truncate an instant to its UTC midnight.
pub fn utc_midnight(date: DateTime<Utc>) -> DateTime<Utc> {
    let secs = date.timestamp();
    date - Duration::seconds(secs.rem_euclid(SECONDS_PER_DAY))
        - Duration::nanoseconds(i64::from(date.timestamp_subsec_nanos()))
}

/// Maps a recorded timestamp onto the GMT trading day it belongs to under the
/// 17:00 New York rollover convention.
#[derive(Debug, Clone, Default)]
pub struct EffectiveDateCalculator {
    offsets: Arc<NyOffsetCache>,
}

impl EffectiveDateCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an offset cache with other calculators.
    pub fn with_cache(offsets: Arc<NyOffsetCache>) -> Self {
        Self { offsets }
    }

    pub fn cache(&self) -> &Arc<NyOffsetCache> {
        &self.offsets
    }

    /// Signed hour offset of New York from GMT at `date`.
    pub fn ny_offset_hours(&self, date: DateTime<Utc>) -> i32 {
        self.offsets.offset_hours(date.timestamp())
    }

    /// Signed hour offset of New York from GMT at `epoch`.
    pub fn ny_offset_hours_at(&self, epoch: i64) -> i32 {
        self.offsets.offset_hours(epoch)
    }

    /// 17:00 New York on the UTC calendar day of `date`.
    pub fn rollover_time_on(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        let offset = i64::from(self.ny_offset_hours(date));
        utc_midnight(date) + Duration::hours(ROLLOVER_HOUR_NY - offset)
    }

    /// The GMT trading day (at midnight) that `date` belongs to.
    ///
    /// Anything recorded after the NY rollover but before GMT midnight is
    /// shifted onto the next day.
    pub fn effective_date_for(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        let offset = i64::from(self.ny_offset_hours(date));
        utc_midnight(date + Duration::hours(ROLLOVER_TO_GMT_MIDNIGHT + offset))
    }

    pub fn is_before_rollover(&self, date: DateTime<Utc>) -> bool {
        date <= self.rollover_time_on(date)
    }
}
