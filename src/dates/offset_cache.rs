use chrono::{Offset, TimeZone, Utc};
use chrono_tz::America::New_York;
use dashmap::DashMap;
use log::trace;

/// New York standard-time offset, used only if an instant cannot be
/// represented by chrono.
const NY_STANDARD_OFFSET_HOURS: i32 = -5;

const SECONDS_PER_HOUR: i64 = 3600;

/// Hour-granularity cache of the America/New_York offset from GMT.
///
/// Keys are `epoch / 3600`. DST transitions happen on whole UTC hours, so a
/// single lookup is valid for the entire hour. The map is bounded: once
/// `capacity` entries are held it is cleared before the next insert.
/// Concurrent misses on the same key compute identical values.
#[derive(Debug)]
pub struct NyOffsetCache {
    offsets: DashMap<i64, i32>,
    capacity: usize,
}

impl NyOffsetCache {
    /// Two years of hourly keys.
    pub const DEFAULT_CAPACITY: usize = 2 * 366 * 24;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            offsets: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Signed hour offset of New York from GMT at `epoch` (e.g. -4 in summer).
    pub fn offset_hours(&self, epoch: i64) -> i32 {
        let key = epoch.div_euclid(SECONDS_PER_HOUR);
        if let Some(cached) = self.offsets.get(&key) {
            return *cached;
        }

        let offset = compute_offset_hours(key * SECONDS_PER_HOUR);
        trace!("NY offset cache miss for hour {key}: {offset}h");
        if self.offsets.len() >= self.capacity {
            self.offsets.clear();
        }
        self.offsets.insert(key, offset);
        offset
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for NyOffsetCache {
    fn default() -> Self {
        Self::new()
    }
}

fn compute_offset_hours(epoch: i64) -> i32 {
    match Utc.timestamp_opt(epoch, 0).single() {
        Some(instant) => {
            New_York
                .offset_from_utc_datetime(&instant.naive_utc())
                .fix()
                .local_minus_utc()
                / 3600
        }
        None => NY_STANDARD_OFFSET_HOURS,
    }
}
