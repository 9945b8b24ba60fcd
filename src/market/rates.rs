use std::fmt::Debug;

use anyhow::Result;

use crate::error::SurfaceError;

/// Interest or dividend/foreign rate lookup by year fraction.
pub trait RateCurve: Send + Sync + Debug {
    /// Continuously compounded rate for maturity `t`, interpolated between
    /// pillars.
    fn interest_rate_for(&self, t: f64) -> f64;

    /// Rate of the pillar nearest to `t`.
    fn nearest_rate_for(&self, t: f64) -> f64 {
        self.interest_rate_for(t)
    }
}

/// A single rate for every maturity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRateCurve {
    pub rate: f64,
}

impl FlatRateCurve {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl RateCurve for FlatRateCurve {
    fn interest_rate_for(&self, _t: f64) -> f64 {
        self.rate
    }
}

/// Rates quoted at `(year fraction, rate)` pillars.
///
/// Linear between pillars, flat beyond the first and last pillar.
#[derive(Debug, Clone, PartialEq)]
pub struct PillarRateCurve {
    pillars: Vec<(f64, f64)>,
}

impl PillarRateCurve {
    pub fn new(mut pillars: Vec<(f64, f64)>) -> Result<Self> {
        if pillars.is_empty() {
            return Err(SurfaceError::input("rate curve needs at least one pillar").into());
        }
        if pillars
            .iter()
            .any(|(t, r)| !t.is_finite() || !r.is_finite())
        {
            return Err(SurfaceError::input("rate curve pillars must be finite").into());
        }
        pillars.sort_by(|a, b| a.0.total_cmp(&b.0));
        if pillars.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(SurfaceError::input("duplicate rate curve pillar").into());
        }
        Ok(Self { pillars })
    }

    pub fn pillars(&self) -> &[(f64, f64)] {
        &self.pillars
    }
}

impl RateCurve for PillarRateCurve {
    fn interest_rate_for(&self, t: f64) -> f64 {
        let first = self.pillars[0];
        let last = self.pillars[self.pillars.len() - 1];
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        let idx = self.pillars.partition_point(|(pt, _)| *pt < t);
        let (t0, r0) = self.pillars[idx - 1];
        let (t1, r1) = self.pillars[idx];
        r0 + (r1 - r0) * (t - t0) / (t1 - t0)
    }

    fn nearest_rate_for(&self, t: f64) -> f64 {
        self.pillars
            .iter()
            .min_by(|a, b| (a.0 - t).abs().total_cmp(&(b.0 - t).abs()))
            .map(|(_, r)| *r)
            .unwrap_or(0.0)
    }
}
