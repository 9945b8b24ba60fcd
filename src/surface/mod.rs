//! The volatility surface aggregate.
//!
//! A [`VolSurface`] owns the raw quotes and everything derived from them.
//! Derived data (effective date, variance table, tenor and point lists) is
//! built on first access and cached for the lifetime of the surface. Queries
//! only read that data; the one mutable piece is the recorded validation
//! failure, which is written at most once.

mod query;

pub use query::VolQuery;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::dates::{epoch_to_datetime, EffectiveDateCalculator, SECONDS_PER_DAY};
use crate::error::SurfaceError;
use crate::market::{
    FlatRateCurve, PointVariances, RateCurve, RawSurface, Smile, SmilePoint, SurfaceType,
    Underlying,
};
use crate::models::delta::{AtmVolSource, DeltaConverter, StrikeToDelta};
use crate::models::smile::{interpolate, rr_bf_for_smile, smile_from_variances, smile_issue, RrBf};
use crate::models::term_structure::{
    UniformWeights, VarianceTable, VarianceTermStructure, WeightFunction,
};
use crate::validation::{run_checks, ValidationCheck, ValidationConfig, ValidationContext};

/// Volatility returned for a window that starts before the surface was
/// recorded or has no length.
pub const DEGENERATE_WINDOW_VOL: f64 = 0.01;

/// Market-implied volatility surface of one underlying at one instant.
#[derive(Debug)]
pub struct VolSurface {
    surface_type: SurfaceType,
    recorded: DateTime<Utc>,
    underlying: Underlying,
    raw: RawSurface,
    r_rates: Arc<dyn RateCurve>,
    q_rates: Arc<dyn RateCurve>,
    calendar: EffectiveDateCalculator,
    weights: Arc<dyn WeightFunction>,
    config: ValidationConfig,

    effective_date: OnceLock<DateTime<Utc>>,
    term_structure: OnceLock<VarianceTermStructure>,
    term_by_day: OnceLock<Vec<i64>>,
    smile_points: OnceLock<Vec<SmilePoint>>,
    spread_points: OnceLock<Vec<SmilePoint>>,

    validation: Mutex<Option<SurfaceError>>,
}

impl VolSurface {
    /// Create a surface with zero rates, uniform time weights, a private
    /// offset cache and the production validation limits.
    pub fn new(
        surface_type: SurfaceType,
        recorded: DateTime<Utc>,
        underlying: Underlying,
        raw: RawSurface,
    ) -> Self {
        Self {
            surface_type,
            recorded,
            underlying,
            raw,
            r_rates: Arc::new(FlatRateCurve::new(0.0)),
            q_rates: Arc::new(FlatRateCurve::new(0.0)),
            calendar: EffectiveDateCalculator::new(),
            weights: Arc::new(UniformWeights),
            config: ValidationConfig::production(),
            effective_date: OnceLock::new(),
            term_structure: OnceLock::new(),
            term_by_day: OnceLock::new(),
            smile_points: OnceLock::new(),
            spread_points: OnceLock::new(),
            validation: Mutex::new(None),
        }
    }

    /// Interest rate curve `r` and dividend / foreign rate curve `q`.
    pub fn with_rates(mut self, r_rates: Arc<dyn RateCurve>, q_rates: Arc<dyn RateCurve>) -> Self {
        self.r_rates = r_rates;
        self.q_rates = q_rates;
        self
    }

    /// Share a calculator (and its offset cache) with other surfaces.
    pub fn with_calendar(mut self, calendar: EffectiveDateCalculator) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_weights(mut self, weights: Arc<dyn WeightFunction>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    // --------------------------------------------------------------------
    // Inputs
    // --------------------------------------------------------------------

    pub fn surface_type(&self) -> SurfaceType {
        self.surface_type
    }

    pub fn recorded(&self) -> DateTime<Utc> {
        self.recorded
    }

    pub fn underlying(&self) -> &Underlying {
        &self.underlying
    }

    pub fn raw(&self) -> &RawSurface {
        &self.raw
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn delta_converter(&self) -> DeltaConverter<'_> {
        DeltaConverter::new(&self.underlying, self.r_rates.as_ref(), self.q_rates.as_ref())
    }

    // --------------------------------------------------------------------
    // Derived data
    // --------------------------------------------------------------------

    /// Trading day the surface belongs to under the 17:00 NY rollover.
    pub fn effective_date(&self) -> DateTime<Utc> {
        *self.effective_date.get_or_init(|| {
            let effective = self.calendar.effective_date_for(self.recorded);
            debug!(
                "{} surface recorded {} is effective {}",
                self.underlying.symbol, self.recorded, effective
            );
            effective
        })
    }

    pub fn term_structure(&self) -> &VarianceTermStructure {
        self.term_structure.get_or_init(|| {
            VarianceTermStructure::build(
                &self.raw,
                self.recorded,
                self.effective_date(),
                &self.calendar,
                Arc::clone(&self.weights),
            )
        })
    }

    pub fn variance_table(&self) -> &VarianceTable {
        self.term_structure().table()
    }

    /// Tenors with smile data, strictly increasing.
    pub fn term_by_day(&self) -> &[i64] {
        self.term_by_day
            .get_or_init(|| self.raw.smiles().map(|(days, _)| days).collect())
    }

    /// Every smile point quoted on any tenor, ascending.
    pub fn smile_points(&self) -> &[SmilePoint] {
        self.smile_points.get_or_init(|| {
            let points: BTreeSet<SmilePoint> = self
                .raw
                .smiles()
                .flat_map(|(_, smile)| smile.keys().copied())
                .collect();
            points.into_iter().collect()
        })
    }

    /// Every spread point quoted on any tenor, ascending.
    pub fn spread_points(&self) -> &[SmilePoint] {
        self.spread_points.get_or_init(|| {
            let points: BTreeSet<SmilePoint> = self
                .raw
                .spreads()
                .flat_map(|(_, spread)| spread.keys().copied())
                .collect();
            points.into_iter().collect()
        })
    }

    /// Expiry instant of every tenor with smile data, in tenor order.
    pub fn get_smile_expiries(&self) -> Result<Vec<DateTime<Utc>>> {
        self.term_structure()
            .expiries()
            .map(|(_, epoch)| epoch_to_datetime(epoch))
            .collect()
    }

    // --------------------------------------------------------------------
    // Queries
    // --------------------------------------------------------------------

    pub fn variances_at(&self, date: DateTime<Utc>) -> Result<PointVariances> {
        self.term_structure().variances_at(date.timestamp())
    }

    /// Forward smile between two instants:
    /// `sqrt((variance_to - variance_from) / calendar_days)` per point.
    ///
    /// The result is not checked; see [`VolSurface::get_smile`].
    pub fn smile_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Smile> {
        let seconds = to.timestamp() - from.timestamp();
        if seconds <= 0 {
            return Err(SurfaceError::input(format!(
                "smile window must have positive length, got {from} to {to}"
            ))
            .into());
        }
        let days = seconds as f64 / SECONDS_PER_DAY as f64;
        let v_from = self.variances_at(from)?;
        let v_to = self.variances_at(to)?;
        Ok(smile_from_variances(&v_from, &v_to, days))
    }

    /// Forward smile between two instants. A smile with a volatility that is
    /// not a number or is out of range marks the surface invalid, and is
    /// still returned.
    pub fn get_smile(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Smile> {
        let smile = self.smile_between(from, to)?;
        if let Some(issue) = smile_issue(&smile, self.config.min_vol, self.config.max_vol) {
            self.record_failure(SurfaceError::validation(
                ValidationCheck::ForwardSmile,
                format!("smile between {from} and {to}: {issue}"),
            ));
        }
        Ok(smile)
    }

    /// Quoted smile of tenor `days`; empty when the tenor is absent.
    pub fn get_surface_smile(&self, days: i64) -> Smile {
        self.raw
            .get(days)
            .map(|quotes| quotes.smile.clone())
            .unwrap_or_default()
    }

    pub fn get_rr_bf_for_smile(&self, smile: &Smile) -> Result<RrBf> {
        rr_bf_for_smile(smile)
    }

    /// Risk reversal and butterfly of the quoted smile of tenor `days`.
    pub fn get_market_rr_bf(&self, days: i64) -> Result<RrBf> {
        let smile = self.get_surface_smile(days);
        if smile.is_empty() {
            return Err(SurfaceError::input(format!("no smile quoted for tenor {days}d")).into());
        }
        rr_bf_for_smile(&smile)
    }

    /// Spread at `point` for tenor `days`.
    ///
    /// Quoted tenors are interpolated across the smile axis only. Between
    /// quoted tenors the spread is linear in days; beyond them it is flat.
    pub fn get_spread(&self, point: f64, days: i64) -> Result<f64> {
        let spreads: Vec<(i64, &Smile)> = self.raw.spreads().collect();
        if spreads.is_empty() {
            return Err(SurfaceError::input("surface has no spread quotes").into());
        }
        let idx = spreads.partition_point(|(d, _)| *d < days);
        if idx < spreads.len() && spreads[idx].0 == days {
            return interpolate(spreads[idx].1, point);
        }
        if idx == 0 {
            return interpolate(spreads[0].1, point);
        }
        if idx == spreads.len() {
            return interpolate(spreads[idx - 1].1, point);
        }

        let (low_days, low) = spreads[idx - 1];
        let (high_days, high) = spreads[idx];
        let s_low = interpolate(low, point)?;
        let s_high = interpolate(high, point)?;
        let w = (days - low_days) as f64 / (high_days - low_days) as f64;
        Ok(s_low + (s_high - s_low) * w)
    }

    /// Volatility for a smile coordinate over `[from, to]`.
    ///
    /// Malformed queries fail with [`SurfaceError::InvalidInput`]. A window
    /// starting before the recorded instant, or an empty one, returns
    /// [`DEGENERATE_WINDOW_VOL`] and marks the surface invalid.
    pub fn get_volatility(&self, query: &VolQuery) -> Result<f64> {
        if query.coordinate_count() != 1 {
            return Err(SurfaceError::input(
                "exactly one of delta, strike or moneyness must be given",
            )
            .into());
        }
        if query.moneyness.is_some() && query.spot.is_none() {
            return Err(SurfaceError::input("moneyness query needs a spot").into());
        }
        if query.strike.is_some() && query.spot.is_none() && self.surface_type != SurfaceType::Flat
        {
            return Err(SurfaceError::input(format!(
                "strike query on a {} surface needs a spot",
                self.surface_type
            ))
            .into());
        }
        if query.to < query.from {
            return Err(SurfaceError::input(format!(
                "window ends at {} before it starts at {}",
                query.to, query.from
            ))
            .into());
        }
        if query.from < self.recorded || query.from == query.to {
            self.record_failure(SurfaceError::validation(
                ValidationCheck::PricingWindow,
                format!(
                    "volatility requested for {} to {} on a surface recorded {}",
                    query.from, query.to, self.recorded
                ),
            ));
            return Ok(DEGENERATE_WINDOW_VOL);
        }

        let point = self.resolve_point(query)?;
        let smile = self.get_smile(query.from, query.to)?;
        interpolate(&smile, point)
    }

    /// Translate the query coordinate onto this surface's smile axis.
    fn resolve_point(&self, query: &VolQuery) -> Result<f64> {
        match self.surface_type {
            SurfaceType::Flat => match self.smile_points().first() {
                Some(point) => Ok(point.value()),
                None => Err(SurfaceError::input("flat surface has no smile point").into()),
            },
            SurfaceType::Delta => {
                if let Some(delta) = query.delta {
                    return Ok(delta);
                }
                let spot = query.spot.unwrap_or_default();
                let converter = self.delta_converter();
                match (query.strike, query.moneyness) {
                    (Some(strike), _) => converter.delta_from_strike(
                        StrikeToDelta {
                            strike,
                            spot,
                            from: query.from,
                            to: query.to,
                            t: None,
                        },
                        self,
                    ),
                    (None, Some(moneyness)) => converter.delta_from_moneyness(
                        moneyness, spot, query.from, query.to, self,
                    ),
                    (None, None) => Err(SurfaceError::input("no smile coordinate given").into()),
                }
            }
            SurfaceType::Moneyness => {
                if query.delta.is_some() {
                    return Err(
                        SurfaceError::input("delta queries need a delta surface").into()
                    );
                }
                if let Some(moneyness) = query.moneyness {
                    return Ok(moneyness);
                }
                let spot = query.spot.unwrap_or_default();
                if !(spot > 0.0 && spot.is_finite()) {
                    return Err(
                        SurfaceError::input(format!("spot must be positive, got {spot}")).into(),
                    );
                }
                let strike = query.strike.unwrap_or_default();
                Ok(strike / spot * 100.0)
            }
        }
    }

    // --------------------------------------------------------------------
    // Validation
    // --------------------------------------------------------------------

    /// Validate against the current time with no history.
    pub fn is_valid(&self) -> bool {
        self.validate(&ValidationContext::at(Utc::now()))
    }

    /// Run the check pipeline unless the surface is already invalid.
    /// Returns whether the surface is valid.
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> bool {
        if self.validation_failure().is_some() {
            return false;
        }
        match run_checks(self, ctx) {
            Ok(()) => true,
            Err(err) => {
                self.record_failure(err);
                false
            }
        }
    }

    /// Message of the recorded validation failure.
    pub fn validation_error(&self) -> Option<String> {
        self.validation_failure().map(|err| err.to_string())
    }

    pub fn validation_failure(&self) -> Option<SurfaceError> {
        self.validation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record `err` unless a failure is already recorded.
    fn record_failure(&self, err: SurfaceError) {
        let mut slot = self.validation.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            warn!(
                "{} {} surface recorded {} is invalid: {}",
                self.underlying.symbol, self.surface_type, self.recorded, err
            );
            *slot = Some(err);
        }
    }
}

impl AtmVolSource for VolSurface {
    fn atm_volatility(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<f64> {
        self.get_volatility(&VolQuery::delta(50.0, from, to))
    }
}
