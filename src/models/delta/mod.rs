//! Strike and moneyness to delta conversion for delta-quoted surfaces.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::dates::SECONDS_PER_DAY;
use crate::error::SurfaceError;
use crate::market::{RateCurve, Underlying};
use crate::models::bs::delta_point_from_strike;

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Source of the ATM volatility used to evaluate delta for a strike.
pub trait AtmVolSource {
    fn atm_volatility(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<f64>;
}

/// Inputs of a strike to delta conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeToDelta {
    pub strike: f64,
    pub spot: f64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Year fraction; derived from `from`/`to` when absent.
    pub t: Option<f64>,
}

/// ACT/365 year fraction between two instants.
pub fn year_fraction(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to.timestamp() - from.timestamp()) as f64 / (DAYS_PER_YEAR * SECONDS_PER_DAY as f64)
}

/// `spot × moneyness / 100`.
pub fn strike_from_moneyness(moneyness: f64, spot: f64) -> f64 {
    spot * moneyness / 100.0
}

/// Converts strikes into the 0-100 delta coordinate of a surface.
#[derive(Debug, Clone, Copy)]
pub struct DeltaConverter<'a> {
    underlying: &'a Underlying,
    r_rates: &'a dyn RateCurve,
    q_rates: &'a dyn RateCurve,
}

impl<'a> DeltaConverter<'a> {
    pub fn new(
        underlying: &'a Underlying,
        r_rates: &'a dyn RateCurve,
        q_rates: &'a dyn RateCurve,
    ) -> Self {
        Self {
            underlying,
            r_rates,
            q_rates,
        }
    }

    /// `(r, q)` for maturity `t`. The foreign rate of an FX pair is
    /// interpolated; dividend yields use the nearest pillar.
    pub fn rates_for(&self, t: f64) -> (f64, f64) {
        let r = self.r_rates.interest_rate_for(t);
        let q = if self.underlying.is_forex() {
            self.q_rates.interest_rate_for(t)
        } else {
            self.q_rates.nearest_rate_for(t)
        };
        (r, q)
    }

    pub fn delta_from_strike(&self, args: StrikeToDelta, atm: &dyn AtmVolSource) -> Result<f64> {
        if !(args.strike > 0.0 && args.strike.is_finite()) {
            return Err(
                SurfaceError::input(format!("strike must be positive, got {}", args.strike)).into(),
            );
        }
        if !(args.spot > 0.0 && args.spot.is_finite()) {
            return Err(
                SurfaceError::input(format!("spot must be positive, got {}", args.spot)).into(),
            );
        }
        let t = args.t.unwrap_or_else(|| year_fraction(args.from, args.to));
        if t <= 0.0 {
            return Err(SurfaceError::input(format!("time to expiry must be positive, got {t}")).into());
        }

        let (r, q) = self.rates_for(t);
        let atm_vol = atm.atm_volatility(args.from, args.to)?;
        let delta = delta_point_from_strike(
            args.spot,
            args.strike,
            r,
            q,
            t,
            atm_vol,
            self.underlying.premium_adjusted,
        );
        if !(delta > 0.0) {
            return Err(SurfaceError::input(format!(
                "strike {} converts to non-positive delta {delta}",
                args.strike
            ))
            .into());
        }
        Ok(delta)
    }

    pub fn delta_from_moneyness(
        &self,
        moneyness: f64,
        spot: f64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        atm: &dyn AtmVolSource,
    ) -> Result<f64> {
        let args = StrikeToDelta {
            strike: strike_from_moneyness(moneyness, spot),
            spot,
            from,
            to,
            t: None,
        };
        self.delta_from_strike(args, atm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::{FlatRateCurve, InstrumentType, PillarRateCurve};
    use approx::assert_abs_diff_eq;
    use chrono::{Duration, TimeZone};

    struct FixedAtm(f64);

    impl AtmVolSource for FixedAtm {
        fn atm_volatility(&self, _from: DateTime<Utc>, _to: DateTime<Utc>) -> Result<f64> {
            Ok(self.0)
        }
    }

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let from = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
        (from, from + Duration::days(73))
    }

    #[test]
    fn moneyness_maps_to_strike() {
        assert_abs_diff_eq!(strike_from_moneyness(95.0, 1.2), 1.14, epsilon = 1e-12);
    }

    #[test]
    fn year_fraction_is_act_365() {
        let (from, to) = window();
        assert_abs_diff_eq!(year_fraction(from, to), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn spot_strike_is_near_fifty_delta() {
        let u = Underlying::new("EURUSD", "FX", InstrumentType::Forex);
        let zero = FlatRateCurve::new(0.0);
        let conv = DeltaConverter::new(&u, &zero, &zero);
        let (from, to) = window();
        let args = StrikeToDelta {
            strike: 1.10,
            spot: 1.10,
            from,
            to,
            t: None,
        };
        let delta = conv.delta_from_strike(args, &FixedAtm(0.1)).unwrap();
        // Call delta N(0.5 sigma sqrt(t)) is just above one half.
        assert!((delta - 50.0).abs() < 2.0);
    }

    #[test]
    fn higher_strike_has_lower_delta() {
        let u = Underlying::new("SPX", "CBOE", InstrumentType::Index);
        let zero = FlatRateCurve::new(0.0);
        let conv = DeltaConverter::new(&u, &zero, &zero);
        let (from, to) = window();
        let atm = FixedAtm(0.2);
        let low = conv.delta_from_moneyness(110.0, 100.0, from, to, &atm).unwrap();
        let lower = conv.delta_from_moneyness(120.0, 100.0, from, to, &atm).unwrap();
        assert!(lower < low && low < 50.0);
    }

    #[test]
    fn equity_dividends_use_nearest_pillar() {
        let r = FlatRateCurve::new(0.01);
        let q = PillarRateCurve::new(vec![(0.1, 0.02), (1.0, 0.04)]).unwrap();
        let equity = Underlying::new("AAPL", "NASDAQ", InstrumentType::Equity);
        let fx = Underlying::new("EURUSD", "FX", InstrumentType::Forex);
        assert_abs_diff_eq!(DeltaConverter::new(&equity, &r, &q).rates_for(0.2).1, 0.02);
        let interpolated = DeltaConverter::new(&fx, &r, &q).rates_for(0.2).1;
        assert!(interpolated > 0.02 && interpolated < 0.04);
    }

    #[test]
    fn deep_strike_fails_as_non_positive_delta() {
        let u = Underlying::new("SPX", "CBOE", InstrumentType::Index);
        let zero = FlatRateCurve::new(0.0);
        let conv = DeltaConverter::new(&u, &zero, &zero);
        let (from, to) = window();
        let args = StrikeToDelta {
            strike: 1.0e6,
            spot: 100.0,
            from,
            to,
            t: None,
        };
        assert!(conv.delta_from_strike(args, &FixedAtm(0.2)).is_err());
    }

    #[test]
    fn rejects_missing_time() {
        let u = Underlying::new("SPX", "CBOE", InstrumentType::Index);
        let zero = FlatRateCurve::new(0.0);
        let conv = DeltaConverter::new(&u, &zero, &zero);
        let (from, _) = window();
        let args = StrikeToDelta {
            strike: 100.0,
            spot: 100.0,
            from,
            to: from,
            t: None,
        };
        assert!(conv.delta_from_strike(args, &FixedAtm(0.2)).is_err());
    }
}
