use chrono::{DateTime, Utc};

/// Arguments of [`VolSurface::get_volatility`](super::VolSurface::get_volatility).
///
/// Exactly one of `delta`, `strike` and `moneyness` must be set. `spot` is
/// required with `moneyness`, and with `strike` on delta and moneyness
/// surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolQuery {
    pub delta: Option<f64>,
    pub strike: Option<f64>,
    pub moneyness: Option<f64>,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub spot: Option<f64>,
}

impl VolQuery {
    fn window(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            delta: None,
            strike: None,
            moneyness: None,
            from,
            to,
            spot: None,
        }
    }

    pub fn delta(delta: f64, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            delta: Some(delta),
            ..Self::window(from, to)
        }
    }

    pub fn strike(strike: f64, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            strike: Some(strike),
            ..Self::window(from, to)
        }
    }

    pub fn moneyness(moneyness: f64, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            moneyness: Some(moneyness),
            ..Self::window(from, to)
        }
    }

    pub fn with_spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// How many smile coordinates are set.
    pub(crate) fn coordinate_count(&self) -> usize {
        [self.delta, self.strike, self.moneyness]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }
}
