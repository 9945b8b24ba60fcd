use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A coordinate on the smile axis: a delta (0-100), a moneyness percentage,
/// or the single fixed point of a flat surface.
///
/// Ordered with `f64::total_cmp` so it can key a `BTreeMap`.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SmilePoint(pub f64);

impl SmilePoint {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for SmilePoint {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SmilePoint {}

impl PartialOrd for SmilePoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SmilePoint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for SmilePoint {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SmilePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Volatility (or spread) per smile point for one maturity.
pub type Smile = BTreeMap<SmilePoint, f64>;

/// Variance per smile point at one instant.
pub type PointVariances = BTreeMap<SmilePoint, f64>;

/// Build a [`Smile`] from `(point, value)` pairs.
pub fn smile_from_pairs(pairs: &[(f64, f64)]) -> Smile {
    pairs
        .iter()
        .map(|&(point, value)| (SmilePoint(point), value))
        .collect()
}

/// Which axis the smile coordinates live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SurfaceType {
    Delta,
    Moneyness,
    Flat,
}

impl SurfaceType {
    /// Nominal at-the-money coordinate for this surface type.
    pub fn nominal_atm(self) -> Option<f64> {
        match self {
            SurfaceType::Delta => Some(50.0),
            SurfaceType::Moneyness => Some(100.0),
            SurfaceType::Flat => None,
        }
    }

    /// The ATM point of `smile`: the nominal ATM when quoted, otherwise the
    /// quoted point nearest to it (the sole point for flat surfaces).
    pub fn atm_point(self, smile: &Smile) -> Option<SmilePoint> {
        let atm = match self.nominal_atm() {
            Some(atm) => atm,
            None => return smile.keys().next().copied(),
        };
        if smile.contains_key(&SmilePoint(atm)) {
            return Some(SmilePoint(atm));
        }
        smile
            .keys()
            .min_by(|a, b| (a.0 - atm).abs().total_cmp(&(b.0 - atm).abs()))
            .copied()
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceType::Delta => "delta",
            SurfaceType::Moneyness => "moneyness",
            SurfaceType::Flat => "flat",
        };
        f.write_str(name)
    }
}

/// Quotes for a single tenor.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TenorQuotes {
    #[cfg_attr(feature = "serde", serde(default))]
    pub smile: Smile,
    #[cfg_attr(feature = "serde", serde(default))]
    pub spread: Smile,
}

/// Tenor (integer days) to smile and spread quotes, as received from the
/// provider.
///
/// Tenors are signed so that malformed provider data can be represented and
/// rejected by validation rather than at deserialization.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RawSurface {
    tenors: BTreeMap<i64, TenorQuotes>,
}

impl RawSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the smile quoted for `days`.
    pub fn with_smile(mut self, days: i64, pairs: &[(f64, f64)]) -> Self {
        self.tenors.entry(days).or_default().smile = smile_from_pairs(pairs);
        self
    }

    /// Add (or replace) the spread quoted for `days`.
    pub fn with_spread(mut self, days: i64, pairs: &[(f64, f64)]) -> Self {
        self.tenors.entry(days).or_default().spread = smile_from_pairs(pairs);
        self
    }

    pub fn insert(&mut self, days: i64, quotes: TenorQuotes) {
        self.tenors.insert(days, quotes);
    }

    pub fn get(&self, days: i64) -> Option<&TenorQuotes> {
        self.tenors.get(&days)
    }

    pub fn is_empty(&self) -> bool {
        self.tenors.is_empty()
    }

    /// All tenors in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &TenorQuotes)> {
        self.tenors.iter().map(|(days, quotes)| (*days, quotes))
    }

    /// Tenors carrying smile data, in increasing order.
    pub fn smiles(&self) -> impl Iterator<Item = (i64, &Smile)> {
        self.iter()
            .filter(|(_, quotes)| !quotes.smile.is_empty())
            .map(|(days, quotes)| (days, &quotes.smile))
    }

    /// Tenors carrying spread data, in increasing order.
    pub fn spreads(&self) -> impl Iterator<Item = (i64, &Smile)> {
        self.iter()
            .filter(|(_, quotes)| !quotes.spread.is_empty())
            .map(|(days, quotes)| (days, &quotes.spread))
    }
}
