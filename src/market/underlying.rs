/// Instrument class of an underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InstrumentType {
    Forex,
    Equity,
    Index,
    Commodity,
}

/// Currency pairs whose vanilla options are quoted with premium-adjusted
/// deltas (premium paid in the base currency).
pub const PREMIUM_ADJUSTED_PAIRS: &[&str] = &[
    "USDJPY", "USDCHF", "USDCAD", "USDSEK", "USDNOK", "USDDKK", "USDPLN", "USDHUF", "USDCZK",
    "USDMXN", "USDBRL", "USDZAR", "USDTRY", "USDSGD", "USDHKD", "USDCNH", "USDKRW", "USDINR",
    "EURJPY", "EURCHF", "EURGBP", "EURSEK", "EURNOK", "EURPLN", "GBPJPY", "AUDJPY", "NZDJPY",
    "CADJPY", "CHFJPY",
];

/// Whether `symbol` is in the premium-adjusted classification table.
///
/// Separators are ignored, so `USD/JPY`, `usd-jpy` and `USDJPY` all match.
pub fn is_premium_adjusted_pair(symbol: &str) -> bool {
    let normalized: String = symbol
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    PREMIUM_ADJUSTED_PAIRS.contains(&normalized.as_str())
}

/// The instrument a surface is quoted on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Underlying {
    pub symbol: String,
    pub market: String,
    pub instrument_type: InstrumentType,
    /// Deltas on this underlying are premium adjusted.
    pub premium_adjusted: bool,
    /// Only quanto products trade on this underlying; an unchanged surface is
    /// not treated as stale.
    #[cfg_attr(feature = "serde", serde(default))]
    pub quanto_only: bool,
}

impl Underlying {
    /// Create an underlying, classifying premium adjustment from the symbol
    /// for forex pairs.
    pub fn new(
        symbol: impl Into<String>,
        market: impl Into<String>,
        instrument_type: InstrumentType,
    ) -> Self {
        let symbol = symbol.into();
        let premium_adjusted =
            instrument_type == InstrumentType::Forex && is_premium_adjusted_pair(&symbol);
        Self {
            symbol,
            market: market.into(),
            instrument_type,
            premium_adjusted,
            quanto_only: false,
        }
    }

    pub fn with_premium_adjusted(mut self, premium_adjusted: bool) -> Self {
        self.premium_adjusted = premium_adjusted;
        self
    }

    pub fn with_quanto_only(mut self, quanto_only: bool) -> Self {
        self.quanto_only = quanto_only;
        self
    }

    pub fn is_forex(&self) -> bool {
        self.instrument_type == InstrumentType::Forex
    }
}
