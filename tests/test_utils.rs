#![allow(dead_code)] // Each test binary uses a different subset of the helpers

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use vol_surface::{
    smile_from_pairs, InstrumentType, RawSurface, SmilePoint, SurfaceType, TenorQuotes,
    Underlying, VolSurface,
};

pub const EURUSD_FIXTURE: &str = "tests/data/eurusd_delta_20240612.csv";
pub const SPX_FIXTURE: &str = "tests/data/spx_moneyness_20240612.csv";
pub const LENIENT_CONFIG: &str = "tests/data/validation_lenient.toml";

/// One quote of a fixture file.
#[derive(Debug, Deserialize)]
struct CsvRow {
    tenor_days: i64,
    /// "smile" or "spread"
    kind: String,
    point: f64,
    value: f64,
}

/// Load a raw surface from a `tenor_days,kind,point,value` CSV file.
pub fn load_raw_surface(file_path: &str) -> Result<RawSurface, Box<dyn std::error::Error>> {
    let mut reader = csv::Reader::from_path(file_path)?;
    let mut tenors: BTreeMap<i64, TenorQuotes> = BTreeMap::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        let quotes = tenors.entry(row.tenor_days).or_default();
        let target = match row.kind.as_str() {
            "smile" => &mut quotes.smile,
            "spread" => &mut quotes.spread,
            other => return Err(format!("unknown quote kind {other}").into()),
        };
        target.insert(SmilePoint(row.point), row.value);
    }

    let mut raw = RawSurface::new();
    for (days, quotes) in tenors {
        raw.insert(days, quotes);
    }
    Ok(raw)
}

/// Wednesday 2024-06-12 12:00 UTC (08:00 New York).
pub fn recorded() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap()
}

/// A validation time shortly after `recorded()`.
pub fn shortly_after() -> DateTime<Utc> {
    recorded() + Duration::minutes(10)
}

pub fn eurusd() -> Underlying {
    Underlying::new("EURUSD", "FX", InstrumentType::Forex)
}

pub fn equity() -> Underlying {
    Underlying::new("AAPL", "NASDAQ", InstrumentType::Equity)
}

pub fn eurusd_surface() -> VolSurface {
    let raw = load_raw_surface(EURUSD_FIXTURE).expect("Failed to load EURUSD fixture");
    VolSurface::new(SurfaceType::Delta, recorded(), eurusd(), raw)
}

pub fn spx_surface() -> VolSurface {
    let raw = load_raw_surface(SPX_FIXTURE).expect("Failed to load SPX fixture");
    let underlying = Underlying::new("SPX", "CBOE", InstrumentType::Index);
    VolSurface::new(SurfaceType::Moneyness, recorded(), underlying, raw)
}

/// Overnight and one-week EURUSD smiles.
pub fn on_1w_surface() -> VolSurface {
    let raw = RawSurface::new()
        .with_smile(1, &[(25.0, 0.2), (50.0, 0.4), (75.0, 0.7)])
        .with_smile(7, &[(25.0, 0.25), (50.0, 0.45), (75.0, 0.75)]);
    VolSurface::new(SurfaceType::Delta, recorded(), eurusd(), raw)
}

/// Delta surface with one flat smile per tenor.
pub fn flat_smiles(underlying: Underlying, recorded: DateTime<Utc>, tenors: &[(i64, f64)]) -> VolSurface {
    let mut raw = RawSurface::new();
    for &(days, vol) in tenors {
        raw.insert(
            days,
            TenorQuotes {
                smile: smile_from_pairs(&[(45.0, vol), (50.0, vol), (55.0, vol)]),
                ..TenorQuotes::default()
            },
        );
    }
    VolSurface::new(SurfaceType::Delta, recorded, underlying, raw)
}
