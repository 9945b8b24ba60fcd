#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use anyhow::{Context, Result};

/// Thresholds of the validation pipeline.
///
/// Every field has a default, so a TOML file only needs to list the values it
/// overrides.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ValidationConfig {
    /// Maximum age of a surface, in seconds.
    #[cfg_attr(feature = "serde", serde(default = "default_max_age_secs"))]
    pub max_age_secs: i64,

    /// Longest tenor accepted, in days.
    #[cfg_attr(feature = "serde", serde(default = "default_max_tenor_days"))]
    pub max_tenor_days: i64,

    /// Forex surfaces must quote a tenor at or below this many days.
    #[cfg_attr(feature = "serde", serde(default = "default_max_forex_short_tenor_days"))]
    pub max_forex_short_tenor_days: i64,

    /// Largest allowed distance between adjacent smile coordinates.
    #[cfg_attr(feature = "serde", serde(default = "default_max_smile_point_gap"))]
    pub max_smile_point_gap: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub min_vol: f64,

    #[cfg_attr(feature = "serde", serde(default = "default_max_vol"))]
    pub max_vol: f64,

    /// Largest move between adjacent smile volatilities, relative to the
    /// volatility at the lower coordinate.
    #[cfg_attr(feature = "serde", serde(default = "default_max_relative_smile_jump"))]
    pub max_relative_smile_jump: f64,

    /// Tenors at or below this many days get `short_tenor_extra_allowance`.
    #[cfg_attr(feature = "serde", serde(default = "default_short_tenor_days"))]
    pub short_tenor_days: i64,

    #[cfg_attr(feature = "serde", serde(default = "default_short_tenor_extra_allowance"))]
    pub short_tenor_extra_allowance: f64,

    /// An unchanged surface whose predecessor is older than this is stale.
    #[cfg_attr(feature = "serde", serde(default = "default_stale_after_secs"))]
    pub stale_after_secs: i64,

    /// Absolute volatility move tolerated between consecutive surfaces.
    #[cfg_attr(feature = "serde", serde(default = "default_max_vol_jump_abs"))]
    pub max_vol_jump_abs: f64,

    /// Nominal spot used to turn smile points into strikes.
    #[cfg_attr(feature = "serde", serde(default = "default_admissibility_spot"))]
    pub admissibility_spot: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            max_tenor_days: default_max_tenor_days(),
            max_forex_short_tenor_days: default_max_forex_short_tenor_days(),
            max_smile_point_gap: default_max_smile_point_gap(),
            min_vol: 0.0,
            max_vol: default_max_vol(),
            max_relative_smile_jump: default_max_relative_smile_jump(),
            short_tenor_days: default_short_tenor_days(),
            short_tenor_extra_allowance: default_short_tenor_extra_allowance(),
            stale_after_secs: default_stale_after_secs(),
            max_vol_jump_abs: default_max_vol_jump_abs(),
            admissibility_spot: default_admissibility_spot(),
        }
    }
}

impl ValidationConfig {
    /// Thresholds used for live trading.
    pub fn production() -> Self {
        Self::default()
    }

    /// Looser limits for research on historical or illiquid surfaces.
    pub fn lenient() -> Self {
        Self {
            max_age_secs: i64::MAX,
            max_tenor_days: 3 * 365,
            max_forex_short_tenor_days: 31,
            max_smile_point_gap: 50.0,
            max_relative_smile_jump: 1.0,
            short_tenor_extra_allowance: 0.5,
            max_vol_jump_abs: 0.10,
            ..Self::default()
        }
    }

    /// Relative smile jump allowed for a tenor of `days`.
    pub fn smile_jump_allowance(&self, days: i64) -> f64 {
        if days <= self.short_tenor_days {
            self.max_relative_smile_jump + self.short_tenor_extra_allowance
        } else {
            self.max_relative_smile_jump
        }
    }

    #[cfg(feature = "serde")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid validation config")
    }

    #[cfg(feature = "serde")]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading validation config {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}

fn default_max_age_secs() -> i64 {
    4 * 3600
}

fn default_max_tenor_days() -> i64 {
    380
}

fn default_max_forex_short_tenor_days() -> i64 {
    7
}

fn default_max_smile_point_gap() -> f64 {
    30.0
}

fn default_max_vol() -> f64 {
    5.0
}

fn default_max_relative_smile_jump() -> f64 {
    0.4
}

fn default_short_tenor_days() -> i64 {
    7
}

fn default_short_tenor_extra_allowance() -> f64 {
    0.2
}

fn default_stale_after_secs() -> i64 {
    15_000
}

fn default_max_vol_jump_abs() -> f64 {
    0.03
}

fn default_admissibility_spot() -> f64 {
    100.0
}
