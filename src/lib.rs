//! # Vol-Surface: Market-Implied Volatility Surfaces
//!
//! `vol-surface` turns sparsely quoted implied volatilities, indexed by tenor and smile
//! coordinate, into a continuous volatility function of (time window, smile coordinate), and
//! certifies that the quoted grid is internally consistent and free of static and calendar
//! arbitrage.
//!
//! ## Core Features
//!
//! - **Variance Term Structure**: cumulative variance keyed by absolute time, interpolated in
//!   weighted time with a pluggable calendar weight
//! - **Smile Interpolation**: quadratic fit through the nearest quoted points, exact on quotes
//! - **Delta Conversion**: strike and moneyness to delta, plain or premium adjusted
//! - **Validation Pipeline**: ordered, short-circuiting structure, history and arbitrage checks
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use vol_surface::{
//!     InstrumentType, RawSurface, SurfaceType, Underlying, ValidationContext, VolQuery,
//!     VolSurface,
//! };
//!
//! let recorded = Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap();
//! let raw = RawSurface::new()
//!     .with_smile(1, &[(25.0, 0.20), (50.0, 0.40), (75.0, 0.70)])
//!     .with_smile(7, &[(25.0, 0.25), (50.0, 0.45), (75.0, 0.75)]);
//! let underlying = Underlying::new("EURUSD", "FX", InstrumentType::Forex);
//! let surface = VolSurface::new(SurfaceType::Delta, recorded, underlying, raw);
//!
//! let vol = surface.get_volatility(&VolQuery::delta(50.0, recorded, recorded + Duration::days(3)))?;
//! assert!(vol > 0.40 && vol < 0.45);
//!
//! let valid = surface.validate(&ValidationContext::at(recorded + Duration::minutes(5)));
//! println!("valid: {valid}, error: {:?}", surface.validation_error());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Validation Presets
//!
//! The library provides validation limit presets:
//! - `production()`: Limits used for live trading
//! - `lenient()`: Looser limits for historical and illiquid surfaces

// ================================================================================================
// MODULES
// ================================================================================================

pub mod dates;
pub mod error;
pub mod market;
pub mod models;
pub mod surface;
pub mod validation;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Errors
pub use error::SurfaceError;

// Market inputs
pub use market::{
    smile_from_pairs, FlatRateCurve, InstrumentType, PillarRateCurve, PointVariances, RateCurve,
    RawSurface, Smile, SmilePoint, SurfaceType, TenorQuotes, Underlying,
};

// Dates
pub use dates::{EffectiveDateCalculator, NyOffsetCache};

// Models
pub use models::bs::OptionType;
pub use models::smile::RrBf;
pub use models::term_structure::{UniformWeights, WeekendWeights, WeightFunction};

// Surface and validation
pub use surface::{VolQuery, VolSurface, DEGENERATE_WINDOW_VOL};
pub use validation::{ValidationCheck, ValidationConfig, ValidationContext};

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured validation limits for common use cases.
///
/// # Available Configurations
///
/// - [`production()`]: Limits used for live trading
/// - [`lenient()`]: Looser limits for research
pub mod default_configs {
    use crate::validation::ValidationConfig;

    /// Limits for surfaces feeding live pricing.
    ///
    /// **Characteristics:**
    /// - Surfaces older than 4 hours are rejected
    /// - Tenors up to 380 days
    /// - Adjacent smile volatilities may differ by 40% (60% up to one week)
    /// - Volatility may move 3 vol points between consecutive surfaces
    ///
    /// # Example
    ///
    /// ```rust
    /// use vol_surface::default_configs;
    ///
    /// let config = default_configs::production();
    /// assert_eq!(config.max_age_secs, 4 * 3600);
    /// ```
    pub fn production() -> ValidationConfig {
        ValidationConfig::production()
    }

    /// Limits for research on historical or illiquid surfaces.
    ///
    /// **Characteristics:**
    /// - No age limit
    /// - Tenors up to three years
    /// - Wider smile and jump tolerances
    ///
    /// **Use Cases:**
    /// - Backtesting on stored surfaces
    /// - Inspecting thinly quoted underlyings
    ///
    /// # Example
    ///
    /// ```rust
    /// use vol_surface::default_configs;
    ///
    /// let config = default_configs::lenient();
    /// assert!(config.max_tenor_days > 380);
    /// ```
    pub fn lenient() -> ValidationConfig {
        ValidationConfig::lenient()
    }
}
