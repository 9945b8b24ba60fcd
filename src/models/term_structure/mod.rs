//! Variance term structure
//!
//! Converts discrete tenor smiles into cumulative variance keyed by absolute
//! time, and interpolates variance between keys in weighted time. The weight
//! function is pluggable so that trading-calendar conventions can discount
//! non-trading days.

pub mod variance;
pub mod weight;

pub use variance::*;
pub use weight::*;
