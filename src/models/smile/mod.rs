//! Smile interpolation and smile-shape metrics.

pub mod interp;
pub mod metrics;

pub use interp::*;
pub use metrics::*;
