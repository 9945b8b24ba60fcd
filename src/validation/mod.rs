//! Surface validation
//!
//! An ordered pipeline of independent checks. The first failure is recorded
//! on the surface and the remaining checks are skipped.

pub mod checks;
pub mod config;
pub mod pipeline;
pub mod types;

pub use checks::*;
pub use config::ValidationConfig;
pub use pipeline::{run_check, run_checks, CheckFn, STANDARD_CHECKS};
pub use types::{ValidationCheck, ValidationContext};
