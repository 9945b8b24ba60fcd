use log::debug;

use super::checks::{
    check_admissibility, check_age, check_calendar, check_identical_surface,
    check_smile_consistency, check_structure, check_volatility_jump,
};
use super::types::{ValidationCheck, ValidationContext};
use crate::error::SurfaceError;
use crate::surface::VolSurface;

/// Signature shared by every check.
pub type CheckFn = fn(&VolSurface, &ValidationContext<'_>) -> Result<(), SurfaceError>;

/// Checks in the order they run. Later checks assume the earlier ones passed.
pub const STANDARD_CHECKS: [(ValidationCheck, CheckFn); 7] = [
    (ValidationCheck::Age, check_age),
    (ValidationCheck::Structure, check_structure),
    (ValidationCheck::SmileConsistency, check_smile_consistency),
    (ValidationCheck::IdenticalSurface, check_identical_surface),
    (ValidationCheck::VolatilityJump, check_volatility_jump),
    (ValidationCheck::Calendar, check_calendar),
    (ValidationCheck::Admissibility, check_admissibility),
];

/// Run a single named check. Query-time checks have no standalone form and
/// always pass here.
pub fn run_check(
    check: ValidationCheck,
    surface: &VolSurface,
    ctx: &ValidationContext<'_>,
) -> Result<(), SurfaceError> {
    match STANDARD_CHECKS.iter().find(|(c, _)| *c == check) {
        Some((_, f)) => f(surface, ctx),
        None => Ok(()),
    }
}

/// Run the standard checks in order, stopping at the first failure.
pub fn run_checks(surface: &VolSurface, ctx: &ValidationContext<'_>) -> Result<(), SurfaceError> {
    for (check, f) in STANDARD_CHECKS.iter() {
        f(surface, ctx)?;
        debug!("{} check passed for {}", check, surface.underlying().symbol);
    }
    Ok(())
}
