mod test_utils;

use chrono::{DateTime, Duration, Utc};
use test_utils::{
    equity, eurusd, eurusd_surface, flat_smiles, load_raw_surface, recorded, shortly_after,
    EURUSD_FIXTURE, LENIENT_CONFIG,
};
use vol_surface::validation::{run_check, ValidationCheck};
use vol_surface::{
    default_configs, InstrumentType, RawSurface, SurfaceType, Underlying, ValidationConfig, ValidationContext,
    VolSurface,
};

fn delta_surface(underlying: Underlying, raw: RawSurface) -> VolSurface {
    VolSurface::new(SurfaceType::Delta, recorded(), underlying, raw)
}

/// Validate at `now` and return the failing check, if any.
fn failed_check(surface: &VolSurface, ctx: &ValidationContext<'_>) -> Option<ValidationCheck> {
    if surface.validate(ctx) {
        return None;
    }
    println!("Validation error: {:?}", surface.validation_error());
    surface.validation_failure().and_then(|err| err.check())
}

fn at<'a>(now: DateTime<Utc>) -> ValidationContext<'a> {
    ValidationContext::at(now)
}

// ------------------------------------------------------------------------------------------------
// Age
// ------------------------------------------------------------------------------------------------

#[test]
fn test_old_surface_fails_age_check() {
    let surface = eurusd_surface();
    let later = recorded() + Duration::hours(5);
    assert_eq!(failed_check(&surface, &at(later)), Some(ValidationCheck::Age));
    assert!(surface.validation_error().unwrap().contains("too old"));
}

#[test]
fn test_is_valid_uses_current_time() {
    // Recorded in 2024: long past the production age limit.
    let surface = eurusd_surface();
    assert!(!surface.is_valid());
    assert_eq!(
        surface.validation_failure().and_then(|e| e.check()),
        Some(ValidationCheck::Age)
    );
}

// ------------------------------------------------------------------------------------------------
// Structure
// ------------------------------------------------------------------------------------------------

#[test]
fn test_structure_requires_two_tenors() {
    let raw = RawSurface::new().with_smile(7, &[(25.0, 0.2), (50.0, 0.2), (75.0, 0.2)]);
    let surface = delta_surface(equity(), raw);
    assert_eq!(
        failed_check(&surface, &at(shortly_after())),
        Some(ValidationCheck::Structure)
    );
}

#[test]
fn test_structure_rejects_bad_tenors() {
    let smile = [(25.0, 0.2), (50.0, 0.2), (75.0, 0.2)];

    let too_long = delta_surface(
        equity(),
        RawSurface::new().with_smile(30, &smile).with_smile(400, &smile),
    );
    assert_eq!(
        failed_check(&too_long, &at(shortly_after())),
        Some(ValidationCheck::Structure)
    );

    let negative = delta_surface(
        equity(),
        RawSurface::new().with_smile(-1, &smile).with_smile(30, &smile),
    );
    assert_eq!(
        failed_check(&negative, &at(shortly_after())),
        Some(ValidationCheck::Structure)
    );
    assert!(negative.validation_error().unwrap().contains("negative"));
}

#[test]
fn test_forex_surface_needs_short_tenor() {
    let smile = [(25.0, 0.08), (50.0, 0.07), (75.0, 0.08)];
    let raw = || RawSurface::new().with_smile(30, &smile).with_smile(91, &smile);

    let fx = delta_surface(eurusd(), raw());
    assert_eq!(
        failed_check(&fx, &at(shortly_after())),
        Some(ValidationCheck::Structure)
    );

    // The same quotes on an equity are fine.
    let stock = delta_surface(equity(), raw());
    assert_eq!(failed_check(&stock, &at(shortly_after())), None);
}

#[test]
fn test_structure_rejects_bad_smiles() {
    let cases: [&[(f64, f64)]; 4] = [
        // Volatility above the maximum
        &[(25.0, 5.5), (50.0, 5.2), (75.0, 5.5)],
        // Not a number
        &[(25.0, 0.2), (50.0, f64::NAN), (75.0, 0.2)],
        // Points too far apart
        &[(10.0, 0.2), (50.0, 0.2), (90.0, 0.2)],
        // Volatility jump between adjacent points
        &[(25.0, 0.2), (50.0, 0.4), (75.0, 0.4)],
    ];
    for smile in cases {
        let raw = RawSurface::new()
            .with_smile(30, smile)
            .with_smile(91, &[(25.0, 0.2), (50.0, 0.2), (75.0, 0.2)]);
        let surface = delta_surface(equity(), raw);
        assert_eq!(
            failed_check(&surface, &at(shortly_after())),
            Some(ValidationCheck::Structure),
            "smile {smile:?} should fail the structure check"
        );
    }
}

#[test]
fn test_short_tenors_get_extra_smile_allowance() {
    // 50% relative jump: above 40%, within the short-tenor 60%.
    let steep = [(25.0, 0.20), (50.0, 0.30), (75.0, 0.30)];
    let flat = [(25.0, 0.30), (50.0, 0.30), (75.0, 0.30)];
    let ctx = at(shortly_after());

    let short = delta_surface(
        equity(),
        RawSurface::new().with_smile(7, &steep).with_smile(91, &flat),
    );
    assert!(run_check(ValidationCheck::Structure, &short, &ctx).is_ok());

    let long = delta_surface(
        equity(),
        RawSurface::new().with_smile(30, &steep).with_smile(91, &flat),
    );
    assert!(run_check(ValidationCheck::Structure, &long, &ctx).is_err());
}

// ------------------------------------------------------------------------------------------------
// Smile consistency
// ------------------------------------------------------------------------------------------------

#[test]
fn test_differing_point_sets_fail_consistency() {
    let raw = RawSurface::new()
        .with_smile(1, &[(25.0, 0.2), (50.0, 0.2), (75.0, 0.2)])
        .with_smile(7, &[(10.0, 0.2), (50.0, 0.2), (90.0, 0.2)]);
    let surface = delta_surface(equity(), raw);

    let err = run_check(ValidationCheck::SmileConsistency, &surface, &at(shortly_after()))
        .expect_err("Point sets differ");
    assert_eq!(err.check(), Some(ValidationCheck::SmileConsistency));
    assert!(!surface.validate(&at(shortly_after())));
}

#[test]
fn test_consistency_is_first_failure_when_structure_passes() {
    let raw = RawSurface::new()
        .with_smile(1, &[(25.0, 0.2), (50.0, 0.2), (75.0, 0.2)])
        .with_smile(7, &[(20.0, 0.2), (50.0, 0.2), (80.0, 0.2)]);
    let surface = delta_surface(equity(), raw);
    assert_eq!(
        failed_check(&surface, &at(shortly_after())),
        Some(ValidationCheck::SmileConsistency)
    );
}

// ------------------------------------------------------------------------------------------------
// History: identical surface and volatility jump
// ------------------------------------------------------------------------------------------------

#[test]
fn test_unchanged_surface_goes_stale() {
    let raw = load_raw_surface(EURUSD_FIXTURE).unwrap();
    let previous = VolSurface::new(
        SurfaceType::Delta,
        recorded() - Duration::hours(5),
        eurusd(),
        raw.clone(),
    );
    let current = delta_surface(eurusd(), raw);

    let ctx = at(shortly_after()).with_previous(&previous);
    assert_eq!(
        failed_check(&current, &ctx),
        Some(ValidationCheck::IdenticalSurface)
    );
    assert!(current.validation_error().unwrap().contains("stale"));
}

#[test]
fn test_unchanged_surface_is_fine_when_recent_or_quanto() {
    let raw = load_raw_surface(EURUSD_FIXTURE).unwrap();

    let recent = VolSurface::new(
        SurfaceType::Delta,
        recorded() - Duration::hours(1),
        eurusd(),
        raw.clone(),
    );
    let current = delta_surface(eurusd(), raw.clone());
    assert_eq!(
        failed_check(&current, &at(shortly_after()).with_previous(&recent)),
        None
    );

    let old = VolSurface::new(
        SurfaceType::Delta,
        recorded() - Duration::hours(5),
        eurusd(),
        raw.clone(),
    );
    let quanto = delta_surface(eurusd().with_quanto_only(true), raw);
    let ctx = at(shortly_after()).with_previous(&old);
    assert!(run_check(ValidationCheck::IdenticalSurface, &quanto, &ctx).is_ok());
}

#[test]
fn test_staleness_is_measured_against_validation_time() {
    // Identical quotes re-sent an hour later, validated when the last real
    // update is five hours old.
    let raw = load_raw_surface(EURUSD_FIXTURE).unwrap();
    let previous = VolSurface::new(
        SurfaceType::Delta,
        recorded() - Duration::hours(1),
        eurusd(),
        raw.clone(),
    );
    let current = delta_surface(eurusd(), raw);

    let ctx = at(recorded() + Duration::hours(4)).with_previous(&previous);
    let err = run_check(ValidationCheck::IdenticalSurface, &current, &ctx).unwrap_err();
    assert_eq!(err.check(), Some(ValidationCheck::IdenticalSurface));
    assert!(err.to_string().contains("stale"));

    let ctx = at(shortly_after()).with_previous(&previous);
    assert!(run_check(ValidationCheck::IdenticalSurface, &current, &ctx).is_ok());
}

#[test]
fn test_large_volatility_move_fails_jump_check() {
    let tenors_prev = [(7, 0.10), (30, 0.10)];
    let tenors_now = [(7, 0.25), (30, 0.25)];
    let previous = flat_smiles(equity(), recorded() - Duration::minutes(30), &tenors_prev);
    let current = flat_smiles(equity(), recorded(), &tenors_now);

    let ctx = at(shortly_after()).with_previous(&previous);
    assert_eq!(
        failed_check(&current, &ctx),
        Some(ValidationCheck::VolatilityJump)
    );
}

#[test]
fn test_small_volatility_move_passes() {
    let previous = flat_smiles(
        equity(),
        recorded() - Duration::minutes(30),
        &[(7, 0.10), (30, 0.10)],
    );
    let current = flat_smiles(equity(), recorded(), &[(7, 0.11), (30, 0.11)]);

    let ctx = at(shortly_after()).with_previous(&previous);
    assert_eq!(failed_check(&current, &ctx), None);
}

#[test]
fn test_jump_check_compares_across_shifted_smile_grids() {
    // The previous surface quotes none of the current smile points.
    let previous = VolSurface::new(
        SurfaceType::Delta,
        recorded() - Duration::minutes(30),
        equity(),
        RawSurface::new()
            .with_smile(7, &[(30.0, 0.10), (55.0, 0.10), (80.0, 0.10)])
            .with_smile(30, &[(30.0, 0.10), (55.0, 0.10), (80.0, 0.10)]),
    );
    let current = delta_surface(
        equity(),
        RawSurface::new()
            .with_smile(7, &[(25.0, 0.40), (50.0, 0.40), (75.0, 0.40)])
            .with_smile(30, &[(25.0, 0.40), (50.0, 0.40), (75.0, 0.40)]),
    );

    let ctx = at(shortly_after()).with_previous(&previous);
    let err = run_check(ValidationCheck::VolatilityJump, &current, &ctx).unwrap_err();
    println!("Jump failure: {err}");
    assert_eq!(err.check(), Some(ValidationCheck::VolatilityJump));
}

#[test]
fn test_jump_check_skips_tenors_the_previous_surface_cannot_reach() {
    let previous = flat_smiles(equity(), recorded() - Duration::minutes(30), &[(7, 0.10), (14, 0.10)]);
    // The 60 day tenor is beyond the previous surface; it must not count as a jump.
    let current = flat_smiles(equity(), recorded(), &[(7, 0.10), (60, 0.30)]);

    let ctx = at(shortly_after()).with_previous(&previous);
    assert!(run_check(ValidationCheck::VolatilityJump, &current, &ctx).is_ok());
}

// ------------------------------------------------------------------------------------------------
// Calendar and admissibility
// ------------------------------------------------------------------------------------------------

#[test]
fn test_falling_total_variance_fails_calendar_check() {
    let surface = flat_smiles(equity(), recorded(), &[(30, 0.3), (60, 0.2)]);
    assert_eq!(
        failed_check(&surface, &at(shortly_after())),
        Some(ValidationCheck::Calendar)
    );
    assert!(surface.validation_error().unwrap().contains("calendar"));
}

#[test]
fn test_inverted_call_price_fails_admissibility() {
    // At one year the 45 point call is dearer than the 50 point call.
    let raw = RawSurface::new()
        .with_smile(7, &[(45.0, 0.20), (50.0, 0.20), (55.0, 0.20)])
        .with_smile(365, &[(45.0, 0.25), (50.0, 0.20), (55.0, 0.20)]);
    let surface = delta_surface(equity(), raw);

    assert!(!surface.validate(&at(shortly_after())));
    let message = surface.validation_error().unwrap();
    println!("Admissibility failure: {message}");
    assert!(message.contains("admissibility"));
    assert_eq!(
        surface.validation_failure().and_then(|e| e.check()),
        Some(ValidationCheck::Admissibility)
    );
}

#[test]
fn test_premium_adjusted_pair_passes_admissibility() {
    let usdjpy = Underlying::new("USDJPY", "FX", InstrumentType::Forex);
    assert!(usdjpy.premium_adjusted);
    let surface = delta_surface(usdjpy, load_raw_surface(EURUSD_FIXTURE).unwrap());

    assert!(run_check(ValidationCheck::Admissibility, &surface, &at(shortly_after())).is_ok());
}

#[test]
fn test_moneyness_admissibility_needs_falling_prices() {
    // A volatility spike at 110 makes the 110 call dearer than the 100 call.
    let raw = RawSurface::new()
        .with_smile(30, &[(90.0, 0.20), (100.0, 0.20), (110.0, 0.20)])
        .with_smile(365, &[(90.0, 0.20), (100.0, 0.20), (110.0, 0.40)]);
    let surface = VolSurface::new(SurfaceType::Moneyness, recorded(), equity(), raw);

    let err = run_check(ValidationCheck::Admissibility, &surface, &at(shortly_after()))
        .expect_err("Call prices should not rise with strike");
    assert_eq!(err.check(), Some(ValidationCheck::Admissibility));
}

// ------------------------------------------------------------------------------------------------
// Recording and configuration
// ------------------------------------------------------------------------------------------------

#[test]
fn test_validation_failure_is_sticky() {
    let surface = eurusd_surface();
    assert!(!surface.validate(&at(recorded() + Duration::hours(5))));
    // A later run that would pass does not clear the failure.
    assert!(!surface.validate(&at(shortly_after())));
    assert_eq!(
        surface.validation_failure().and_then(|e| e.check()),
        Some(ValidationCheck::Age)
    );
}

#[test]
fn test_toml_config_changes_limits() {
    let strict = ValidationConfig::from_toml_str("max_age_secs = 60").unwrap();
    let surface = eurusd_surface().with_config(strict);
    assert_eq!(
        failed_check(&surface, &at(shortly_after())),
        Some(ValidationCheck::Age)
    );

    let lenient = ValidationConfig::from_file(LENIENT_CONFIG).expect("Failed to load config");
    assert_eq!(lenient.max_tenor_days, 1095);
    assert_eq!(lenient.stale_after_secs, 15_000);
    let surface = eurusd_surface().with_config(lenient);
    assert_eq!(failed_check(&surface, &at(recorded() + Duration::days(30))), None);
}

#[test]
fn test_lenient_preset_accepts_long_tenors() {
    let smile = [(25.0, 0.2), (50.0, 0.2), (75.0, 0.2)];
    let raw = || RawSurface::new().with_smile(30, &smile).with_smile(730, &smile);

    let production = delta_surface(equity(), raw()).with_config(default_configs::production());
    assert_eq!(
        failed_check(&production, &at(shortly_after())),
        Some(ValidationCheck::Structure)
    );

    let lenient = delta_surface(equity(), raw()).with_config(default_configs::lenient());
    assert_eq!(failed_check(&lenient, &at(shortly_after())), None);
}
