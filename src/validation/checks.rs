//! Individual surface checks.
//!
//! Each check inspects the surface (and, for the history-based checks, the
//! previous surface in the context) and returns the first problem it finds as
//! a [`SurfaceError::Validation`] tagged with its [`ValidationCheck`].

use super::types::{ValidationCheck, ValidationContext};
use crate::dates::epoch_to_datetime;
use crate::error::SurfaceError;
use crate::market::{Smile, SmilePoint, SurfaceType};
use crate::models::bs::{bs_call_price, strike_from_delta_point};
use crate::models::delta::{strike_from_moneyness, DAYS_PER_YEAR};
use crate::models::smile::{interpolate, smile_issue};
use crate::surface::VolSurface;

type CheckResult = Result<(), SurfaceError>;

fn fail(check: ValidationCheck, message: impl Into<String>) -> CheckResult {
    Err(SurfaceError::validation(check, message))
}

/// Re-tag an error raised while evaluating a check as that check's failure.
fn as_failure(check: ValidationCheck, err: anyhow::Error) -> SurfaceError {
    SurfaceError::validation(check, format!("{err:#}"))
}

fn points_of(smile: &Smile) -> Vec<f64> {
    smile.keys().map(|p| p.value()).collect()
}

pub fn check_age(surface: &VolSurface, ctx: &ValidationContext<'_>) -> CheckResult {
    let age = ctx.now.signed_duration_since(surface.recorded()).num_seconds();
    if age > surface.config().max_age_secs {
        return fail(
            ValidationCheck::Age,
            format!(
                "surface too old: recorded {} is {age}s before {}",
                surface.recorded(),
                ctx.now
            ),
        );
    }
    Ok(())
}

pub fn check_structure(surface: &VolSurface, _ctx: &ValidationContext<'_>) -> CheckResult {
    let cfg = surface.config();
    let tenors = surface.term_by_day();
    if tenors.len() < 2 {
        return fail(
            ValidationCheck::Structure,
            format!("{} tenors with smile data, need at least 2", tenors.len()),
        );
    }
    if let Some(negative) = tenors.iter().find(|d| **d < 0) {
        return fail(
            ValidationCheck::Structure,
            format!("tenor {negative} is negative"),
        );
    }
    // term_by_day is sorted
    let (shortest, longest) = (tenors[0], tenors[tenors.len() - 1]);
    if longest > cfg.max_tenor_days {
        return fail(
            ValidationCheck::Structure,
            format!("longest tenor {longest}d exceeds {}d", cfg.max_tenor_days),
        );
    }
    if surface.underlying().is_forex() && shortest > cfg.max_forex_short_tenor_days {
        return fail(
            ValidationCheck::Structure,
            format!(
                "forex surface has no short tenor: shortest is {shortest}d, need at most {}d",
                cfg.max_forex_short_tenor_days
            ),
        );
    }

    for (days, smile) in surface.raw().smiles() {
        if let Some(issue) = smile_issue(smile, cfg.min_vol, cfg.max_vol) {
            return fail(ValidationCheck::Structure, format!("tenor {days}d: {issue}"));
        }
        let allowance = cfg.smile_jump_allowance(days);
        let quotes: Vec<(f64, f64)> = smile.iter().map(|(p, v)| (p.value(), *v)).collect();
        for pair in quotes.windows(2) {
            let ((p0, v0), (p1, v1)) = (pair[0], pair[1]);
            if p1 - p0 > cfg.max_smile_point_gap {
                return fail(
                    ValidationCheck::Structure,
                    format!(
                        "tenor {days}d: points {p0} and {p1} are more than {} apart",
                        cfg.max_smile_point_gap
                    ),
                );
            }
            if (v1 - v0).abs() > allowance * v0 {
                return fail(
                    ValidationCheck::Structure,
                    format!(
                        "tenor {days}d: volatility moves from {v0} to {v1} between points {p0} and {p1}, more than {:.0}%",
                        allowance * 100.0
                    ),
                );
            }
        }
    }
    Ok(())
}

pub fn check_smile_consistency(surface: &VolSurface, _ctx: &ValidationContext<'_>) -> CheckResult {
    let mut smiles = surface.raw().smiles();
    let Some((first_days, first)) = smiles.next() else {
        return Ok(());
    };
    for (days, smile) in smiles {
        let same = smile.len() == first.len() && smile.keys().eq(first.keys());
        if !same {
            return fail(
                ValidationCheck::SmileConsistency,
                format!(
                    "tenor {days}d quotes points {:?} but tenor {first_days}d quotes {:?}",
                    points_of(smile),
                    points_of(first)
                ),
            );
        }
    }
    Ok(())
}

pub fn check_identical_surface(surface: &VolSurface, ctx: &ValidationContext<'_>) -> CheckResult {
    let Some(previous) = ctx.previous else {
        return Ok(());
    };
    if surface.underlying().quanto_only {
        return Ok(());
    }

    let grid = |s: &VolSurface| -> Vec<(i64, SmilePoint, f64)> {
        s.raw()
            .smiles()
            .flat_map(|(days, smile)| smile.iter().map(move |(p, v)| (days, *p, *v)))
            .collect()
    };
    let current = grid(surface);
    let prior = grid(previous);
    let unchanged = current.len() == prior.len()
        && current
            .iter()
            .zip(&prior)
            .all(|(a, b)| a.0 == b.0 && a.1 == b.1 && a.2 == b.2);
    if !unchanged {
        return Ok(());
    }

    let gap = ctx
        .now
        .signed_duration_since(previous.recorded())
        .num_seconds();
    if gap > surface.config().stale_after_secs {
        return fail(
            ValidationCheck::IdenticalSurface,
            format!(
                "surface stale: quotes unchanged since {} ({gap}s)",
                previous.recorded()
            ),
        );
    }
    Ok(())
}

pub fn check_volatility_jump(surface: &VolSurface, ctx: &ValidationContext<'_>) -> CheckResult {
    let Some(previous) = ctx.previous else {
        return Ok(());
    };
    let cfg = surface.config();
    let from = surface.recorded();

    for (days, expiry) in surface.term_structure().expiries() {
        let to = epoch_to_datetime(expiry)
            .map_err(|e| as_failure(ValidationCheck::VolatilityJump, e))?;
        let prior = match previous.smile_between(from, to) {
            Ok(smile) => smile,
            // The previous surface does not reach this expiry.
            Err(e)
                if matches!(
                    e.downcast_ref::<SurfaceError>(),
                    Some(SurfaceError::InsufficientTermStructure { .. })
                ) =>
            {
                continue
            }
            Err(e) => return Err(as_failure(ValidationCheck::VolatilityJump, e)),
        };
        let current = surface
            .smile_between(from, to)
            .map_err(|e| as_failure(ValidationCheck::VolatilityJump, e))?;

        for (point, vol) in &current {
            let prior_vol = interpolate(&prior, point.value())
                .map_err(|e| as_failure(ValidationCheck::VolatilityJump, e))?;
            let diff = (vol - prior_vol).abs();
            if diff > cfg.max_vol_jump_abs && diff > prior_vol {
                return fail(
                    ValidationCheck::VolatilityJump,
                    format!(
                        "tenor {days}d point {point}: volatility {vol:.4} against {prior_vol:.4} on the previous surface"
                    ),
                );
            }
        }
    }
    Ok(())
}

pub fn check_calendar(surface: &VolSurface, _ctx: &ValidationContext<'_>) -> CheckResult {
    let surface_type = surface.surface_type();
    let mut prior: Option<(i64, f64)> = None;
    for (days, smile) in surface.raw().smiles() {
        let Some(atm) = surface_type.atm_point(smile) else {
            continue;
        };
        let vol = smile[&atm];
        let total_variance = vol * vol * days as f64;
        if let Some((prior_days, prior_variance)) = prior {
            if total_variance < prior_variance {
                return fail(
                    ValidationCheck::Calendar,
                    format!(
                        "ATM total variance falls from {prior_variance:.6} at {prior_days}d to {total_variance:.6} at {days}d"
                    ),
                );
            }
        }
        prior = Some((days, total_variance));
    }
    Ok(())
}

pub fn check_admissibility(surface: &VolSurface, _ctx: &ValidationContext<'_>) -> CheckResult {
    let surface_type = surface.surface_type();
    if surface_type == SurfaceType::Flat {
        return Ok(());
    }
    let spot = surface.config().admissibility_spot;
    let premium_adjusted = surface.underlying().premium_adjusted;
    let converter = surface.delta_converter();

    for (days, smile) in surface.raw().smiles() {
        let t = days as f64 / DAYS_PER_YEAR;
        if t <= 0.0 {
            continue;
        }
        let (r, q) = converter.rates_for(t);

        let mut prior: Option<(f64, f64)> = None;
        for (point, vol) in smile {
            let point = point.value();
            let strike = match surface_type {
                SurfaceType::Delta => {
                    strike_from_delta_point(point, spot, r, q, t, *vol, premium_adjusted).map_err(
                        |e| {
                            as_failure(
                                ValidationCheck::Admissibility,
                                e.context(format!("tenor {days}d point {point}")),
                            )
                        },
                    )?
                }
                _ => strike_from_moneyness(point, spot),
            };
            let price = bs_call_price(spot, strike, r, q, t, *vol);

            if let Some((prior_point, prior_price)) = prior {
                // Delta points run from high to low strike, moneyness from low to high.
                let ordered = match surface_type {
                    SurfaceType::Delta => price > prior_price,
                    _ => price < prior_price,
                };
                if !ordered {
                    return fail(
                        ValidationCheck::Admissibility,
                        format!(
                            "tenor {days}d: call price {price:.6} at point {point} does not move monotonically from {prior_price:.6} at point {prior_point}"
                        ),
                    );
                }
            }
            prior = Some((point, price));
        }
    }
    Ok(())
}
