// Black-Scholes helpers used by delta conversion and the admissibility check:
// vanilla prices, spot deltas (plain and premium adjusted) and the inverse
// map from a smile delta coordinate to a strike.

use anyhow::Result;
use roots::find_root_brent;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::SurfaceError;

/// Geometric step used when bracketing a premium-adjusted strike.
const BRACKET_STEP: f64 = 0.9;
const MAX_BRACKET_STEPS: usize = 80;
const STRIKE_TOLERANCE: f64 = 1e-10;

/// Option type: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Option type and delta magnitude (0-1) behind a smile delta coordinate.
    ///
    /// Points at or below 50 are calls with delta `point / 100`; points above
    /// 50 are puts with delta magnitude `(100 - point) / 100`.
    pub fn from_delta_point(point: f64) -> (OptionType, f64) {
        if point > 50.0 {
            (OptionType::Put, (100.0 - point) / 100.0)
        } else {
            (OptionType::Call, point / 100.0)
        }
    }
}

pub fn norm_cdf(x: f64) -> f64 {
    // 0.5 * [1 + erf(x / sqrt(2))]
    0.5 * (1.0 + libm::erf(x / (2.0_f64).sqrt()))
}

fn norm_inv_cdf(p: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(p),
        Err(_) => f64::NAN,
    }
}

#[allow(non_snake_case)]
fn d1_d2(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> (f64, f64) {
    let sig_sqrt_t = sigma * T.sqrt();
    let d1 = ((S / K).ln() + (r - q + 0.5 * sigma.powi(2)) * T) / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

/// Price of a European call option under Black-Scholes assumptions.
#[allow(non_snake_case)]
pub fn bs_call_price(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (S * (-q * T).exp() - K * (-r * T).exp()).max(0.0);
    }
    let (d1, d2) = d1_d2(S, K, r, q, T, sigma);
    S * (-q * T).exp() * norm_cdf(d1) - K * (-r * T).exp() * norm_cdf(d2)
}

/// Price of a European put option under Black-Scholes assumptions.
#[allow(non_snake_case)]
pub fn bs_put_price(S: f64, K: f64, r: f64, q: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (K * (-r * T).exp() - S * (-q * T).exp()).max(0.0);
    }
    let (d1, d2) = d1_d2(S, K, r, q, T, sigma);
    let nd1m = 1.0 - norm_cdf(d1);
    let nd2m = 1.0 - norm_cdf(d2);
    K * (-r * T).exp() * nd2m - S * (-q * T).exp() * nd1m
}

/// Signed spot delta. With `premium_adjusted` the premium (in units of the
/// underlying) is subtracted, which gives `K/S e^{-rT} N(d2)` for calls.
#[allow(non_snake_case)]
#[allow(clippy::too_many_arguments)]
pub fn bs_spot_delta(
    option_type: OptionType,
    S: f64,
    K: f64,
    r: f64,
    q: f64,
    T: f64,
    sigma: f64,
    premium_adjusted: bool,
) -> f64 {
    if sigma <= 0.0 || T <= 0.0 {
        let itm = match option_type {
            OptionType::Call => S > K,
            OptionType::Put => S < K,
        };
        return match (option_type, itm) {
            (OptionType::Call, true) => 1.0,
            (OptionType::Put, true) => -1.0,
            _ => 0.0,
        };
    }
    let (d1, _) = d1_d2(S, K, r, q, T, sigma);
    let df_q = (-q * T).exp();
    let unadjusted = match option_type {
        OptionType::Call => df_q * norm_cdf(d1),
        OptionType::Put => df_q * (norm_cdf(d1) - 1.0),
    };
    if !premium_adjusted {
        return unadjusted;
    }
    let premium = match option_type {
        OptionType::Call => bs_call_price(S, K, r, q, T, sigma),
        OptionType::Put => bs_put_price(S, K, r, q, T, sigma),
    };
    unadjusted - premium / S
}

/// Smile delta coordinate (0-100) of a strike.
///
/// Uses the call delta while it is at most 50, the put side otherwise, so the
/// result lines up with [`OptionType::from_delta_point`].
#[allow(non_snake_case)]
pub fn delta_point_from_strike(
    S: f64,
    K: f64,
    r: f64,
    q: f64,
    T: f64,
    sigma: f64,
    premium_adjusted: bool,
) -> f64 {
    let call = 100.0 * bs_spot_delta(OptionType::Call, S, K, r, q, T, sigma, premium_adjusted);
    if call <= 50.0 {
        return call;
    }
    let put = bs_spot_delta(OptionType::Put, S, K, r, q, T, sigma, premium_adjusted);
    100.0 - 100.0 * put.abs()
}

/// Strike whose delta equals the smile delta coordinate `point`.
#[allow(non_snake_case)]
pub fn strike_from_delta_point(
    point: f64,
    S: f64,
    r: f64,
    q: f64,
    T: f64,
    sigma: f64,
    premium_adjusted: bool,
) -> Result<f64> {
    if !(point > 0.0 && point < 100.0) {
        return Err(SurfaceError::input(format!(
            "delta point must lie strictly between 0 and 100, got {point}"
        ))
        .into());
    }
    if !(S > 0.0 && T > 0.0 && sigma > 0.0) {
        return Err(SurfaceError::input(format!(
            "strike inversion needs positive spot, time and vol (S={S}, T={T}, sigma={sigma})"
        ))
        .into());
    }

    let (option_type, magnitude) = OptionType::from_delta_point(point);
    let sig_sqrt_t = sigma * T.sqrt();
    let drift = (r - q + 0.5 * sigma * sigma) * T;

    // Closed form for unadjusted spot delta: N(±d1) = |delta| e^{qT}.
    let scaled = magnitude * (q * T).exp();
    if !(scaled > 0.0 && scaled < 1.0) {
        return Err(SurfaceError::numerical(format!(
            "delta {magnitude} is unreachable with q={q}, T={T}"
        ))
        .into());
    }
    let d1 = match option_type {
        OptionType::Call => norm_inv_cdf(scaled),
        OptionType::Put => -norm_inv_cdf(scaled),
    };
    let unadjusted_strike = S * (drift - d1 * sig_sqrt_t).exp();
    if !premium_adjusted {
        return Ok(unadjusted_strike);
    }

    let objective = |k: f64| {
        bs_spot_delta(option_type, S, k, r, q, T, sigma, true).abs() - magnitude
    };
    // Calls are solved on the branch where delta falls as strike rises; put
    // delta magnitude rises with strike everywhere.
    let decreasing = option_type == OptionType::Call;
    solve_strike(objective, unadjusted_strike, decreasing)
}

/// Walk geometrically away from `start` until `f` changes sign, then refine
/// with Brent's method.
fn solve_strike(f: impl Fn(f64) -> f64, start: f64, decreasing: bool) -> Result<f64> {
    let f_start = f(start);
    if f_start == 0.0 {
        return Ok(start);
    }
    let walk_down = (f_start < 0.0) == decreasing;
    let factor = if walk_down {
        BRACKET_STEP
    } else {
        1.0 / BRACKET_STEP
    };

    let mut prev = start;
    for _ in 0..MAX_BRACKET_STEPS {
        let next = prev * factor;
        let f_next = f(next);
        if !f_next.is_finite() {
            break;
        }
        if f_next.signum() != f_start.signum() {
            let (lo, hi) = if next < prev { (next, prev) } else { (prev, next) };
            let mut tolerance = STRIKE_TOLERANCE;
            return find_root_brent(lo, hi, &f, &mut tolerance).map_err(|e| {
                anyhow::Error::from(SurfaceError::numerical(format!(
                    "strike root finding failed: {e:?}"
                )))
            });
        }
        prev = next;
    }
    Err(SurfaceError::numerical(format!(
        "could not bracket premium-adjusted strike starting from {start}"
    ))
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn put_call_parity_holds() {
        let (s, k, r, q, t, sigma) = (100.0, 105.0, 0.03, 0.01, 0.5, 0.25);
        let call = bs_call_price(s, k, r, q, t, sigma);
        let put = bs_put_price(s, k, r, q, t, sigma);
        let parity = s * (-q * t).exp() - k * (-r * t).exp();
        assert_abs_diff_eq!(call - put, parity, epsilon = 1e-6);
    }

    #[test]
    fn delta_point_classification() {
        assert_eq!(OptionType::from_delta_point(25.0), (OptionType::Call, 0.25));
        assert_eq!(OptionType::from_delta_point(50.0), (OptionType::Call, 0.5));
        let (kind, magnitude) = OptionType::from_delta_point(90.0);
        assert_eq!(kind, OptionType::Put);
        assert_abs_diff_eq!(magnitude, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn strike_inversion_recovers_delta_point() {
        for premium_adjusted in [false, true] {
            for point in [10.0, 25.0, 40.0, 60.0, 75.0, 90.0] {
                let k = strike_from_delta_point(point, 100.0, 0.02, 0.01, 0.25, 0.15, premium_adjusted)
                    .unwrap();
                let back = delta_point_from_strike(100.0, k, 0.02, 0.01, 0.25, 0.15, premium_adjusted);
                assert_abs_diff_eq!(back, point, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn strikes_fall_as_delta_point_rises() {
        let strikes: Vec<f64> = [10.0, 25.0, 50.0, 75.0, 90.0]
            .iter()
            .map(|&p| strike_from_delta_point(p, 100.0, 0.0, 0.0, 1.0, 0.2, false).unwrap())
            .collect();
        assert!(strikes.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn premium_adjusted_call_delta_is_smaller() {
        let plain = bs_spot_delta(OptionType::Call, 100.0, 100.0, 0.0, 0.0, 1.0, 0.2, false);
        let adjusted = bs_spot_delta(OptionType::Call, 100.0, 100.0, 0.0, 0.0, 1.0, 0.2, true);
        assert!(adjusted < plain);
    }

    #[test]
    fn rejects_out_of_range_points() {
        assert!(strike_from_delta_point(0.0, 100.0, 0.0, 0.0, 1.0, 0.2, false).is_err());
        assert!(strike_from_delta_point(100.0, 100.0, 0.0, 0.0, 1.0, 0.2, false).is_err());
    }
}
