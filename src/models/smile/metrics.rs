use anyhow::Result;

use crate::error::SurfaceError;
use crate::market::{Smile, SmilePoint};

/// ATM level with risk reversal and butterfly quotes of a delta smile.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RrBf {
    pub atm: f64,
    pub rr_25: f64,
    pub bf_25: f64,
    /// Present when both 10 and 90 are quoted.
    pub rr_10: Option<f64>,
    pub bf_10: Option<f64>,
}

/// Risk reversal and butterfly for the symmetric pair `(call, put)`.
fn pair_metrics(smile: &Smile, call: f64, put: f64, atm: f64) -> Option<(f64, f64)> {
    let call_vol = smile.get(&SmilePoint(call))?;
    let put_vol = smile.get(&SmilePoint(put))?;
    let rr = call_vol - put_vol;
    let bf = (call_vol + put_vol) / 2.0 - atm;
    Some((rr, bf))
}

/// `RR_25 = vol[25] - vol[75]`, `BF_25 = (vol[25] + vol[75]) / 2 - vol[50]`,
/// with 10/90 variants when quoted.
pub fn rr_bf_for_smile(smile: &Smile) -> Result<RrBf> {
    let atm = *smile
        .get(&SmilePoint(50.0))
        .ok_or_else(|| SurfaceError::input("smile has no 50 point"))?;
    let (rr_25, bf_25) = pair_metrics(smile, 25.0, 75.0, atm)
        .ok_or_else(|| SurfaceError::input("smile needs both 25 and 75 points"))?;
    let ten = pair_metrics(smile, 10.0, 90.0, atm);

    Ok(RrBf {
        atm,
        rr_25,
        bf_25,
        rr_10: ten.map(|(rr, _)| rr),
        bf_10: ten.map(|(_, bf)| bf),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::smile_from_pairs;
    use approx::assert_abs_diff_eq;

    #[test]
    fn twenty_five_delta_metrics() {
        let smile = smile_from_pairs(&[(25.0, 0.2), (50.0, 0.4), (75.0, 0.7)]);
        let m = rr_bf_for_smile(&smile).unwrap();
        assert_abs_diff_eq!(m.atm, 0.4);
        assert_abs_diff_eq!(m.rr_25, -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(m.bf_25, 0.05, epsilon = 1e-12);
        assert!(m.rr_10.is_none());
        assert!(m.bf_10.is_none());
    }

    #[test]
    fn ten_delta_metrics_when_quoted() {
        let smile = smile_from_pairs(&[
            (10.0, 0.30),
            (25.0, 0.26),
            (50.0, 0.24),
            (75.0, 0.25),
            (90.0, 0.28),
        ]);
        let m = rr_bf_for_smile(&smile).unwrap();
        assert_abs_diff_eq!(m.rr_10.unwrap(), 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(m.bf_10.unwrap(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn missing_wings_are_rejected() {
        let smile = smile_from_pairs(&[(25.0, 0.2), (50.0, 0.4)]);
        assert!(rr_bf_for_smile(&smile).is_err());
        let smile = smile_from_pairs(&[(25.0, 0.2), (75.0, 0.4)]);
        assert!(rr_bf_for_smile(&smile).is_err());
    }
}
