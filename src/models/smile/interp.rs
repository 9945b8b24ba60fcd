use anyhow::Result;

use crate::error::SurfaceError;
use crate::market::{PointVariances, Smile, SmilePoint};

/// Quadratic interpolation of a discrete smile at `sought`.
///
/// Quoted points are returned exactly. Otherwise a quadratic is fitted
/// through the three quoted points nearest `sought` (the bracketing pair plus
/// the closer outer neighbour, or the three end points when `sought` is
/// outside the quoted range) and evaluated there. Smiles with one or two
/// points fall back to flat and linear.
pub fn interpolate(smile: &Smile, sought: f64) -> Result<f64> {
    if !sought.is_finite() {
        return Err(SurfaceError::input(format!("smile point must be finite, got {sought}")).into());
    }
    if let Some(vol) = smile.get(&SmilePoint(sought)) {
        return Ok(*vol);
    }

    let points: Vec<(f64, f64)> = smile.iter().map(|(p, v)| (p.0, *v)).collect();
    match points.len() {
        0 => Err(SurfaceError::input("cannot interpolate an empty smile").into()),
        1 => Ok(points[0].1),
        2 => {
            let (x0, y0) = points[0];
            let (x1, y1) = points[1];
            Ok(y0 + (y1 - y0) * (sought - x0) / (x1 - x0))
        }
        n => {
            let start = neighbourhood_start(&points, sought, n);
            Ok(lagrange_quadratic(&points[start..start + 3], sought))
        }
    }
}

/// Index of the first of the three points used for the quadratic fit.
fn neighbourhood_start(points: &[(f64, f64)], sought: f64, n: usize) -> usize {
    let idx = points.partition_point(|(x, _)| *x < sought);
    if idx == 0 {
        return 0;
    }
    if idx >= n {
        return n - 3;
    }
    // points[idx - 1] < sought < points[idx]
    if idx == 1 {
        return 0;
    }
    if idx + 1 >= n {
        return n - 3;
    }
    let left = sought - points[idx - 2].0;
    let right = points[idx + 1].0 - sought;
    if left <= right {
        idx - 2
    } else {
        idx - 1
    }
}

fn lagrange_quadratic(nodes: &[(f64, f64)], x: f64) -> f64 {
    let (x0, y0) = nodes[0];
    let (x1, y1) = nodes[1];
    let (x2, y2) = nodes[2];
    let l0 = (x - x1) * (x - x2) / ((x0 - x1) * (x0 - x2));
    let l1 = (x - x0) * (x - x2) / ((x1 - x0) * (x1 - x2));
    let l2 = (x - x0) * (x - x1) / ((x2 - x0) * (x2 - x1));
    y0 * l0 + y1 * l1 + y2 * l2
}

/// Forward smile between two cumulative variance snapshots `days` apart:
/// `sqrt((v_to - v_from) / days)` per point present in both.
pub fn smile_from_variances(from: &PointVariances, to: &PointVariances, days: f64) -> Smile {
    to.iter()
        .filter_map(|(point, v_to)| {
            from.get(point)
                .map(|v_from| (*point, ((v_to - v_from) / days).sqrt()))
        })
        .collect()
}

/// Describe the first volatility in `smile` that is non-finite or outside
/// `[min_vol, max_vol]`.
pub fn smile_issue(smile: &Smile, min_vol: f64, max_vol: f64) -> Option<String> {
    smile.iter().find_map(|(point, vol)| {
        if !vol.is_finite() {
            Some(format!("volatility at point {point} is not a number ({vol})"))
        } else if *vol < min_vol || *vol > max_vol {
            Some(format!(
                "volatility {vol} at point {point} is outside [{min_vol}, {max_vol}]"
            ))
        } else {
            None
        }
    })
}
