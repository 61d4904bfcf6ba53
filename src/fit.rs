//! Conformal-mapping curvature fit
//!
//! A charged particle in a uniform axial magnetic field follows a circle in
//! the transverse (x, y) plane. The conformal transform u = x/r², v = y/r²
//! (r² = x² + y²) maps a circle through the origin onto a straight line, so
//! the circle radius drops out of a cheap closed-form least-squares
//! polynomial fit instead of a non-linear circle fit. The fit is used as a
//! correctness oracle: tracks whose fitted pT disagrees with the truth are
//! rejected before they reach training.

use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Axial magnetic field strength, in field units
pub const MAGNETIC_FIELD: f64 = 2.0;

/// pT = `PT_FACTOR` * B * R for a circle of radius R
pub const PT_FACTOR: f64 = 0.3;

/// Rescale from fit units (MeV) to target units (GeV)
const UNIT_SCALE: f64 = 1_000.0;

/// Threshold below which the recovered constant coefficient counts as zero
const COEFF_EPS: f64 = 1e-12;

/// Estimate transverse momentum from the curvature of a hit sequence
///
/// Fits v ≈ p₀ + p₁u + p₂u² by least squares over the conformal-mapped
/// hits, recovers the circle centre from b = 0.5/p₀ and a = −p₁·b, and
/// converts R = √(a² + b²) to pT via 0.3·B·R, rescaled to GeV. Only the
/// transverse components of the positions participate; z is ignored.
///
/// # Errors
///
/// Returns [`Error::DegenerateFit`] when fewer than 3 distinct (x, y) pairs
/// are supplied, a hit sits on the beam axis (r² = 0), the normal system is
/// singular, or the constant coefficient vanishes (vertical/degenerate fit).
/// Callers must treat such tracks as unfit for quality filtering.
pub fn estimate_pt(positions: &[[f64; 3]]) -> Result<f64> {
    if distinct_xy(positions) < 3 {
        return Err(Error::DegenerateFit(format!(
            "need at least 3 distinct (x, y) pairs, got {}",
            distinct_xy(positions)
        )));
    }

    // Conformal image of the hits.
    let mut us = Vec::with_capacity(positions.len());
    let mut vs = Vec::with_capacity(positions.len());
    for p in positions {
        let r2 = p[0] * p[0] + p[1] * p[1];
        if r2 == 0.0 {
            return Err(Error::DegenerateFit(
                "hit on the beam axis (r² = 0)".to_string(),
            ));
        }
        us.push(p[0] / r2);
        vs.push(p[1] / r2);
    }

    // Degree-2 Vandermonde least squares, solved by SVD (the conformal
    // image of a track is badly scaled; normal equations would square an
    // already large condition number).
    let vander = DMatrix::from_fn(us.len(), 3, |i, j| us[i].powi(j as i32));
    let rhs = DVector::from_vec(vs);
    let coeffs = vander
        .svd(true, true)
        .solve(&rhs, f64::EPSILON)
        .map_err(|e| Error::DegenerateFit(format!("least-squares solve failed: {e}")))?;

    // coeffs = (p₀, p₁, p₂) in ascending order; a vanishing constant term
    // means the conformal image passes through the origin and the centre
    // is unrecoverable.
    let p0 = coeffs[0];
    if p0.abs() < COEFF_EPS {
        return Err(Error::DegenerateFit(
            "vanishing constant coefficient".to_string(),
        ));
    }
    let b = 0.5 / p0;
    let a = -coeffs[1] * b;
    let radius = a.hypot(b);

    Ok(PT_FACTOR * MAGNETIC_FIELD * radius / UNIT_SCALE)
}

/// Count distinct (x, y) pairs by exact bit pattern
fn distinct_xy(positions: &[[f64; 3]]) -> usize {
    let mut seen: Vec<(u64, u64)> = positions
        .iter()
        .map(|p| (p[0].to_bits(), p[1].to_bits()))
        .collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Hits sampled exactly from a circle of radius `r` through the origin,
    /// centred at (cx, cy) with cx² + cy² = r².
    fn circle_hits(cx: f64, cy: f64, r: f64, n: usize) -> Vec<[f64; 3]> {
        (1..=n)
            .map(|i| {
                // Stay away from the origin itself (theta = angle to centre + pi).
                let theta = 2.5 * (i as f64) / (n as f64 + 1.0);
                [cx + r * theta.cos(), cy + r * theta.sin(), i as f64]
            })
            .collect()
    }

    #[test]
    fn test_exact_circle_recovers_pt() {
        for r in [500.0, 1_000.0, 2_500.0] {
            let hits = circle_hits(0.0, r, r, 8);
            let pt = estimate_pt(&hits).unwrap();
            let expected = PT_FACTOR * MAGNETIC_FIELD * r / 1_000.0;
            assert_relative_eq!(pt, expected, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_exact_circle_off_axis_centre() {
        let r = 800.0;
        let (cx, cy) = (r * 0.6, r * 0.8);
        let hits = circle_hits(cx, cy, r, 10);
        let pt = estimate_pt(&hits).unwrap();
        assert_relative_eq!(
            pt,
            PT_FACTOR * MAGNETIC_FIELD * r / 1_000.0,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_too_few_distinct_points() {
        let hits = vec![[1.0, 2.0, 0.0], [1.0, 2.0, 1.0], [3.0, 4.0, 2.0]];
        let err = estimate_pt(&hits).unwrap_err();
        assert!(matches!(err, Error::DegenerateFit(_)));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            estimate_pt(&[]),
            Err(Error::DegenerateFit(_))
        ));
    }

    #[test]
    fn test_hit_on_beam_axis_is_degenerate() {
        let mut hits = circle_hits(0.0, 100.0, 100.0, 6);
        hits.push([0.0, 0.0, 3.0]);
        assert!(matches!(
            estimate_pt(&hits),
            Err(Error::DegenerateFit(_))
        ));
    }

    #[test]
    fn test_z_component_ignored() {
        let r = 1_200.0;
        let mut hits = circle_hits(0.0, r, r, 8);
        let base = estimate_pt(&hits).unwrap();
        for h in &mut hits {
            h[2] *= -17.0;
        }
        let shuffled_z = estimate_pt(&hits).unwrap();
        assert_relative_eq!(base, shuffled_z);
    }
}
