//! Series solution for first passage through two linear boundaries.
//!
//! The density of a driftless, unit-noise diffusion started at 0 crossing
//! the upper boundary `y(t) = a1 + b1·t` before the lower boundary
//! `y(t) = a2 + b2·t` is obtained by alternately reflecting the process
//! across the two boundaries (method of images). Each evaluation time is
//! independent, so the whole grid is computed in one pass.
//!
//! Reference: Anderson (1960), "A modification of the sequential probability
//! ratio test to reduce the sample size", Ann. Math. Statist. 31.
use crate::analytic::errors::{AnalyticError, AnalyticResult};
use ndarray::{Array1, ArrayView1};
use std::f64::consts::PI;

/// Number of image terms summed per evaluation time. Fixed, no adaptive
/// early exit, so results are reproducible bit for bit.
const N_MAX: usize = 100;

/// Zero evaluation times are shifted here to avoid dividing by zero.
const T_EPS: f64 = 1e-30;

/// Density substituted for evaluation times past the point where two
/// collapsing boundaries meet. Small but nonzero so downstream
/// log-likelihoods stay finite.
const COLLAPSE_FLOOR: f64 = 1e-100;

/// First-passage density through the *upper* of two linear boundaries.
///
/// The process is driftless with unit noise and starts at 0. The upper
/// boundary is `a1 + b1·t`, the lower `a2 + b2·t`, and the returned array
/// holds the density of crossing the upper boundary at each time in
/// `teval`, aligned index for index.
///
/// Cancellation in the alternating series can leave small negative values
/// near machine precision; those are clipped to zero so the post-clip
/// density is non-negative everywhere.
pub fn analytic_ddm_linbound(
    a1: f64, b1: f64, a2: f64, b2: f64, teval: ArrayView1<f64>,
) -> Array1<f64> {
    let mut dist = Array1::<f64>::zeros(teval.len());
    for (out, &t_raw) in dist.iter_mut().zip(teval.iter()) {
        let t = if t_raw == 0.0 { T_EPS } else { t_raw };

        // Change of variables shared by every term at this time.
        let c = -2.0 * ((a1 - a2) / t + b1 - b2);

        let mut suminc = 0.0;
        for n in 0..N_MAX {
            let n = n as f64;
            let inc = (c * n * ((n + 1.0) * a1 - n * a2)).exp()
                * ((2.0 * n + 1.0) * a1 - 2.0 * n * a2)
                - (c * (n + 1.0) * (n * a1 - (n + 1.0) * a2)).exp()
                    * ((2.0 * n + 1.0) * a1 - 2.0 * (n + 1.0) * a2);
            suminc += inc;
        }

        let upper = a1 + b1 * t;
        let density = (-(upper * upper) / (2.0 * t)).exp() / (2.0 * PI).sqrt()
            / t.powf(1.5)
            * suminc;
        *out = if density > 0.0 { density } else { 0.0 };
    }
    dist
}

/// Reaction-time densities of a drift diffusion model with symmetric
/// (optionally linearly collapsing) boundaries.
///
/// The upper boundary is `b + b_slope·t` and the lower its negation; the
/// process has drift `mu`, noise `sigma`, and starts at 0. Everything is
/// rescaled by `sigma` so the inner solver always operates at unit noise.
///
/// Returns `(dist_corr, dist_err)`, the first-passage densities through the
/// boundary congruent with the drift sign ("correct") and the opposite
/// boundary ("error"), both aligned 1:1 with `teval`. Evaluation times at or
/// past the point where the two boundaries collapse into each other receive
/// a fixed floor density of `1e-100` instead of a true zero or an error.
///
/// # Errors
/// - [`AnalyticError::InvalidNoise`] if `sigma` is not finite and positive.
/// - [`AnalyticError::InvalidBound`] if `b` is not finite and positive.
/// - [`AnalyticError::InvalidBoundSlope`] if `b_slope` is not finite.
pub fn analytic_ddm(
    mu: f64, sigma: f64, b: f64, teval: ArrayView1<f64>, b_slope: f64,
) -> AnalyticResult<(Array1<f64>, Array1<f64>)> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(AnalyticError::InvalidNoise { value: sigma });
    }
    if !b.is_finite() || b <= 0.0 {
        return Err(AnalyticError::InvalidBound { value: b });
    }
    if !b_slope.is_finite() {
        return Err(AnalyticError::InvalidBoundSlope { value: b_slope });
    }

    // Rescale so the underlying solver runs at unit noise.
    let b = b / sigma;
    let mu = mu / sigma;
    let b_slope = b_slope / sigma;

    // Times strictly before the two boundaries meet.
    let valid_idx: Vec<usize> =
        teval.iter().enumerate().filter(|(_, &t)| b + b_slope * t > 0.0).map(|(i, _)| i).collect();
    let teval_valid = Array1::from_iter(valid_idx.iter().map(|&i| teval[i]));

    let corr_valid = analytic_ddm_linbound(b, -mu + b_slope, -b, -mu - b_slope, teval_valid.view());
    let err_valid = analytic_ddm_linbound(b, mu + b_slope, -b, mu - b_slope, teval_valid.view());

    let mut dist_corr = Array1::from_elem(teval.len(), COLLAPSE_FLOOR);
    let mut dist_err = Array1::from_elem(teval.len(), COLLAPSE_FLOOR);
    for (k, &i) in valid_idx.iter().enumerate() {
        dist_corr[i] = corr_valid[k];
        dist_err[i] = err_valid[k];
    }
    Ok((dist_corr, dist_err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Non-negativity of the clipped series density over realistic grids.
    // - Probability mass conservation of the two-boundary wrapper.
    // - Exact correct/error swap under drift negation.
    // - The collapse floor for linearly collapsing boundaries.
    // - Input validation of the wrapper.
    //
    // They intentionally DO NOT cover:
    // - Agreement with numerical PDE solutions (no numerical solver exists
    //   in this crate).
    // -------------------------------------------------------------------------

    fn grid(t_dur: f64, dt: f64) -> Array1<f64> {
        let n = (t_dur / dt).round() as usize + 1;
        Array1::from_iter((0..n).map(|i| i as f64 * dt))
    }

    #[test]
    fn linbound_density_is_non_negative_everywhere() {
        let teval = grid(3.0, 0.01);
        for &(a1, b1, a2, b2) in &[
            (1.0, 0.0, -1.0, 0.0),
            (1.0, -0.5, -1.0, 0.5),
            (0.5, -1.2, -0.5, -0.8),
            (2.0, 1.0, -2.0, 1.0),
        ] {
            let dist = analytic_ddm_linbound(a1, b1, a2, b2, teval.view());
            assert!(
                dist.iter().all(|&d| d >= 0.0),
                "negative density for boundaries ({a1}, {b1}, {a2}, {b2})"
            );
        }
    }

    #[test]
    fn linbound_density_vanishes_at_time_zero() {
        let teval = ndarray::array![0.0, 0.001];
        let dist = analytic_ddm_linbound(1.0, 0.0, -1.0, 0.0, teval.view());
        assert!(dist[0] < 1e-12, "density at t = 0 should be negligible, got {}", dist[0]);
    }

    #[test]
    fn total_mass_is_below_one_and_grows_with_horizon() {
        let dt = 0.005;
        let short = grid(1.0, dt);
        let long = grid(6.0, dt);
        let (c1, e1) = analytic_ddm(0.5, 1.0, 1.0, short.view(), 0.0).unwrap();
        let (c2, e2) = analytic_ddm(0.5, 1.0, 1.0, long.view(), 0.0).unwrap();
        let mass_short = (c1.sum() + e1.sum()) * dt;
        let mass_long = (c2.sum() + e2.sum()) * dt;
        assert!(mass_short <= 1.0 + 1e-6, "mass {mass_short} exceeds 1");
        assert!(mass_long <= 1.0 + 1e-6, "mass {mass_long} exceeds 1");
        assert!(mass_long > mass_short, "mass should grow with the horizon");
        assert!(mass_long > 0.99, "long-horizon mass {mass_long} should approach 1");
    }

    #[test]
    fn drift_negation_swaps_correct_and_error_exactly() {
        let teval = grid(2.0, 0.01);
        let (corr_pos, err_pos) = analytic_ddm(0.8, 1.0, 1.0, teval.view(), 0.0).unwrap();
        let (corr_neg, err_neg) = analytic_ddm(-0.8, 1.0, 1.0, teval.view(), 0.0).unwrap();
        assert_eq!(corr_pos, err_neg);
        assert_eq!(err_pos, corr_neg);
    }

    #[test]
    fn collapsed_boundary_times_receive_floor_density() {
        // b = 1, slope = -0.5: boundaries meet at t = 2.
        let teval = grid(4.0, 0.1);
        let (corr, err) = analytic_ddm(0.3, 1.0, 1.0, teval.view(), -0.5).unwrap();
        for (i, &t) in teval.iter().enumerate() {
            if 1.0 - 0.5 * t <= 0.0 {
                assert_eq!(corr[i], 1e-100, "expected floor at t = {t}");
                assert_eq!(err[i], 1e-100, "expected floor at t = {t}");
            }
        }
        assert!(corr[5] > 0.0);
    }

    #[test]
    fn wrapper_rejects_invalid_parameters() {
        let teval = grid(1.0, 0.1);
        assert!(matches!(
            analytic_ddm(0.0, 0.0, 1.0, teval.view(), 0.0),
            Err(AnalyticError::InvalidNoise { .. })
        ));
        assert!(matches!(
            analytic_ddm(0.0, 1.0, -1.0, teval.view(), 0.0),
            Err(AnalyticError::InvalidBound { .. })
        ));
        assert!(matches!(
            analytic_ddm(0.0, 1.0, 1.0, teval.view(), f64::NAN),
            Err(AnalyticError::InvalidBoundSlope { .. })
        ));
    }
}
