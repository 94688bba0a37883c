//! Solved reaction-time distributions on the simulation time grid.
use crate::model::sample::Conditions;
use ndarray::Array1;

/// The output of solving a model under one fixed condition combination (or
/// of mixing several such solutions): correct- and error-response densities
/// sampled on the simulation time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pdf_corr: Array1<f64>,
    pdf_err: Array1<f64>,
    dt: f64,
    conditions: Conditions,
}

impl Solution {
    pub fn new(
        pdf_corr: Array1<f64>, pdf_err: Array1<f64>, dt: f64, conditions: Conditions,
    ) -> Solution {
        debug_assert_eq!(pdf_corr.len(), pdf_err.len());
        Solution { pdf_corr, pdf_err, dt, conditions }
    }

    /// Correct-response density, aligned with the time grid.
    pub fn pdf_corr(&self) -> &Array1<f64> {
        &self.pdf_corr
    }

    /// Error-response density, aligned with the time grid.
    pub fn pdf_err(&self) -> &Array1<f64> {
        &self.pdf_err
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn len(&self) -> usize {
        self.pdf_corr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdf_corr.is_empty()
    }

    /// Conditions this solution was computed under.
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    /// Probability of a correct response within the horizon (Riemann sum).
    pub fn prob_correct(&self) -> f64 {
        self.pdf_corr.sum() * self.dt
    }

    /// Probability of an error response within the horizon (Riemann sum).
    pub fn prob_error(&self) -> f64 {
        self.pdf_err.sum() * self.dt
    }

    /// Probability of never reaching either boundary within the horizon.
    /// Clipped at zero against discretization error.
    pub fn prob_undecided(&self) -> f64 {
        (1.0 - self.prob_correct() - self.prob_error()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn probability_masses_follow_riemann_sums() {
        let sol =
            Solution::new(array![1.0, 2.0, 1.0], array![0.5, 0.5, 0.0], 0.1, Conditions::new());
        assert!((sol.prob_correct() - 0.4).abs() < 1e-12);
        assert!((sol.prob_error() - 0.1).abs() < 1e-12);
        assert!((sol.prob_undecided() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn undecided_probability_is_clipped_at_zero() {
        let sol = Solution::new(array![6.0, 6.0], array![0.0, 0.0], 0.1, Conditions::new());
        assert_eq!(sol.prob_undecided(), 0.0);
    }
}
