//! Loss functions comparing a model against an observed sample.
//!
//! Purpose
//! -------
//! Turn a model plus a sample into a single scalar to minimize. Both
//! losses partition the sample by the model's required conditions, solve
//! the model once per condition combination, and reduce across
//! combinations through an injected map pool so the per-combination work
//! can run in parallel.
//!
//! Key behaviors
//! -------------
//! - [`LossLikelihood`] is the negative log-likelihood of the observed
//!   reaction times under the solved densities, with a floor of 1e-100
//!   before the logarithm so excluded regions stay finite.
//! - [`LossSquaredError`] compares the solved densities against empirical
//!   histograms binned on the model's time grid.
//! - Construction precomputes the per-combination subsets; evaluation
//!   only solves and reduces.
//!
//! Conventions
//! -----------
//! - Reaction times map to grid bins by nearest-neighbor rounding,
//!   clamped to the grid.
use ndarray::Array1;
use rayon::prelude::*;

use crate::{
    fit::errors::FitResult,
    model::{ddm::Model, sample::{Conditions, Sample}},
};

/// Density floor applied before taking logarithms.
const PDF_FLOOR: f64 = 1e-100;

/// How per-condition work is mapped: sequentially on the calling thread
/// or across the rayon worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapPool {
    #[default]
    Sequential,
    Rayon,
}

impl MapPool {
    /// Apply `f` to every item, preserving input order in the output.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match self {
            MapPool::Sequential => items.iter().map(f).collect(),
            MapPool::Rayon => items.par_iter().map(f).collect(),
        }
    }
}

/// Which loss function to fit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossSpec {
    Likelihood,
    SquaredError,
}

impl LossSpec {
    pub fn name(&self) -> &'static str {
        match self {
            LossSpec::Likelihood => "likelihood",
            LossSpec::SquaredError => "squared_error",
        }
    }

    /// Precompute the per-condition subsets and build the loss.
    ///
    /// # Errors
    /// [`ModelError::MissingCondition`] if a required condition is absent
    /// from any trial.
    pub fn build(
        &self,
        sample: &Sample,
        required_conditions: &[String],
        dt: f64,
        pool: MapPool,
    ) -> FitResult<Loss> {
        let combos = sample.condition_combinations(required_conditions)?;
        let subsets: Vec<(Conditions, Sample)> =
            combos.into_iter().map(|c| (c.clone(), sample.subset(&c))).collect();
        Ok(match self {
            LossSpec::Likelihood => Loss::Likelihood(LossLikelihood { subsets, dt, pool }),
            LossSpec::SquaredError => Loss::SquaredError(LossSquaredError { subsets, dt, pool }),
        })
    }
}

/// A built loss function, ready to evaluate against candidate models.
#[derive(Debug, Clone)]
pub enum Loss {
    Likelihood(LossLikelihood),
    SquaredError(LossSquaredError),
}

impl LossFunction for Loss {
    fn loss(&self, model: &Model) -> FitResult<f64> {
        match self {
            Loss::Likelihood(inner) => inner.loss(model),
            Loss::SquaredError(inner) => inner.loss(model),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Loss::Likelihood(_) => LossSpec::Likelihood.name(),
            Loss::SquaredError(_) => LossSpec::SquaredError.name(),
        }
    }
}

/// Scalar objective evaluated by the fitting backends.
pub trait LossFunction {
    fn loss(&self, model: &Model) -> FitResult<f64>;
    fn name(&self) -> &'static str;
}

fn bin_index(rt: f64, dt: f64, len: usize) -> usize {
    ((rt / dt).round() as usize).min(len - 1)
}

/// Negative log-likelihood of the sample under the model.
#[derive(Debug, Clone)]
pub struct LossLikelihood {
    subsets: Vec<(Conditions, Sample)>,
    dt: f64,
    pool: MapPool,
}

impl LossFunction for LossLikelihood {
    fn loss(&self, model: &Model) -> FitResult<f64> {
        let dt = self.dt;
        let partials = self.pool.map(&self.subsets, |(conditions, subset)| {
            let solution = model.solve(conditions)?;
            let len = solution.len();
            let mut nll = 0.0;
            for trial in subset.trials() {
                let bin = bin_index(trial.rt, dt, len);
                let pdf = if trial.correct {
                    solution.pdf_corr()[bin]
                } else {
                    solution.pdf_err()[bin]
                };
                nll -= pdf.max(PDF_FLOOR).ln();
            }
            Ok(nll)
        });
        partials.into_iter().sum()
    }

    fn name(&self) -> &'static str {
        LossSpec::Likelihood.name()
    }
}

/// Squared distance between the solved densities and the empirical
/// reaction-time histograms, per condition combination.
#[derive(Debug, Clone)]
pub struct LossSquaredError {
    subsets: Vec<(Conditions, Sample)>,
    dt: f64,
    pool: MapPool,
}

impl LossSquaredError {
    fn histograms(subset: &Sample, dt: f64, len: usize) -> (Array1<f64>, Array1<f64>) {
        let mut corr = Array1::zeros(len);
        let mut err = Array1::zeros(len);
        // Histogram heights in density units, so the correct-response area
        // integrates to the empirical probability of a correct response.
        let weight = 1.0 / (subset.len() as f64 * dt);
        for trial in subset.trials() {
            let bin = bin_index(trial.rt, dt, len);
            if trial.correct {
                corr[bin] += weight;
            } else {
                err[bin] += weight;
            }
        }
        (corr, err)
    }
}

impl LossFunction for LossSquaredError {
    fn loss(&self, model: &Model) -> FitResult<f64> {
        let dt = self.dt;
        let partials = self.pool.map(&self.subsets, |(conditions, subset)| {
            let solution = model.solve(conditions)?;
            let len = solution.len();
            let (hist_corr, hist_err) = LossSquaredError::histograms(subset, dt, len);
            let mut total = 0.0;
            for i in 0..len {
                let dc = solution.pdf_corr()[i] - hist_corr[i];
                let de = solution.pdf_err()[i] - hist_err[i];
                total += (dc * dc + de * de) * dt;
            }
            Ok(total)
        });
        partials.into_iter().sum()
    }

    fn name(&self) -> &'static str {
        LossSpec::SquaredError.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        components::{Bound, Drift, InitialCondition, Noise, Overlay, Task},
        params::Param,
        sample::Trial,
    };

    fn plain_model(drift: f64) -> Model {
        Model::new(
            "loss",
            Drift::Constant { drift: Param::Fixed(drift) },
            Noise::Constant { noise: Param::Fixed(1.0) },
            Bound::Constant { b: Param::Fixed(1.0) },
            InitialCondition::PointSourceCenter,
            Task::FixedDuration,
            Overlay::None,
            2.0,
            0.01,
            0.1,
        )
        .unwrap()
    }

    fn simple_sample() -> Sample {
        Sample::from_rts(&[0.3, 0.4, 0.5, 0.6], &[0.5, 0.7]).unwrap()
    }

    /// Scope: likelihood ordering.
    /// Given a sample of mostly fast correct responses generated under
    /// positive drift, expect a matching drift to score a lower negative
    /// log-likelihood than a sign-flipped one.
    #[test]
    fn likelihood_prefers_the_matching_drift_sign() {
        let sample = simple_sample();
        let loss = LossSpec::Likelihood.build(&sample, &[], 0.01, MapPool::Sequential).unwrap();

        let good = loss.loss(&plain_model(1.0)).unwrap();
        let bad = loss.loss(&plain_model(-1.0)).unwrap();
        assert!(good < bad);
    }

    /// Scope: sequential and rayon pools agree.
    #[test]
    fn pool_choice_does_not_change_the_loss() {
        let sample = simple_sample();
        let model = plain_model(0.8);
        let seq = LossSpec::Likelihood
            .build(&sample, &[], 0.01, MapPool::Sequential)
            .unwrap()
            .loss(&model)
            .unwrap();
        let par = LossSpec::Likelihood
            .build(&sample, &[], 0.01, MapPool::Rayon)
            .unwrap()
            .loss(&model)
            .unwrap();
        assert_eq!(seq, par);
    }

    /// Scope: squared error is non-negative and smaller for a better model.
    #[test]
    fn squared_error_orders_candidate_models() {
        let sample = simple_sample();
        let loss = LossSpec::SquaredError.build(&sample, &[], 0.01, MapPool::Sequential).unwrap();

        let good = loss.loss(&plain_model(1.0)).unwrap();
        let bad = loss.loss(&plain_model(-2.0)).unwrap();
        assert!(good >= 0.0);
        assert!(good < bad);
    }

    /// Scope: condition partitioning.
    /// Given trials under two coherence levels and a condition-scaled
    /// drift, expect the loss to solve each combination separately and
    /// reject samples missing the covariate.
    #[test]
    fn conditioned_losses_partition_the_sample() {
        let conds = |coh: f64| {
            let mut c = Conditions::new();
            c.insert("coh".to_string(), coh);
            c
        };
        let sample = Sample::new(vec![
            Trial::new(0.4, true, conds(0.1)),
            Trial::new(0.5, false, conds(0.1)),
            Trial::new(0.3, true, conds(0.4)),
        ])
        .unwrap();
        let required = vec!["coh".to_string()];
        let loss =
            LossSpec::Likelihood.build(&sample, &required, 0.01, MapPool::Sequential).unwrap();

        let model = Model::new(
            "scaled",
            Drift::ConditionScaled { scale: Param::Fixed(2.0), condition: "coh".to_string() },
            Noise::Constant { noise: Param::Fixed(1.0) },
            Bound::Constant { b: Param::Fixed(1.0) },
            InitialCondition::PointSourceCenter,
            Task::FixedDuration,
            Overlay::None,
            2.0,
            0.01,
            0.1,
        )
        .unwrap();
        assert!(loss.loss(&model).unwrap().is_finite());

        let plain = Sample::from_rts(&[0.3], &[]).unwrap();
        assert!(LossSpec::Likelihood
            .build(&plain, &required, 0.01, MapPool::Sequential)
            .is_err());
    }
}
