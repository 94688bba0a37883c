//! Objective wrapper tying the binding registry, model and loss together.
//!
//! Purpose
//! -------
//! Present "evaluate this candidate vector" as a single fallible call the
//! backends share: clamp the candidate into the box constraints, write it
//! into the model through the binding registry, evaluate the loss, count
//! the evaluation and notify the progress observer.
//!
//! Key behaviors
//! -------------
//! - Candidates outside the box are projected onto it before evaluation,
//!   so unconstrained backends see a flat continuation instead of an
//!   error.
//! - A NaN or -inf loss aborts the fit with `NonFiniteLoss`; +inf is
//!   allowed so hard-rejected regions remain comparable.
//! - [`ArgminAdapter`] borrows the objective into argmin's `CostFunction`
//!   and `Gradient` traits, finite-differencing the cost for the
//!   derivative-based backend.
use std::cell::{Cell, RefCell};

use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;
use ndarray::Array1;

use crate::{
    fit::{
        binding::ParamBinding,
        errors::{FitError, FitResult},
        loss::LossFunction,
        methods::{Progress, ProgressEvent},
    },
    model::ddm::Model,
};

/// Shared evaluation state for one fit.
pub struct Objective<'a, L: LossFunction> {
    model: RefCell<Model>,
    binding: &'a ParamBinding,
    loss: &'a L,
    evals: Cell<usize>,
    progress: Option<&'a dyn Progress>,
}

impl<'a, L: LossFunction> Objective<'a, L> {
    pub fn new(
        model: Model,
        binding: &'a ParamBinding,
        loss: &'a L,
        progress: Option<&'a dyn Progress>,
    ) -> Objective<'a, L> {
        Objective { model: RefCell::new(model), binding, loss, evals: Cell::new(0), progress }
    }

    /// Evaluate the loss at a candidate vector.
    ///
    /// # Errors
    /// - [`FitError::DimensionMismatch`] if `x` does not match the binding
    ///   registry.
    /// - [`FitError::NonFiniteLoss`] if the loss returns NaN or -inf.
    /// - Any model or loss error from solving.
    pub fn eval(&self, x: &Array1<f64>) -> FitResult<f64> {
        let clamped = self.binding.clamp(x.view());
        let mut model = self.model.borrow_mut();
        self.binding.apply(&mut model, clamped.view())?;
        let loss = self.loss.loss(&model)?;
        drop(model);
        if loss.is_nan() || loss == f64::NEG_INFINITY {
            return Err(FitError::NonFiniteLoss { value: loss });
        }
        let eval = self.evals.get() + 1;
        self.evals.set(eval);
        if let Some(progress) = self.progress {
            progress.on_event(ProgressEvent::Evaluation { eval, x: &clamped, loss });
        }
        Ok(loss)
    }

    /// Loss evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evals.get()
    }

    /// Take the model back out once fitting is done.
    pub fn into_model(self) -> Model {
        self.model.into_inner()
    }
}

/// Borrowing bridge from an [`Objective`] to argmin's problem traits.
pub struct ArgminAdapter<'o, 'a, L: LossFunction> {
    objective: &'o Objective<'a, L>,
}

impl<'o, 'a, L: LossFunction> ArgminAdapter<'o, 'a, L> {
    pub fn new(objective: &'o Objective<'a, L>) -> Self {
        ArgminAdapter { objective }
    }
}

impl<'o, 'a, L: LossFunction> CostFunction for ArgminAdapter<'o, 'a, L> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.objective.eval(x)?)
    }
}

impl<'o, 'a, L: LossFunction> Gradient for ArgminAdapter<'o, 'a, L> {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    /// Finite-difference gradient of the cost.
    ///
    /// The FD closure cannot return `Result`, so evaluation errors are
    /// captured in a cell and surfaced afterwards; central differences are
    /// tried first and forward differences retried when the central
    /// stencil failed or produced non-finite entries.
    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |x: &Array1<f64>| -> f64 {
            match self.cost(x) {
                Ok(value) => value,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let grad = x.central_diff(&cost_func);
        if closure_err.borrow().is_none() && grad.iter().all(|g| g.is_finite()) {
            return Ok(grad);
        }
        closure_err.replace(None);
        let grad = x.forward_diff(&cost_func);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }
        if grad.iter().any(|g| !g.is_finite()) {
            return Err(FitError::InvalidOutcome {
                reason: "Finite-difference gradient has non-finite entries.",
            }
            .into());
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fit::loss::{LossSpec, MapPool},
        model::{
            components::{Bound, Drift, InitialCondition, Noise, Overlay, Task},
            params::{Fittable, Param},
            sample::Sample,
        },
    };
    use ndarray::array;

    fn fixture() -> (Model, ParamBinding, Sample) {
        let drift = Fittable::new(0.5, -5.0, 5.0).unwrap();
        let model = Model::new(
            "objective",
            Drift::Constant { drift: Param::Unbound(drift) },
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
        let binding = ParamBinding::discover(&model);
        let sample = Sample::from_rts(&[0.3, 0.4, 0.5], &[0.6]).unwrap();
        (model, binding, sample)
    }

    /// Scope: evaluation counting and clamping.
    #[test]
    fn eval_counts_and_projects_out_of_box_candidates() {
        let (model, binding, sample) = fixture();
        let loss = LossSpec::Likelihood.build(&sample, &[], 0.01, MapPool::Sequential).unwrap();
        let objective = Objective::new(model, &binding, &loss, None);

        let inside = objective.eval(&array![1.0]).unwrap();
        let outside = objective.eval(&array![99.0]).unwrap();
        let edge = objective.eval(&array![5.0]).unwrap();
        assert_eq!(objective.evaluations(), 3);
        assert!(inside.is_finite());
        // A candidate beyond the box evaluates exactly at the box edge.
        assert_eq!(outside, edge);
    }

    /// Scope: argmin bridge.
    #[test]
    fn adapter_cost_and_gradient_are_finite_near_the_optimum() {
        let (model, binding, sample) = fixture();
        let loss = LossSpec::Likelihood.build(&sample, &[], 0.01, MapPool::Sequential).unwrap();
        let objective = Objective::new(model, &binding, &loss, None);
        let adapter = ArgminAdapter::new(&objective);

        let x = array![1.0];
        assert!(adapter.cost(&x).unwrap().is_finite());
        let grad = adapter.gradient(&x).unwrap();
        assert_eq!(grad.len(), 1);
        assert!(grad[0].is_finite());
    }
}
