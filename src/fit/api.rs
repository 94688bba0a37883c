//! High-level fitting entry points.
//!
//! Purpose
//! -------
//! The functions callers actually reach for: build-and-fit a model
//! against a sample ([`fit_model`]), refit an existing model in place
//! ([`fit_adjust_model`]), mix solved distributions over partially
//! specified conditions ([`solve_partial_conditions`]), and compare two
//! fitted models parameter by parameter ([`models_close`]).
//!
//! Key behaviors
//! -------------
//! - [`fit_model`] derives the simulation horizon from the slowest
//!   observed response, rounded up to a whole number of time steps, and
//!   refuses horizons at or past the analytic ceiling where the series
//!   loses accuracy.
//! - [`fit_adjust_model`] is the dispatcher: it discovers the binding
//!   registry, builds the loss, hands the shared objective to the chosen
//!   backend and writes the clamped best candidate back into the model.
//! - Stochastic backends draw from a caller-seeded RNG, so a fixed seed
//!   reproduces a fit exactly.
use ndarray::{Array1, Zip};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    fit::{
        binding::ParamBinding,
        errors::{FitError, FitResult},
        evolution::evolution_strategy,
        loss::{LossFunction, LossSpec, MapPool},
        methods::{FitOptions, FitOutcome, Method, Progress, ProgressEvent, SearchOutcome},
        objective::Objective,
        run::{run_lbfgs, run_nelder_mead},
        search::{basin_hopping, differential_evolution},
    },
    model::{
        components::{Bound, Drift, InitialCondition, Noise, Overlay, Task},
        ddm::Model,
        sample::{Conditions, Sample},
        solution::Solution,
    },
};

/// Horizon ceiling for the analytic series, in seconds. Fits require a
/// horizon strictly below this value.
pub const T_DUR_CEILING: f64 = 30.0;

/// Build a model around a sample and fit its unbound parameters.
///
/// The horizon is `ceil(max_rt / dt) * dt`, covering the slowest observed
/// response with a whole number of time steps.
///
/// # Errors
/// - [`FitError::HorizonTooLong`] if the derived horizon reaches
///   [`T_DUR_CEILING`].
/// - Everything [`fit_adjust_model`] can return.
#[allow(clippy::too_many_arguments)]
pub fn fit_model(
    name: impl Into<String>,
    sample: &Sample,
    drift: Drift,
    noise: Noise,
    bound: Bound,
    ic: InitialCondition,
    task: Task,
    overlay: Overlay,
    dt: f64,
    dx: f64,
    loss: LossSpec,
    opts: &FitOptions,
    pool: MapPool,
    progress: Option<&dyn Progress>,
) -> FitResult<Model> {
    let t_dur = ((sample.max_rt() / dt).ceil() * dt).max(dt);
    if t_dur >= T_DUR_CEILING {
        return Err(FitError::HorizonTooLong { t_dur, limit: T_DUR_CEILING });
    }
    let mut model = Model::new(name, drift, noise, bound, ic, task, overlay, t_dur, dt, dx)?;
    fit_adjust_model(sample, &mut model, loss, opts, pool, progress)?;
    Ok(model)
}

/// Fit an existing model's unbound parameters in place.
///
/// On success the model's unbound parameters have been replaced with
/// fitted values, the outcome is cached on the model, and a copy of the
/// outcome is returned.
///
/// # Errors
/// - [`FitError::NoFittableParameters`] if no component declares an
///   unbound parameter.
/// - [`FitError::HorizonTooLong`] if the model's horizon reaches
///   [`T_DUR_CEILING`].
/// - Backend, loss and model errors from the fit itself.
pub fn fit_adjust_model(
    sample: &Sample,
    model: &mut Model,
    loss_spec: LossSpec,
    opts: &FitOptions,
    pool: MapPool,
    progress: Option<&dyn Progress>,
) -> FitResult<FitOutcome> {
    if model.t_dur() >= T_DUR_CEILING {
        return Err(FitError::HorizonTooLong { t_dur: model.t_dur(), limit: T_DUR_CEILING });
    }
    let binding = ParamBinding::discover(model);
    if binding.is_empty() {
        return Err(FitError::NoFittableParameters);
    }
    let loss = loss_spec.build(sample, &model.required_conditions(), model.dt(), pool)?;
    let objective = Objective::new(model.clone(), &binding, &loss, progress);
    let x0 = binding.x0();
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let method_name = opts.method.name();
    if let Some(progress) = progress {
        progress.on_event(ProgressEvent::BackendStarted { method: method_name });
    }
    let searched = match &opts.method {
        Method::Simple => run_lbfgs(&objective, x0, opts.max_iter)?,
        Method::Simplex => run_nelder_mead(&objective, x0, opts.max_iter)?,
        Method::Basin(basin_opts) => basin_hopping(&objective, x0, basin_opts, &mut rng)?,
        Method::DifferentialEvolution(de_opts) => differential_evolution(
            |x| objective.eval(x),
            x0,
            &binding.constraints(),
            de_opts,
            &mut rng,
        )?,
        Method::Hillclimb(es_opts) => {
            let result = evolution_strategy(|x| objective.eval(x), x0, es_opts, &mut rng)?;
            SearchOutcome {
                x: result.x,
                loss: result.loss,
                iterations: result.iterations,
                converged: false,
                status: "evaluation budget spent".to_string(),
            }
        }
    };
    if let Some(progress) = progress {
        progress.on_event(ProgressEvent::BackendFinished {
            method: method_name,
            best_loss: searched.loss,
        });
    }

    let best = binding.clamp(searched.x.view());
    binding.apply(model, best.view())?;
    let outcome = FitOutcome::new(
        method_name.to_string(),
        loss.name(),
        searched.loss,
        best,
        objective.evaluations(),
        searched.iterations,
        searched.converged,
    )?;
    model.set_fit_result(outcome.clone());
    Ok(outcome)
}

/// Solve the model under every condition combination matching a partial
/// condition map and mix the results, weighting each combination by its
/// share of the full sample.
///
/// An empty map reproduces the sample-wide mixture. Weights stay relative
/// to the whole sample, so the mixed distribution of a strict subset
/// integrates to that subset's share of the data.
///
/// # Errors
/// [`FitError::UnknownCondition`] if a supplied condition name appears in
/// no trial of the sample.
pub fn solve_partial_conditions(
    model: &Model,
    sample: &Sample,
    conditions: &Conditions,
) -> FitResult<Solution> {
    for name in conditions.keys() {
        let known = sample.trials().iter().any(|t| t.conditions.contains_key(name));
        if !known {
            return Err(FitError::UnknownCondition { name: name.clone() });
        }
    }

    let required = model.required_conditions();
    let combos = sample.condition_combinations(&required)?;
    let total = sample.len() as f64;
    let grid_len = model.t_domain().len();
    let mut mixed_corr = Array1::zeros(grid_len);
    let mut mixed_err = Array1::zeros(grid_len);

    for combo in combos {
        // Skip combinations that contradict the partial map; merge in the
        // partial entries the model itself does not require so the subset
        // narrows on them too.
        let mut merged = combo.clone();
        let mut conflict = false;
        for (name, &value) in conditions {
            match merged.get(name) {
                Some(existing) if existing.to_bits() != value.to_bits() => {
                    conflict = true;
                    break;
                }
                _ => {
                    merged.insert(name.clone(), value);
                }
            }
        }
        if conflict {
            continue;
        }
        let subset = sample.subset(&merged);
        if subset.is_empty() {
            continue;
        }
        let weight = subset.len() as f64 / total;
        let solution = model.solve(&combo)?;
        Zip::from(&mut mixed_corr)
            .and(solution.pdf_corr())
            .for_each(|m, &p| *m += weight * p);
        Zip::from(&mut mixed_err)
            .and(solution.pdf_err())
            .for_each(|m, &p| *m += weight * p);
    }

    Ok(Solution::new(mixed_corr, mixed_err, model.dt(), conditions.clone()))
}

/// Whether two structurally identical models agree on every parameter to
/// within `tol`.
///
/// # Errors
/// - [`FitError::ModelTypeMismatch`] if the component families differ.
/// - [`FitError::ParamCountMismatch`] if the parameter counts differ.
pub fn models_close(a: &Model, b: &Model, tol: f64) -> FitResult<bool> {
    if a.component_names() != b.component_names() {
        return Err(FitError::ModelTypeMismatch);
    }
    let pa = a.parameter_values();
    let pb = b.parameter_values();
    if pa.len() != pb.len() {
        return Err(FitError::ParamCountMismatch { expected: pa.len(), found: pb.len() });
    }
    Ok(pa.iter().zip(pb.iter()).all(|(x, y)| (x - y).abs() <= tol))
}
