//! Execution helpers that run `argmin` solvers over a fit objective and
//! return crate-friendly [`SearchOutcome`]s.
use argmin::{
    core::{Executor, State, TerminationReason, TerminationStatus},
    solver::{
        linesearch::MoreThuenteLineSearch,
        neldermead::NelderMead,
        quasinewton::LBFGS,
    },
};
use ndarray::Array1;

use crate::fit::{
    errors::{FitError, FitResult},
    loss::LossFunction,
    methods::SearchOutcome,
    objective::{ArgminAdapter, Objective},
};

/// History length of the L-BFGS curvature approximation.
const LBFGS_MEM: usize = 7;
/// Gradient-norm tolerance for the derivative-based search.
const TOL_GRAD: f64 = 1e-6;
/// Standard-deviation tolerance for simplex convergence.
const SIMPLEX_SD_TOL: f64 = 1e-8;

fn converged(status: &TerminationStatus) -> bool {
    matches!(
        status,
        TerminationStatus::Terminated(
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached
        )
    )
}

/// Run L-BFGS with a More-Thuente line search and finite-difference
/// gradients from `x0`.
pub fn run_lbfgs<L: LossFunction>(
    objective: &Objective<'_, L>,
    x0: Array1<f64>,
    max_iter: u64,
) -> FitResult<SearchOutcome> {
    let problem = ArgminAdapter::new(objective);
    let linesearch = MoreThuenteLineSearch::new();
    let solver = LBFGS::new(linesearch, LBFGS_MEM).with_tolerance_grad(TOL_GRAD)?;

    let mut state = Executor::new(problem, solver)
        .configure(|state| state.param(x0).max_iters(max_iter))
        .run()?
        .state()
        .clone();

    let iterations = state.get_iter();
    let termination = state.get_termination_status().clone();
    let loss = state.get_best_cost();
    let x = state.take_best_param().ok_or(FitError::MissingBestParameter)?;
    Ok(SearchOutcome {
        x,
        loss,
        iterations,
        converged: converged(&termination),
        status: format!("{termination:?}"),
    })
}

/// Run a Nelder-Mead simplex search from `x0`.
///
/// The initial simplex follows the usual construction: each vertex nudges
/// one coordinate by 5%, or by a small absolute step where the coordinate
/// is zero.
pub fn run_nelder_mead<L: LossFunction>(
    objective: &Objective<'_, L>,
    x0: Array1<f64>,
    max_iter: u64,
) -> FitResult<SearchOutcome> {
    let problem = ArgminAdapter::new(objective);
    let mut simplex = vec![x0.clone()];
    for i in 0..x0.len() {
        let mut vertex = x0.clone();
        vertex[i] = if vertex[i] != 0.0 { vertex[i] * 1.05 } else { 0.00025 };
        simplex.push(vertex);
    }
    let solver = NelderMead::new(simplex).with_sd_tolerance(SIMPLEX_SD_TOL)?;

    let mut state = Executor::new(problem, solver)
        .configure(|state| state.max_iters(max_iter))
        .run()?
        .state()
        .clone();

    let iterations = state.get_iter();
    let termination = state.get_termination_status().clone();
    let loss = state.get_best_cost();
    let x = state.take_best_param().ok_or(FitError::MissingBestParameter)?;
    Ok(SearchOutcome {
        x,
        loss,
        iterations,
        converged: converged(&termination),
        status: format!("{termination:?}"),
    })
}
