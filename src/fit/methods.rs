//! Fitting-method selection, options and outcomes.
//!
//! Purpose
//! -------
//! Declare the closed set of optimization backends ([`Method`]), the
//! validated option structs each backend consumes, the overall
//! [`FitOptions`] bundle, and the outcome types the backends and entry
//! points return.
//!
//! Key behaviors
//! -------------
//! - Method names parse through `FromStr` so callers can select a backend
//!   from configuration or CLI strings; unknown names fail loudly.
//! - Every option struct validates on construction, so a backend can
//!   assume its options are internally consistent.
//! - [`FitOutcome::new`] rejects non-finite losses and parameter values so
//!   a cached fit result is always usable.
//!
//! Conventions
//! -----------
//! - Losses are minimized everywhere; a "better" outcome is a smaller
//!   loss.
//! - Defaults mirror the conventional values for each algorithm family
//!   (e.g. crossover 0.7 and dithered weight in [0.5, 1.0] for
//!   differential evolution).
use std::str::FromStr;

use ndarray::Array1;

use crate::fit::errors::{FitError, FitResult};

/// Optimization backend used to minimize the loss.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    /// Local derivative-based search (L-BFGS with finite-difference
    /// gradients).
    Simple,
    /// Derivative-free simplex search (Nelder-Mead).
    Simplex,
    /// Basin-hopping: repeated local searches from perturbed starting
    /// points with Metropolis acceptance.
    Basin(BasinOptions),
    /// Population-based global search over the full box constraints.
    DifferentialEvolution(DifferentialEvolutionOptions),
    /// Mu-plus-lambda evolution strategy seeded at the model defaults.
    Hillclimb(EvolutionOptions),
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::Simple => "simple",
            Method::Simplex => "simplex",
            Method::Basin(_) => "basin",
            Method::DifferentialEvolution(_) => "differential_evolution",
            Method::Hillclimb(_) => "hillclimb",
        }
    }
}

impl FromStr for Method {
    type Err = FitError;

    fn from_str(s: &str) -> FitResult<Method> {
        match s {
            "simple" => Ok(Method::Simple),
            "simplex" => Ok(Method::Simplex),
            "basin" => Ok(Method::Basin(BasinOptions::default())),
            "differential_evolution" => {
                Ok(Method::DifferentialEvolution(DifferentialEvolutionOptions::default()))
            }
            "hillclimb" => Ok(Method::Hillclimb(EvolutionOptions::default())),
            other => Err(FitError::UnsupportedMethod { name: other.to_string() }),
        }
    }
}

/// Options for the basin-hopping backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinOptions {
    /// Number of hop iterations after the initial local search.
    pub n_iter: usize,
    /// Half-width of the uniform perturbation applied per coordinate.
    pub step_size: f64,
    /// Metropolis temperature for accepting uphill hops.
    pub temperature: f64,
    /// Iteration cap passed to each local search.
    pub local_max_iter: u64,
}

impl BasinOptions {
    pub fn new(
        n_iter: usize,
        step_size: f64,
        temperature: f64,
        local_max_iter: u64,
    ) -> FitResult<BasinOptions> {
        if n_iter == 0 {
            return Err(FitError::InvalidOptions {
                name: "n_iter",
                reason: "Must be at least 1.",
            });
        }
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(FitError::InvalidOptions {
                name: "step_size",
                reason: "Must be finite and positive.",
            });
        }
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(FitError::InvalidOptions {
                name: "temperature",
                reason: "Must be finite and positive.",
            });
        }
        if local_max_iter == 0 {
            return Err(FitError::InvalidOptions {
                name: "local_max_iter",
                reason: "Must be at least 1.",
            });
        }
        Ok(BasinOptions { n_iter, step_size, temperature, local_max_iter })
    }
}

impl Default for BasinOptions {
    fn default() -> Self {
        BasinOptions { n_iter: 100, step_size: 0.5, temperature: 1.0, local_max_iter: 100 }
    }
}

/// Options for the differential-evolution backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialEvolutionOptions {
    /// Generation cap.
    pub max_generations: usize,
    /// Population members per fitted parameter.
    pub popsize: usize,
    /// Crossover probability per coordinate.
    pub crossover: f64,
    /// Differential weight is redrawn uniformly from this range each
    /// generation (dithering).
    pub weight: (f64, f64),
    /// Convergence tolerance: stop when the population's loss spread falls
    /// below `tol` times the mean absolute loss.
    pub tol: f64,
}

impl DifferentialEvolutionOptions {
    pub fn new(
        max_generations: usize,
        popsize: usize,
        crossover: f64,
        weight: (f64, f64),
        tol: f64,
    ) -> FitResult<DifferentialEvolutionOptions> {
        if max_generations == 0 {
            return Err(FitError::InvalidOptions {
                name: "max_generations",
                reason: "Must be at least 1.",
            });
        }
        if popsize < 4 {
            return Err(FitError::InvalidOptions {
                name: "popsize",
                reason: "Population needs at least 4 members per parameter for mutation.",
            });
        }
        if !(0.0..=1.0).contains(&crossover) {
            return Err(FitError::InvalidOptions {
                name: "crossover",
                reason: "Must lie in [0, 1].",
            });
        }
        let (lo, hi) = weight;
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || hi > 2.0 || lo > hi {
            return Err(FitError::InvalidOptions {
                name: "weight",
                reason: "Dither range must satisfy 0 <= low <= high <= 2.",
            });
        }
        if !tol.is_finite() || tol < 0.0 {
            return Err(FitError::InvalidOptions {
                name: "tol",
                reason: "Must be finite and non-negative.",
            });
        }
        Ok(DifferentialEvolutionOptions { max_generations, popsize, crossover, weight, tol })
    }
}

impl Default for DifferentialEvolutionOptions {
    fn default() -> Self {
        DifferentialEvolutionOptions {
            max_generations: 120,
            popsize: 15,
            crossover: 0.7,
            weight: (0.5, 1.0),
            tol: 0.01,
        }
    }
}

/// Options for the mu-plus-lambda evolution strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOptions {
    /// Number of parents kept each generation.
    pub mu: usize,
    /// Number of offspring generated each generation. Must be a multiple
    /// of `mu`.
    pub lambda: usize,
    /// Whether parents survive into the next generation alongside their
    /// offspring.
    pub copy_parents: bool,
    /// Variance of the Gaussian mutation applied per coordinate.
    pub mutate_var: f64,
    /// Probability that any given coordinate is mutated.
    pub mutate_prob: f64,
    /// Fitness-evaluation budget for the generation loop; the strategy
    /// runs `floor(evals / lambda)` generations, each scoring `lambda`
    /// new offspring, after scoring the initial population once. A
    /// budget below `lambda` yields zero generations.
    pub evals: usize,
}

impl EvolutionOptions {
    pub fn new(
        mu: usize,
        lambda: usize,
        copy_parents: bool,
        mutate_var: f64,
        mutate_prob: f64,
        evals: usize,
    ) -> FitResult<EvolutionOptions> {
        if mu == 0 {
            return Err(FitError::InvalidOptions { name: "mu", reason: "Must be at least 1." });
        }
        if lambda == 0 || lambda % mu != 0 {
            return Err(FitError::LambdaMuMismatch { lambda, mu });
        }
        if !mutate_var.is_finite() || mutate_var <= 0.0 {
            return Err(FitError::InvalidOptions {
                name: "mutate_var",
                reason: "Must be finite and positive.",
            });
        }
        if !(0.0..=1.0).contains(&mutate_prob) {
            return Err(FitError::InvalidOptions {
                name: "mutate_prob",
                reason: "Must lie in [0, 1].",
            });
        }
        Ok(EvolutionOptions { mu, lambda, copy_parents, mutate_var, mutate_prob, evals })
    }
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        EvolutionOptions {
            mu: 1,
            lambda: 3,
            copy_parents: true,
            mutate_var: 0.002,
            mutate_prob: 0.5,
            evals: 100,
        }
    }
}

/// Top-level fitting options shared by all backends.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub method: Method,
    /// Iteration cap for the iterative backends.
    pub max_iter: u64,
    /// Seed for the stochastic backends. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl FitOptions {
    pub fn new(method: Method, max_iter: u64, seed: Option<u64>) -> FitResult<FitOptions> {
        if max_iter == 0 {
            return Err(FitError::InvalidOptions {
                name: "max_iter",
                reason: "Must be at least 1.",
            });
        }
        Ok(FitOptions { method, max_iter, seed })
    }

    pub fn with_method(method: Method) -> FitOptions {
        FitOptions { method, ..FitOptions::default() }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            method: Method::DifferentialEvolution(DifferentialEvolutionOptions::default()),
            max_iter: 500,
            seed: None,
        }
    }
}

/// Raw result of a single backend run, before being written back into a
/// model.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Best parameter vector found, in binding-registry order.
    pub x: Array1<f64>,
    /// Loss at `x`.
    pub loss: f64,
    /// Iterations (or generations) the backend performed.
    pub iterations: u64,
    /// Whether the backend stopped at its own convergence criterion
    /// rather than an iteration cap.
    pub converged: bool,
    /// Backend-reported termination description.
    pub status: String,
}

/// Outcome of a completed fit, cached on the model.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Fitting method that produced this outcome.
    pub method: String,
    /// Loss-function name ("likelihood" or "squared_error").
    pub loss_name: &'static str,
    /// Final loss value.
    pub loss: f64,
    /// Fitted parameter vector, in binding-registry order.
    pub x: Array1<f64>,
    /// Total loss evaluations spent across the whole fit.
    pub evaluations: usize,
    /// Backend iterations of the final (or only) search.
    pub iterations: u64,
    /// Whether the backend reported convergence.
    pub converged: bool,
}

impl FitOutcome {
    /// Validate and assemble a fit outcome.
    ///
    /// # Errors
    /// [`FitError::InvalidOutcome`] if the loss or any parameter value is
    /// not finite.
    pub fn new(
        method: String,
        loss_name: &'static str,
        loss: f64,
        x: Array1<f64>,
        evaluations: usize,
        iterations: u64,
        converged: bool,
    ) -> FitResult<FitOutcome> {
        if !loss.is_finite() {
            return Err(FitError::InvalidOutcome { reason: "Loss must be finite." });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(FitError::InvalidOutcome {
                reason: "Fitted parameters must be finite.",
            });
        }
        Ok(FitOutcome { method, loss_name, loss, x, evaluations, iterations, converged })
    }
}

/// Structured progress events emitted while a fit runs.
#[derive(Debug)]
pub enum ProgressEvent<'a> {
    /// A loss evaluation completed.
    Evaluation { eval: usize, x: &'a Array1<f64>, loss: f64 },
    /// A backend (or one local search within a global backend) started.
    BackendStarted { method: &'static str },
    /// A backend finished with the given best loss.
    BackendFinished { method: &'static str, best_loss: f64 },
}

/// Observer for fit progress. Implementations must tolerate being called
/// from worker threads when a parallel map pool is in use.
pub trait Progress: Sync {
    fn on_event(&self, event: ProgressEvent<'_>);
}
