//! fit — parameter binding, losses, optimization backends, and entry points.
//!
//! Purpose
//! -------
//! Everything between "a model with unbound parameters plus a sample" and
//! "a fitted model": the binding registry that maps fittables to
//! optimizer coordinates ([`binding`]), the loss functions ([`loss`]),
//! the shared evaluation objective and its argmin bridge ([`objective`]),
//! the backend implementations ([`run`], [`search`], [`evolution`]), the
//! method/option/outcome types ([`methods`]), the high-level entry points
//! ([`api`]) and post-fit boundary diagnostics ([`diagnostics`]).
//!
//! Key behaviors
//! -------------
//! - Five backends behind one dispatcher: a derivative-based local search,
//!   a simplex search, basin-hopping, differential evolution, and a
//!   mu-plus-lambda evolution strategy.
//! - All backends minimize; loss functions are phrased so smaller is
//!   better.
//! - Configuration mistakes, numerical failures and backend solver errors
//!   all normalize into [`errors::FitError`] with the common
//!   [`errors::FitResult`] alias.
//!
//! Conventions
//! -----------
//! - Candidate vectors follow binding-registry order everywhere: starting
//!   points, constraints, backend outputs and cached outcomes.
//! - Stochastic backends take the RNG from `FitOptions::seed`; a fixed
//!   seed reproduces a fit bit for bit.
//! - Progress reporting goes through the [`methods::Progress`] observer;
//!   no backend prints or logs on its own.
//!
//! Downstream usage
//! ----------------
//! - Most callers only need [`api::fit_model`] or
//!   [`api::fit_adjust_model`] plus [`methods::FitOptions`]; the backend
//!   modules are public for callers composing their own searches.
//! - `fit::prelude::*` imports the main fitting surface in one line.

pub mod api;
pub mod binding;
pub mod diagnostics;
pub mod errors;
pub mod evolution;
pub mod loss;
pub mod methods;
pub mod objective;
pub mod run;
pub mod search;

pub mod prelude {
    pub use super::api::{
        fit_adjust_model, fit_model, models_close, solve_partial_conditions, T_DUR_CEILING,
    };
    pub use super::binding::{BindingRecord, ParamBinding, ParamSlot};
    pub use super::diagnostics::{dependence_hit_boundary, hit_boundary, BoundSide, BoundaryHit};
    pub use super::errors::{FitError, FitResult};
    pub use super::evolution::{evolution_strategy, EvolutionOutcome};
    pub use super::loss::{Loss, LossFunction, LossSpec, MapPool};
    pub use super::methods::{
        BasinOptions, DifferentialEvolutionOptions, EvolutionOptions, FitOptions, FitOutcome,
        Method, Progress, ProgressEvent, SearchOutcome,
    };
}
