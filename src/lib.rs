//! driftfit — analytic drift-diffusion modeling and parameter fitting.
//!
//! Purpose
//! -------
//! Model two-alternative decision making with the drift diffusion model:
//! solve first-passage-time distributions in closed form for linearly
//! collapsing symmetric boundaries, and fit model parameters to observed
//! reaction-time data with a choice of local and global optimizers.
//!
//! Key behaviors
//! -------------
//! - [`analytic`] evaluates the method-of-images series for the
//!   first-passage densities at both boundaries on an arbitrary time
//!   grid.
//! - [`model`] declares parameters (fixed, fittable, fitted), component
//!   families (drift, noise, bound, initial condition, task, overlay),
//!   reaction-time samples and the solvable [`model::Model`] aggregate.
//! - [`fit`] binds fittable parameters to optimizer coordinates,
//!   evaluates likelihood or squared-error losses, and dispatches to one
//!   of five optimization backends.
//!
//! Conventions
//! -----------
//! - Time is in seconds, densities in probability per second; the upper
//!   boundary is the "correct" response.
//! - Fallible operations return crate error enums through `Result`; the
//!   library never panics on invalid user input.
//! - Two parameter slots share one fitted value exactly when they share
//!   one [`model::Fittable`] identity, not when their settings happen to
//!   match.
//!
//! Downstream usage
//! ----------------
//! - Typical flow: build a [`model::Sample`], declare components with
//!   [`model::Fittable`] parameters, call [`fit::api::fit_model`], then
//!   inspect the returned model and [`fit::diagnostics::hit_boundary`].
//! - `driftfit::prelude::*` imports the whole user-facing surface.

pub mod analytic;
pub mod fit;
pub mod model;

pub mod prelude {
    pub use crate::analytic::{analytic_ddm, analytic_ddm_linbound, AnalyticError, AnalyticResult};
    pub use crate::fit::prelude::*;
    pub use crate::model::{
        Bound, Component, Conditions, Drift, Fittable, FittableId, Fitted, InitialCondition,
        Model, ModelError, ModelResult, Noise, Overlay, Param, Role, Sample, Solution, Task,
        Trial,
    };
}
