//! Drift-diffusion model layer.
//!
//! Purpose
//! -------
//! Everything needed to describe a decision model and evaluate it against
//! behavioral data: parameter declarations ([`params`]), component
//! families ([`components`]), the observed data container ([`sample`]),
//! the solved distribution ([`solution`]) and the [`Model`] aggregate
//! itself ([`ddm`]).
//!
//! Downstream usage
//! ----------------
//! The fitting layer discovers fittable parameters through the component
//! descriptor tables, writes candidates back through `set_param`, and
//! calls [`Model::solve`] inside its loss functions.
pub mod components;
pub mod ddm;
pub mod errors;
pub mod params;
pub mod sample;
pub mod solution;

pub use components::{Bound, Component, Drift, InitialCondition, Noise, Overlay, Role, Task};
pub use ddm::Model;
pub use errors::{ModelError, ModelResult};
pub use params::{Fittable, FittableId, Fitted, Param};
pub use sample::{Conditions, Sample, Trial};
pub use solution::Solution;
