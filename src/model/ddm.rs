//! Drift-diffusion model aggregate.
//!
//! Purpose
//! -------
//! Bundle the six component roles with the simulation grid into a single
//! solvable [`Model`], the central object both the analytic solver and the
//! fitting engine operate on.
//!
//! Key behaviors
//! -------------
//! - `solve` evaluates the components under a condition map, runs the
//!   analytic first-passage solver over the time grid, and applies the
//!   overlay to the result.
//! - `required_conditions` is the sorted deduplicated union of every
//!   component's declared condition dependencies.
//! - `Display` renders a parameter summary partitioned into fixed, fitted
//!   and not-yet-fitted sections, flagging fitted values that landed at a
//!   bound.
//!
//! Invariants & assumptions
//! ------------------------
//! - `t_dur`, `dt` and `dx` are validated at construction and never change
//!   afterwards; the time grid always starts at 0 and includes `t_dur`.
//! - Component mutation goes through [`Model::component_mut`] and the
//!   [`Component`] descriptor contract so the binding registry stays
//!   consistent with what `solve` reads.
use crate::{
    analytic::analytic_ddm,
    fit::methods::FitOutcome,
    model::{
        components::{Bound, Component, Drift, InitialCondition, Noise, Overlay, Role, Task},
        errors::{ModelError, ModelResult},
        params::Param,
        sample::Conditions,
        solution::Solution,
    },
};
use ndarray::Array1;

/// A complete drift-diffusion model: components plus simulation grid.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    drift: Drift,
    noise: Noise,
    bound: Bound,
    ic: InitialCondition,
    task: Task,
    overlay: Overlay,
    t_dur: f64,
    dt: f64,
    dx: f64,
    fit_result: Option<FitOutcome>,
}

impl Model {
    /// Assemble a model, validating the simulation grid.
    ///
    /// # Errors
    /// - [`ModelError::InvalidHorizon`] if `t_dur` is not finite and
    ///   positive.
    /// - [`ModelError::InvalidResolution`] if `dt` or `dx` is not finite
    ///   and positive, or `dt` exceeds the horizon.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        drift: Drift,
        noise: Noise,
        bound: Bound,
        ic: InitialCondition,
        task: Task,
        overlay: Overlay,
        t_dur: f64,
        dt: f64,
        dx: f64,
    ) -> ModelResult<Model> {
        if !t_dur.is_finite() || t_dur <= 0.0 {
            return Err(ModelError::InvalidHorizon {
                t_dur,
                reason: "Horizon must be finite and positive.",
            });
        }
        for (value, what) in [(dt, "dt"), (dx, "dx")] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ModelError::InvalidResolution {
                    value,
                    reason: match what {
                        "dt" => "Time step must be finite and positive.",
                        _ => "Space step must be finite and positive.",
                    },
                });
            }
        }
        if dt > t_dur {
            return Err(ModelError::InvalidResolution {
                value: dt,
                reason: "Time step must not exceed the horizon.",
            });
        }
        Ok(Model {
            name: name.into(),
            drift,
            noise,
            bound,
            ic,
            task,
            overlay,
            t_dur,
            dt,
            dx,
            fit_result: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn t_dur(&self) -> f64 {
        self.t_dur
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// The component filling the given role.
    pub fn component(&self, role: Role) -> &dyn Component {
        match role {
            Role::Drift => &self.drift,
            Role::Noise => &self.noise,
            Role::Bound => &self.bound,
            Role::InitialCondition => &self.ic,
            Role::Task => &self.task,
            Role::Overlay => &self.overlay,
        }
    }

    /// Mutable access for parameter writes via the descriptor contract.
    pub fn component_mut(&mut self, role: Role) -> &mut dyn Component {
        match role {
            Role::Drift => &mut self.drift,
            Role::Noise => &mut self.noise,
            Role::Bound => &mut self.bound,
            Role::InitialCondition => &mut self.ic,
            Role::Task => &mut self.task,
            Role::Overlay => &mut self.overlay,
        }
    }

    /// Family names of all six components, in role order. Two models are
    /// structurally comparable exactly when these lists match.
    pub fn component_names(&self) -> Vec<&'static str> {
        Role::ALL.iter().map(|role| self.component(*role).component_name()).collect()
    }

    /// Current numeric value of every component parameter, flattened in
    /// role order then declaration order.
    pub fn parameter_values(&self) -> Vec<f64> {
        Role::ALL
            .iter()
            .flat_map(|role| self.component(*role).params())
            .map(|(_, param)| param.value())
            .collect()
    }

    /// Sorted deduplicated union of condition names the components read.
    pub fn required_conditions(&self) -> Vec<String> {
        let mut names: Vec<String> = Role::ALL
            .iter()
            .flat_map(|role| self.component(*role).required_conditions())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// The time grid `0, dt, 2·dt, …, t_dur`.
    pub fn t_domain(&self) -> Array1<f64> {
        let n = (self.t_dur / self.dt).round() as usize + 1;
        Array1::from_iter((0..n).map(|i| i as f64 * self.dt))
    }

    /// Solve the model analytically under the given conditions.
    pub fn solve(&self, conditions: &Conditions) -> ModelResult<Solution> {
        let mu = self.drift.rate(conditions)?;
        let sigma = self.noise.level(conditions)?;
        let (b, b_slope) = self.bound.linear();
        let teval = self.t_domain();
        let (pdf_corr, pdf_err) = analytic_ddm(mu, sigma, b, teval.view(), b_slope)?;
        let solution = Solution::new(pdf_corr, pdf_err, self.dt, conditions.clone());
        self.overlay.apply(solution, self.t_dur)
    }

    /// Outcome of the most recent fit of this model, if any.
    pub fn fit_result(&self) -> Option<&FitOutcome> {
        self.fit_result.as_ref()
    }

    /// Record the outcome of a fit. Called by the fitting entry points
    /// after writing the fitted parameters back into the components.
    pub fn set_fit_result(&mut self, outcome: FitOutcome) {
        self.fit_result = Some(outcome);
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Model '{}':", self.name)?;
        for role in Role::ALL {
            let component = self.component(role);
            writeln!(f, "  {role}: {}", component.component_name())?;
            for (name, param) in component.params() {
                match param {
                    Param::Fixed(value) => {
                        writeln!(f, "    {name} = {value} (fixed)")?;
                    }
                    Param::Unbound(fittable) => {
                        writeln!(
                            f,
                            "    {name} = {} (fittable in [{}, {}])",
                            fittable.default, fittable.minval, fittable.maxval
                        )?;
                    }
                    Param::Bound(fitted) => {
                        let warn = if fitted.at_boundary() { "  AT BOUNDARY" } else { "" };
                        writeln!(
                            f,
                            "    {name} = {} (fitted in [{}, {}]){warn}",
                            fitted.value, fitted.minval, fitted.maxval
                        )?;
                    }
                }
            }
        }
        if let Some(outcome) = &self.fit_result {
            writeln!(f, "  loss: {} ({} evaluations)", outcome.loss, outcome.evaluations)?;
        }
        Ok(())
    }
}
