//! Model components: drift, noise, bound, initial condition, task, overlay.
//!
//! Purpose
//! -------
//! Define the component contract the fitting engine relies on — a fixed
//! descriptor table of named parameters plus declared condition
//! dependencies — and the concrete analytic-solvable component families.
//!
//! Key behaviors
//! -------------
//! - [`Component`] exposes `params()` (the `(name, value)` descriptor
//!   table), `set_param()` (write one named parameter), and
//!   `required_conditions()` (trial covariates the component reads).
//! - Each family is a closed enum; behavior methods (`rate`, `level`,
//!   `linear`, `apply`) evaluate the family under a condition map.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every family here maps onto the linear-boundary analytic solver;
//!   component catalogues beyond that (exponential collapse, arbitrary
//!   drift fields) are deliberately out of scope.
//! - `set_param` only accepts names the variant declares; unknown names are
//!   an error, never silently ignored, so the binding registry can trust
//!   its slot table.
use crate::model::{
    errors::{ModelError, ModelResult},
    params::Param,
    sample::Conditions,
    solution::Solution,
};
use ndarray::Array1;

/// The fixed set of component roles a model aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Drift,
    Noise,
    Bound,
    InitialCondition,
    Task,
    Overlay,
}

impl Role {
    pub const ALL: [Role; 6] =
        [Role::Drift, Role::Noise, Role::Bound, Role::InitialCondition, Role::Task, Role::Overlay];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Drift => "drift",
            Role::Noise => "noise",
            Role::Bound => "bound",
            Role::InitialCondition => "IC",
            Role::Task => "task",
            Role::Overlay => "overlay",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptor-table contract every component family implements.
pub trait Component {
    /// Family name as shown in summaries and diagnostics.
    fn component_name(&self) -> &'static str;

    /// The `(parameter name, value)` descriptor table, in declaration order.
    fn params(&self) -> Vec<(&'static str, Param)>;

    /// Write one named parameter.
    ///
    /// # Errors
    /// [`ModelError::UnknownParameter`] if the variant does not declare
    /// `name`.
    fn set_param(&mut self, name: &str, value: Param) -> ModelResult<()>;

    /// Names of the trial-level condition covariates this component reads.
    fn required_conditions(&self) -> Vec<&str> {
        Vec::new()
    }
}

fn unknown(component: &'static str, name: &str) -> ModelError {
    ModelError::UnknownParameter { component, name: name.to_string() }
}

fn condition(conditions: &Conditions, name: &str) -> ModelResult<f64> {
    conditions
        .get(name)
        .copied()
        .ok_or_else(|| ModelError::MissingCondition { name: name.to_string() })
}

// ---- Drift -----------------------------------------------------------------

/// How the evidence-accumulation drift rate is determined.
#[derive(Debug, Clone, PartialEq)]
pub enum Drift {
    /// Constant drift rate.
    Constant { drift: Param },
    /// Drift proportional to a trial-level covariate (e.g. stimulus
    /// coherence): `rate = scale · conditions[condition]`.
    ConditionScaled { scale: Param, condition: String },
}

impl Drift {
    /// Drift rate under the given conditions.
    pub fn rate(&self, conditions: &Conditions) -> ModelResult<f64> {
        match self {
            Drift::Constant { drift } => Ok(drift.value()),
            Drift::ConditionScaled { scale, condition: name } => {
                Ok(scale.value() * condition(conditions, name)?)
            }
        }
    }
}

impl Component for Drift {
    fn component_name(&self) -> &'static str {
        match self {
            Drift::Constant { .. } => "DriftConstant",
            Drift::ConditionScaled { .. } => "DriftConditionScaled",
        }
    }

    fn params(&self) -> Vec<(&'static str, Param)> {
        match self {
            Drift::Constant { drift } => vec![("drift", *drift)],
            Drift::ConditionScaled { scale, .. } => vec![("scale", *scale)],
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> ModelResult<()> {
        match (self, name) {
            (Drift::Constant { drift }, "drift") => {
                *drift = value;
                Ok(())
            }
            (Drift::ConditionScaled { scale, .. }, "scale") => {
                *scale = value;
                Ok(())
            }
            (me, _) => Err(unknown(me.component_name(), name)),
        }
    }

    fn required_conditions(&self) -> Vec<&str> {
        match self {
            Drift::Constant { .. } => Vec::new(),
            Drift::ConditionScaled { condition, .. } => vec![condition.as_str()],
        }
    }
}

// ---- Noise -----------------------------------------------------------------

/// How the diffusion noise intensity is determined.
#[derive(Debug, Clone, PartialEq)]
pub enum Noise {
    Constant { noise: Param },
}

impl Noise {
    pub fn level(&self, _conditions: &Conditions) -> ModelResult<f64> {
        match self {
            Noise::Constant { noise } => Ok(noise.value()),
        }
    }
}

impl Component for Noise {
    fn component_name(&self) -> &'static str {
        "NoiseConstant"
    }

    fn params(&self) -> Vec<(&'static str, Param)> {
        match self {
            Noise::Constant { noise } => vec![("noise", *noise)],
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> ModelResult<()> {
        match (self, name) {
            (Noise::Constant { noise }, "noise") => {
                *noise = value;
                Ok(())
            }
            (me, _) => Err(unknown(me.component_name(), name)),
        }
    }
}

// ---- Bound -----------------------------------------------------------------

/// Time dependence of the symmetric decision boundaries. Restricted to the
/// linear forms the analytic solver handles.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Constant boundary at `±b`.
    Constant { b: Param },
    /// Boundary collapsing linearly at `slope ≥ 0` units per second:
    /// `±(b − slope·t)`.
    CollapsingLinear { b: Param, slope: Param },
}

impl Bound {
    /// `(separation, slope)` of the upper boundary `b + slope·t`, as the
    /// analytic solver expects (a collapsing bound has negative slope).
    pub fn linear(&self) -> (f64, f64) {
        match self {
            Bound::Constant { b } => (b.value(), 0.0),
            Bound::CollapsingLinear { b, slope } => (b.value(), -slope.value()),
        }
    }
}

impl Component for Bound {
    fn component_name(&self) -> &'static str {
        match self {
            Bound::Constant { .. } => "BoundConstant",
            Bound::CollapsingLinear { .. } => "BoundCollapsingLinear",
        }
    }

    fn params(&self) -> Vec<(&'static str, Param)> {
        match self {
            Bound::Constant { b } => vec![("B", *b)],
            Bound::CollapsingLinear { b, slope } => vec![("B", *b), ("slope", *slope)],
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> ModelResult<()> {
        match (self, name) {
            (Bound::Constant { b }, "B") => {
                *b = value;
                Ok(())
            }
            (Bound::CollapsingLinear { b, .. }, "B") => {
                *b = value;
                Ok(())
            }
            (Bound::CollapsingLinear { slope, .. }, "slope") => {
                *slope = value;
                Ok(())
            }
            (me, _) => Err(unknown(me.component_name(), name)),
        }
    }
}

// ---- Initial condition -----------------------------------------------------

/// Starting distribution of the diffusion. The analytic solver requires a
/// point source centered between the boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialCondition {
    PointSourceCenter,
}

impl Component for InitialCondition {
    fn component_name(&self) -> &'static str {
        "ICPointSourceCenter"
    }

    fn params(&self) -> Vec<(&'static str, Param)> {
        Vec::new()
    }

    fn set_param(&mut self, name: &str, _value: Param) -> ModelResult<()> {
        Err(unknown(self.component_name(), name))
    }
}

// ---- Task ------------------------------------------------------------------

/// Trial structure. Only the fixed-duration task is supported.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    FixedDuration,
}

impl Component for Task {
    fn component_name(&self) -> &'static str {
        "TaskFixedDuration"
    }

    fn params(&self) -> Vec<(&'static str, Param)> {
        Vec::new()
    }

    fn set_param(&mut self, name: &str, _value: Param) -> ModelResult<()> {
        Err(unknown(self.component_name(), name))
    }
}

// ---- Overlay ---------------------------------------------------------------

/// Post-hoc transformation applied to a solved distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Identity overlay.
    None,
    /// Mix a fraction `umixturecoef` of uniformly distributed responses
    /// (contaminant guesses) into both distributions.
    UniformMixture { umixturecoef: Param },
}

impl Overlay {
    /// Apply the overlay to a freshly solved distribution.
    ///
    /// # Errors
    /// [`ModelError::InvalidMixtureCoef`] if the mixture coefficient lies
    /// outside `[0, 1]`.
    pub fn apply(&self, solution: Solution, t_dur: f64) -> ModelResult<Solution> {
        match self {
            Overlay::None => Ok(solution),
            Overlay::UniformMixture { umixturecoef } => {
                let coef = umixturecoef.value();
                if !(0.0..=1.0).contains(&coef) {
                    return Err(ModelError::InvalidMixtureCoef { value: coef });
                }
                // Half the contaminant mass goes to each response, spread
                // uniformly over the horizon.
                let uniform = coef * 0.5 / t_dur;
                let mix = |pdf: &Array1<f64>| pdf.mapv(|p| (1.0 - coef) * p + uniform);
                let corr = mix(solution.pdf_corr());
                let err = mix(solution.pdf_err());
                let dt = solution.dt();
                let conditions = solution.conditions().clone();
                Ok(Solution::new(corr, err, dt, conditions))
            }
        }
    }
}

impl Component for Overlay {
    fn component_name(&self) -> &'static str {
        match self {
            Overlay::None => "OverlayNone",
            Overlay::UniformMixture { .. } => "OverlayUniformMixture",
        }
    }

    fn params(&self) -> Vec<(&'static str, Param)> {
        match self {
            Overlay::None => Vec::new(),
            Overlay::UniformMixture { umixturecoef } => vec![("umixturecoef", *umixturecoef)],
        }
    }

    fn set_param(&mut self, name: &str, value: Param) -> ModelResult<()> {
        match (self, name) {
            (Overlay::UniformMixture { umixturecoef }, "umixturecoef") => {
                *umixturecoef = value;
                Ok(())
            }
            (me, _) => Err(unknown(me.component_name(), name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::params::Fittable;
    use ndarray::array;

    #[test]
    fn drift_families_evaluate_under_conditions() {
        let constant = Drift::Constant { drift: Param::Fixed(0.4) };
        assert_eq!(constant.rate(&Conditions::new()).unwrap(), 0.4);

        let scaled =
            Drift::ConditionScaled { scale: Param::Fixed(2.0), condition: "coh".to_string() };
        let mut conds = Conditions::new();
        conds.insert("coh".to_string(), 0.25);
        assert_eq!(scaled.rate(&conds).unwrap(), 0.5);
        assert!(matches!(
            scaled.rate(&Conditions::new()),
            Err(ModelError::MissingCondition { .. })
        ));
        assert_eq!(scaled.required_conditions(), vec!["coh"]);
    }

    #[test]
    fn set_param_rejects_undeclared_names() {
        let mut drift = Drift::Constant { drift: Param::Fixed(0.0) };
        assert!(drift.set_param("drift", Param::Fixed(1.0)).is_ok());
        assert!(matches!(
            drift.set_param("nope", Param::Fixed(1.0)),
            Err(ModelError::UnknownParameter { .. })
        ));
        let mut ic = InitialCondition::PointSourceCenter;
        assert!(ic.set_param("x0", Param::Fixed(0.0)).is_err());
    }

    #[test]
    fn descriptor_table_reflects_current_values() {
        let fittable = Fittable::new(1.0, 0.1, 3.0).unwrap();
        let bound =
            Bound::CollapsingLinear { b: Param::Unbound(fittable), slope: Param::Fixed(0.5) };
        let table = bound.params();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].0, "B");
        assert!(table[0].1.is_unbound());
        assert_eq!(table[1].1.value(), 0.5);
        assert_eq!(bound.linear(), (1.0, -0.5));
    }

    #[test]
    fn uniform_mixture_preserves_total_mass() {
        let dt = 0.1;
        let sol = Solution::new(array![1.0, 2.0, 1.0], array![1.0, 1.0, 1.0], dt, Conditions::new());
        let before = sol.prob_correct() + sol.prob_error();
        let overlay = Overlay::UniformMixture { umixturecoef: Param::Fixed(0.2) };
        // Horizon matching the grid extent keeps the uniform mass aligned.
        let t_dur = dt * 3.0;
        let mixed = overlay.apply(sol, t_dur).unwrap();
        let after = mixed.prob_correct() + mixed.prob_error();
        assert!((after - (0.8 * before + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn mixture_coefficient_outside_unit_interval_is_rejected() {
        let sol = Solution::new(array![1.0], array![1.0], 0.1, Conditions::new());
        let overlay = Overlay::UniformMixture { umixturecoef: Param::Fixed(1.5) };
        assert!(matches!(overlay.apply(sol, 1.0), Err(ModelError::InvalidMixtureCoef { .. })));
    }
}
