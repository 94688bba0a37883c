use crate::analytic::errors::AnalyticError;

/// Result alias for model construction and solving.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Parameters ----
    /// Fittable bounds must satisfy minval < maxval.
    InvalidFittableBounds {
        minval: f64,
        maxval: f64,
        reason: &'static str,
    },

    /// Fittable default must be finite and inside the bounds.
    InvalidFittableDefault {
        default: f64,
        minval: f64,
        maxval: f64,
        reason: &'static str,
    },

    /// A component was asked for a parameter name it does not declare.
    UnknownParameter {
        component: &'static str,
        name: String,
    },

    // ---- Conditions ----
    /// A component requires a condition covariate the caller did not supply.
    MissingCondition {
        name: String,
    },

    // ---- Sample ----
    /// Reaction times must be finite and non-negative.
    InvalidReactionTime {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// A sample must contain at least one trial.
    EmptySample,

    // ---- Model construction ----
    /// Simulation resolution (dt or dx) must be finite and > 0.
    InvalidResolution {
        value: f64,
        reason: &'static str,
    },

    /// Simulation horizon must be finite and > 0.
    InvalidHorizon {
        t_dur: f64,
        reason: &'static str,
    },

    // ---- Solving ----
    /// Mixture coefficient of an overlay must lie in [0, 1].
    InvalidMixtureCoef {
        value: f64,
    },

    /// Wrapper for analytic-solver parameterization errors.
    Analytic {
        source: AnalyticError,
    },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::InvalidFittableBounds { minval, maxval, reason } => {
                write!(f, "Invalid fittable bounds ({minval}, {maxval}): {reason}")
            }
            ModelError::InvalidFittableDefault { default, minval, maxval, reason } => {
                write!(
                    f,
                    "Invalid fittable default {default} for bounds ({minval}, {maxval}): {reason}"
                )
            }
            ModelError::UnknownParameter { component, name } => {
                write!(f, "Component '{component}' has no parameter named '{name}'")
            }
            ModelError::MissingCondition { name } => {
                write!(f, "Required condition '{name}' was not supplied")
            }
            ModelError::InvalidReactionTime { index, value, reason } => {
                write!(f, "Invalid reaction time at trial {index}: {value}: {reason}")
            }
            ModelError::EmptySample => {
                write!(f, "Sample must contain at least one trial")
            }
            ModelError::InvalidResolution { value, reason } => {
                write!(f, "Invalid simulation resolution {value}: {reason}")
            }
            ModelError::InvalidHorizon { t_dur, reason } => {
                write!(f, "Invalid simulation horizon {t_dur}: {reason}")
            }
            ModelError::InvalidMixtureCoef { value } => {
                write!(f, "Invalid mixture coefficient {value}: must lie in [0, 1]")
            }
            ModelError::Analytic { source } => {
                write!(f, "Analytic solver error: {source}")
            }
        }
    }
}

impl From<AnalyticError> for ModelError {
    fn from(source: AnalyticError) -> Self {
        ModelError::Analytic { source }
    }
}
