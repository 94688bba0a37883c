use argmin::core::{ArgminError, Error};

use crate::model::errors::ModelError;

/// Crate-wide result alias for fitting operations.
pub type FitResult<T> = Result<T, FitError>;

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    // ---- Method dispatch ----
    /// Requested fitting method name is not one of the supported set.
    UnsupportedMethod {
        name: String,
    },

    // ---- Option validation ----
    /// A fitting-option field failed validation.
    InvalidOptions {
        name: &'static str,
        reason: &'static str,
    },

    /// Evolution-strategy offspring count must be a multiple of the parent
    /// count.
    LambdaMuMismatch {
        lambda: usize,
        mu: usize,
    },

    // ---- Binding ----
    /// The model declares no fittable parameters, so there is nothing to
    /// optimize.
    NoFittableParameters,

    /// A candidate vector's length does not match the binding registry.
    DimensionMismatch {
        expected: usize,
        found: usize,
    },

    /// A global method needs finite box constraints on every coordinate.
    UnboundedParameter {
        index: usize,
    },

    // ---- Conditions ----
    /// A condition name was supplied that the sample does not carry.
    UnknownCondition {
        name: String,
    },

    // ---- Loss evaluation ----
    /// The loss function returned NaN or -inf for a candidate.
    NonFiniteLoss {
        value: f64,
    },

    /// Simulation horizon implied by the sample exceeds the analytic
    /// solver's practical ceiling.
    HorizonTooLong {
        t_dur: f64,
        limit: f64,
    },

    // ---- Outcome ----
    /// Best loss recorded by a backend must be finite.
    InvalidOutcome {
        reason: &'static str,
    },

    /// Backend terminated without producing a best parameter vector.
    MissingBestParameter,

    // ---- Model comparison ----
    /// Models being compared are built from different component families.
    ModelTypeMismatch,

    /// Models being compared carry different parameter counts.
    ParamCountMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Model layer ----
    /// Wrapper for model construction and solving errors.
    Model(ModelError),

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },
}

impl std::error::Error for FitError {}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::UnsupportedMethod { name } => {
                write!(f, "Unsupported fitting method '{name}'")
            }
            FitError::InvalidOptions { name, reason } => {
                write!(f, "Invalid fitting option '{name}': {reason}")
            }
            FitError::LambdaMuMismatch { lambda, mu } => {
                write!(f, "Offspring count {lambda} must be a multiple of parent count {mu}")
            }
            FitError::NoFittableParameters => {
                write!(f, "Model has no fittable parameters")
            }
            FitError::DimensionMismatch { expected, found } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, found {found}")
            }
            FitError::UnboundedParameter { index } => {
                write!(
                    f,
                    "Parameter {index} has no finite bounds; the chosen method requires them"
                )
            }
            FitError::UnknownCondition { name } => {
                write!(f, "Condition '{name}' does not appear in the sample")
            }
            FitError::NonFiniteLoss { value } => {
                write!(f, "Loss function returned non-finite value: {value}")
            }
            FitError::HorizonTooLong { t_dur, limit } => {
                write!(
                    f,
                    "Simulation horizon {t_dur} exceeds the analytic solver limit of {limit} seconds"
                )
            }
            FitError::InvalidOutcome { reason } => {
                write!(f, "Invalid fit outcome: {reason}")
            }
            FitError::MissingBestParameter => {
                write!(f, "Optimizer terminated without a best parameter vector")
            }
            FitError::ModelTypeMismatch => {
                write!(f, "Models are built from different component families")
            }
            FitError::ParamCountMismatch { expected, found } => {
                write!(f, "Parameter count mismatch: expected {expected}, found {found}")
            }
            FitError::Model(err) => {
                write!(f, "Model error: {err}")
            }
            FitError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            FitError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            FitError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            FitError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            FitError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }
        }
    }
}

impl From<ModelError> for FitError {
    fn from(err: ModelError) -> Self {
        FitError::Model(err)
    }
}

impl From<Error> for FitError {
    fn from(original_err: Error) -> Self {
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => FitError::InvalidParameter { text },
                ArgminError::NotInitialized { text } => FitError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => FitError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => FitError::PotentialBug { text },
                other => FitError::BackendError { text: other.to_string() },
            },
            Err(err) => FitError::BackendError { text: err.to_string() },
        }
    }
}
