/// Result alias for the analytic solver.
pub type AnalyticResult<T> = Result<T, AnalyticError>;

/// Errors raised when the two-boundary wrapper is given an invalid
/// parameterization. The series evaluation itself is total and never fails.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticError {
    /// Noise intensity must be finite and strictly positive (it divides
    /// every other parameter during rescaling).
    InvalidNoise { value: f64 },

    /// Boundary separation must be finite and strictly positive.
    InvalidBound { value: f64 },

    /// Boundary slope must be finite.
    InvalidBoundSlope { value: f64 },
}

impl std::error::Error for AnalyticError {}

impl std::fmt::Display for AnalyticError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyticError::InvalidNoise { value } => {
                write!(f, "Invalid noise intensity {value}: must be finite and > 0")
            }
            AnalyticError::InvalidBound { value } => {
                write!(f, "Invalid boundary separation {value}: must be finite and > 0")
            }
            AnalyticError::InvalidBoundSlope { value } => {
                write!(f, "Invalid boundary slope {value}: must be finite")
            }
        }
    }
}
