//! Error and warning types for the sarima-select engine.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while differencing, fitting, selecting or forecasting.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Non-finite values detected in the input.
    #[error("missing or non-finite values detected in data")]
    MissingValues,

    /// Estimated AR polynomial has a root inside or on the unit circle.
    #[error("non-stationary AR roots (max inverse root modulus {modulus:.4})")]
    NonStationaryRoots { modulus: f64 },

    /// Estimated MA polynomial has a root inside or on the unit circle.
    #[error("non-invertible MA roots (max inverse root modulus {modulus:.4})")]
    NonInvertibleMA { modulus: f64 },

    /// Optimizer did not converge within its iteration or time budget.
    #[error("optimizer did not converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    /// Every candidate of an order search failed to fit.
    #[error("no candidate model converged ({attempted} attempted)")]
    NoCandidateConverged { attempted: usize },

    /// A VAR model with eigenvalue modulus >= 1 was asked to forecast.
    #[error("VAR process is unstable (max companion eigenvalue modulus {max_modulus:.4})")]
    UnstableVar { max_modulus: f64 },

    /// Computation error (e.g., singular matrix, numerical breakdown).
    #[error("computation error: {0}")]
    ComputationError(String),
}

impl ForecastError {
    /// Whether this error only disqualifies a single candidate order.
    ///
    /// Candidate-level failures are absorbed by the order search; every other
    /// variant is propagated to the caller.
    pub fn is_candidate_failure(&self) -> bool {
        matches!(
            self,
            ForecastError::NonStationaryRoots { .. }
                | ForecastError::NonInvertibleMA { .. }
                | ForecastError::ConvergenceFailure { .. }
                | ForecastError::InsufficientData { .. }
        )
    }
}

/// Non-fatal conditions surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Warning {
    /// Differencing bounds were reached without clearing the stationarity threshold.
    NonStationaryInput {
        d: usize,
        seasonal_d: usize,
        p_value: f64,
    },
    /// Zero-valued actuals were skipped when computing MAPE.
    DegenerateMetric { skipped: usize },
    /// A fitted VAR has a companion eigenvalue modulus >= 1.
    UnstableVar { max_modulus: f64 },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::NonStationaryInput {
                d,
                seasonal_d,
                p_value,
            } => write!(
                f,
                "series still non-stationary at d={}, D={} (p-value {:.4})",
                d, seasonal_d, p_value
            ),
            Warning::DegenerateMetric { skipped } => {
                write!(f, "{} zero-valued actuals skipped from MAPE", skipped)
            }
            Warning::UnstableVar { max_modulus } => write!(
                f,
                "VAR is unstable (max eigenvalue modulus {:.4})",
                max_modulus
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptyData;
        assert_eq!(err.to_string(), "empty input data");

        let err = ForecastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = ForecastError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 3, got 2");

        let err = ForecastError::NoCandidateConverged { attempted: 4 };
        assert_eq!(err.to_string(), "no candidate model converged (4 attempted)");
    }

    #[test]
    fn candidate_failures_are_classified() {
        assert!(ForecastError::NonStationaryRoots { modulus: 1.0 }.is_candidate_failure());
        assert!(ForecastError::NonInvertibleMA { modulus: 1.2 }.is_candidate_failure());
        assert!(ForecastError::ConvergenceFailure { iterations: 10 }.is_candidate_failure());
        assert!(!ForecastError::NoCandidateConverged { attempted: 3 }.is_candidate_failure());
        assert!(!ForecastError::DimensionMismatch {
            expected: 1,
            got: 2
        }
        .is_candidate_failure());
    }

    #[test]
    fn warnings_render() {
        let w = Warning::DegenerateMetric { skipped: 2 };
        assert_eq!(w.to_string(), "2 zero-valued actuals skipped from MAPE");
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::UnstableVar { max_modulus: 1.01 };
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }
}
