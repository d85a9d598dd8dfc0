use std::time::Duration;

use kinetrack_core::BoundsError;
use kinetrack_solvers::optimization::alm;
use thiserror::Error;

/// Errors caused by the inputs of one control cycle.
///
/// Raised before the solver runs.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum InputError {
    #[error("expected 4 polynomial coefficients, got {found}")]
    CoefficientCount { found: usize },

    #[error("polynomial coefficient {index} is not finite: {value}")]
    NonFiniteCoefficient { index: usize, value: f64 },

    #[error("state field `{field}` is not finite: {value}")]
    NonFiniteState { field: &'static str, value: f64 },

    #[error("{what} has {found} entries but the horizon needs {expected}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid bounds")]
    Bounds(#[source] BoundsError),
}

/// Why a solve that started did not produce a usable solution.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NonConvergence {
    #[error("iteration limit reached")]
    IterationLimit,

    #[error("infeasible: {reason}")]
    Infeasible { reason: String },

    #[error("numerical failure: {reason}")]
    NumericalFailure { reason: String },
}

/// Errors that can occur while computing a control command.
#[derive(Debug, Error)]
pub enum MpcError {
    #[error("invalid input")]
    InvalidInput(#[from] InputError),

    #[error("solver did not converge")]
    NonConvergence(#[from] NonConvergence),

    #[error("solver ran out of time after {elapsed:?} (budget {budget:?})")]
    Timeout { budget: Duration, elapsed: Duration },
}

impl MpcError {
    /// Returns `true` if the solver ran but produced no usable solution,
    /// including when it ran out of time.
    #[must_use]
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, Self::NonConvergence(_) | Self::Timeout { .. })
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Sorts a solver error into the controller's taxonomy.
    pub(crate) fn from_solver(err: alm::Error) -> Self {
        match err {
            alm::Error::DimensionMismatch {
                what,
                expected,
                found,
            } => InputError::Shape {
                what,
                expected,
                found,
            }
            .into(),
            alm::Error::VariableBounds(source) | alm::Error::ConstraintBounds(source) => {
                match source {
                    BoundsError::Contradictory { .. } => NonConvergence::Infeasible {
                        reason: source.to_string(),
                    }
                    .into(),
                    _ => InputError::Bounds(source).into(),
                }
            }
            alm::Error::Engine { reason } => NonConvergence::NumericalFailure { reason }.into(),
            other => NonConvergence::NumericalFailure {
                reason: other.to_string(),
            }
            .into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_counts_as_non_convergence() {
        let err = MpcError::Timeout {
            budget: Duration::from_millis(500),
            elapsed: Duration::from_millis(510),
        };

        assert!(err.is_non_convergence());
        assert!(err.is_timeout());
    }

    #[test]
    fn invalid_input_is_neither() {
        let err = MpcError::from(InputError::CoefficientCount { found: 3 });

        assert!(!err.is_non_convergence());
        assert!(!err.is_timeout());
    }

    #[test]
    fn contradictory_bounds_become_infeasible() {
        let err = MpcError::from_solver(alm::Error::ConstraintBounds(
            BoundsError::Contradictory {
                index: 4,
                lower: 1.0,
                upper: 0.0,
            },
        ));

        assert!(matches!(
            err,
            MpcError::NonConvergence(NonConvergence::Infeasible { .. })
        ));
    }

    #[test]
    fn nan_bounds_are_invalid_input() {
        let err = MpcError::from_solver(alm::Error::VariableBounds(BoundsError::NotANumber {
            index: 2,
        }));

        assert!(matches!(
            err,
            MpcError::InvalidInput(InputError::Bounds(BoundsError::NotANumber { index: 2 }))
        ));
    }

    #[test]
    fn engine_failure_is_numerical() {
        let err = MpcError::from_solver(alm::Error::NonFiniteSolution);

        assert!(matches!(
            err,
            MpcError::NonConvergence(NonConvergence::NumericalFailure { .. })
        ));
        assert!(!err.is_timeout());
    }
}
