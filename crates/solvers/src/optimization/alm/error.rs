use kinetrack_core::BoundsError;
use thiserror::Error;

use super::ConfigError;

/// Errors that can occur during an augmented Lagrangian solve.
///
/// A solve that runs but fails to converge is not an error; it returns a
/// [`Solution`](super::Solution) with the matching [`Status`](super::Status).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config")]
    Config(#[from] ConfigError),

    #[error("{what} has {found} entries but the problem expects {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("problem declares no constraints")]
    Unconstrained,

    #[error("invalid variable bounds")]
    VariableBounds(#[source] BoundsError),

    #[error("invalid constraint bounds")]
    ConstraintBounds(#[source] BoundsError),

    #[error("engine failed: {reason}")]
    Engine { reason: String },

    #[error("solution contains non-finite values")]
    NonFiniteSolution,
}

impl Error {
    /// Returns `true` if a set of bounds was contradictory, which makes the
    /// problem infeasible before any iteration runs.
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Self::VariableBounds(BoundsError::Contradictory { .. })
                | Self::ConstraintBounds(BoundsError::Contradictory { .. })
        )
    }
}
