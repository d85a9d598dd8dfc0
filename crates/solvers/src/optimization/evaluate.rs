use kinetrack_core::{Bounds, NlpProblem};

/// The result of evaluating an NLP problem at a given `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub cost: f64,

    pub residuals: Vec<f64>,
}

impl Evaluation {
    /// Returns the largest distance of any residual outside `bounds`.
    ///
    /// # Panics
    ///
    /// Panics if `bounds` has fewer entries than there are residuals.
    #[must_use]
    pub fn max_violation(&self, bounds: &Bounds) -> f64 {
        self.residuals
            .iter()
            .enumerate()
            .map(|(i, &r)| bounds.violation(i, r))
            .fold(0.0, f64::max)
    }

    /// Returns `true` if the cost and every residual are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cost.is_finite() && self.residuals.iter().all(|r| r.is_finite())
    }
}

/// Evaluates cost and constraint residuals of `problem` at `x` in plain `f64`.
///
/// # Panics
///
/// Panics if `x` does not have `problem.num_variables()` entries.
#[must_use]
pub fn evaluate<P: NlpProblem>(problem: &P, x: &[f64]) -> Evaluation {
    assert_eq!(x.len(), problem.num_variables(), "decision vector length");

    let mut residuals = vec![0.0; problem.num_constraints()];
    problem.constraints(x, &mut residuals);

    Evaluation {
        cost: problem.cost(x),
        residuals,
    }
}
