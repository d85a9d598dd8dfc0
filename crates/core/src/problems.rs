use crate::{Scalar, Sparsity};

/// Defines a constrained nonlinear program to be solved.
///
/// An NLP problem maps a decision vector `x` to a scalar cost and a vector of
/// constraint residuals. Solvers pair the problem with variable bounds and
/// constraint bounds and search for the `x` that minimizes the cost while
/// keeping every residual within its bounds.
///
/// Both methods are generic over [`Scalar`], so a single implementation serves
/// plain evaluation (`f64`) and forward-mode differentiation (dual numbers).
/// Implementations must be pure: the same `x` always yields the same values.
pub trait NlpProblem {
    /// Returns the length of the decision vector.
    fn num_variables(&self) -> usize;

    /// Returns the number of constraint residuals.
    fn num_constraints(&self) -> usize;

    /// Computes the cost at `x`.
    ///
    /// `x` always has [`num_variables`](Self::num_variables) entries.
    fn cost<D: Scalar>(&self, x: &[D]) -> D;

    /// Writes the constraint residuals at `x` into `residuals`.
    ///
    /// `residuals` always has [`num_constraints`](Self::num_constraints)
    /// entries.
    fn constraints<D: Scalar>(&self, x: &[D], residuals: &mut [D]);

    /// Declares which variables each constraint row depends on.
    ///
    /// Solvers use this to share derivative evaluations between structurally
    /// independent columns. The default is a dense pattern, which is always
    /// correct but gives up that saving.
    fn constraint_sparsity(&self) -> Sparsity {
        Sparsity::dense(self.num_constraints(), self.num_variables())
    }

    /// Evaluates cost and constraints into one output vector.
    ///
    /// `fg[0]` receives the cost and `fg[1..]` the constraint residuals, so
    /// `fg` must have `1 + num_constraints()` entries.
    ///
    /// # Panics
    ///
    /// Panics if `fg` is shorter than `1 + num_constraints()`.
    fn evaluate<D: Scalar>(&self, x: &[D], fg: &mut [D]) {
        fg[0] = self.cost(x);
        let n = self.num_constraints();
        self.constraints(x, &mut fg[1..=n]);
    }
}
