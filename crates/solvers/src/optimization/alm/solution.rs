use std::time::Duration;

/// Indicates how the solver terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerances.
    Converged,

    /// Reached the outer or inner iteration limit without converging.
    MaxIterations,

    /// Ran out of its wall-clock budget without converging.
    OutOfTime,
}

/// The result of an augmented Lagrangian solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// Decision vector at termination.
    ///
    /// Only a locally optimal point when `status` is [`Status::Converged`].
    pub x: Vec<f64>,

    /// Cost at `x`.
    pub cost: f64,

    /// Largest distance of any constraint residual outside its bounds at `x`.
    pub constraint_violation: f64,

    pub outer_iterations: usize,

    pub inner_iterations: usize,

    pub solve_time: Duration,
}

impl Solution {
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.status == Status::Converged
    }
}
