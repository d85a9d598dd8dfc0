use std::time::Duration;

use thiserror::Error;

/// Configuration for the augmented Lagrangian solver.
///
/// Fields map one-to-one onto the engine's settings. Call
/// [`Config::validate`] (the solver does) before relying on a hand-built or
/// deserialized value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct Config {
    /// Wall-clock budget for one solve, in seconds.
    ///
    /// Covers setup as well as the engine. See
    /// [`MIN_ENGINE_TIME`](super::MIN_ENGINE_TIME) for budgets too short to
    /// start the engine.
    pub max_cpu_time: f64,

    /// Tolerance on the fixed-point residual of the final inner problem.
    ///
    /// Measured on the length of a projected gradient step in scaled
    /// variables, so it sits well below `delta_tolerance`.
    pub epsilon_tolerance: f64,

    /// Tolerance on constraint violation.
    pub delta_tolerance: f64,

    /// Tolerance of the first inner problem; tightened toward
    /// `epsilon_tolerance` on every outer iteration.
    pub initial_inner_tolerance: f64,

    /// Factor applied to the inner tolerance after each outer iteration.
    pub inner_tolerance_update_factor: f64,

    pub initial_penalty: f64,

    pub penalty_update_factor: f64,

    /// Required relative decrease of constraint violation per outer iteration
    /// before the penalty is left unchanged.
    pub sufficient_decrease_coefficient: f64,

    pub max_outer_iterations: usize,

    pub max_inner_iterations: usize,

    /// Number of L-BFGS correction pairs kept by the inner solver.
    pub lbfgs_memory: usize,

    /// Radius of the ball Lagrange multipliers are projected onto.
    pub multiplier_bound: f64,
}

/// Errors that can occur when validating an augmented Lagrangian config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_cpu_time must be finite and positive")]
    MaxCpuTime,

    #[error("epsilon_tolerance must be finite and positive")]
    Epsilon,

    #[error("delta_tolerance must be finite and positive")]
    Delta,

    #[error("initial_inner_tolerance must be finite and no smaller than epsilon_tolerance")]
    InitialInnerTolerance,

    #[error("inner_tolerance_update_factor must lie strictly between 0 and 1")]
    InnerToleranceUpdate,

    #[error("initial_penalty must be finite and positive")]
    InitialPenalty,

    #[error("penalty_update_factor must be finite and greater than 1")]
    PenaltyUpdate,

    #[error("sufficient_decrease_coefficient must lie strictly between 0 and 1")]
    SufficientDecrease,

    #[error("iteration limits must be positive")]
    Iterations,

    #[error("lbfgs_memory must be positive")]
    LbfgsMemory,

    #[error("multiplier_bound must be finite and positive")]
    MultiplierBound,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_cpu_time: 0.5,
            epsilon_tolerance: 1e-6,
            delta_tolerance: 1e-4,
            initial_inner_tolerance: 1e-2,
            inner_tolerance_update_factor: 0.1,
            initial_penalty: 10.0,
            penalty_update_factor: 5.0,
            sufficient_decrease_coefficient: 0.1,
            max_outer_iterations: 50,
            max_inner_iterations: 5000,
            lbfgs_memory: 10,
            multiplier_bound: 1e12,
        }
    }
}

impl Config {
    /// Validates every setting against the ranges the engine accepts.
    ///
    /// # Errors
    ///
    /// Returns the first setting found out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.max_cpu_time) {
            return Err(ConfigError::MaxCpuTime);
        }
        if !is_positive(self.epsilon_tolerance) {
            return Err(ConfigError::Epsilon);
        }
        if !is_positive(self.delta_tolerance) {
            return Err(ConfigError::Delta);
        }
        if !self.initial_inner_tolerance.is_finite()
            || self.initial_inner_tolerance < self.epsilon_tolerance
        {
            return Err(ConfigError::InitialInnerTolerance);
        }
        if !is_open_unit(self.inner_tolerance_update_factor) {
            return Err(ConfigError::InnerToleranceUpdate);
        }
        if !is_positive(self.initial_penalty) {
            return Err(ConfigError::InitialPenalty);
        }
        if !self.penalty_update_factor.is_finite() || self.penalty_update_factor <= 1.0 {
            return Err(ConfigError::PenaltyUpdate);
        }
        if !is_open_unit(self.sufficient_decrease_coefficient) {
            return Err(ConfigError::SufficientDecrease);
        }
        if self.max_outer_iterations == 0 || self.max_inner_iterations == 0 {
            return Err(ConfigError::Iterations);
        }
        if self.lbfgs_memory == 0 {
            return Err(ConfigError::LbfgsMemory);
        }
        if !is_positive(self.multiplier_bound) {
            return Err(ConfigError::MultiplierBound);
        }
        Ok(())
    }

    /// Returns the wall-clock budget as a [`Duration`].
    ///
    /// Only meaningful for a validated config.
    #[must_use]
    pub fn max_duration(&self) -> Duration {
        Duration::from_secs_f64(self.max_cpu_time)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_open_unit(value: f64) -> bool {
    value > 0.0 && value < 1.0
}
