//! Augmented Lagrangian method for constrained nonlinear programs.
//!
//! # Algorithm
//!
//! The solver hands an [`NlpProblem`] to the `optimization_engine` augmented
//! Lagrangian method. Each outer iteration minimizes the augmented Lagrangian
//! over the variable box with PANOC (a proximal quasi-Newton method), then
//! updates the Lagrange multipliers and, if constraint violation did not shrink
//! enough, the penalty. Constraint residuals are kept inside their bounds by
//! treating the constraint bounds as the set the residual mapping must land in.
//!
//! # Derivatives
//!
//! The engine needs the cost gradient and the product of the transposed
//! constraint Jacobian with a vector. Both come from forward-mode dual numbers
//! evaluated through the problem's generic [`Scalar`] methods. The constraint
//! side groups structurally independent columns (from
//! [`NlpProblem::constraint_sparsity`]) so one pass serves a whole group.
//!
//! # Scaling
//!
//! The engine never sees the problem's own variables. It works on
//! `z = (u - seed) / scale`, where `scale` comes from the diagonal of the
//! cost Hessian at the seed. Cost weights spanning several orders of
//! magnitude then leave no variable much stiffer than another, and the
//! engine's step-length tolerances mean the same thing for every variable.
//!
//! # Termination
//!
//! A solve that runs to completion returns a [`Solution`] whose [`Status`]
//! says whether it converged, hit an iteration limit, or ran out of its
//! wall-clock budget. Errors are reserved for inputs that prevent a solve from
//! starting (bad dimensions, contradictory bounds, invalid config) and for
//! failures inside the engine.
//!
//! The budget covers the whole call. When less than [`MIN_ENGINE_TIME`]
//! remains once the problem is set up, the engine is not started and the seed
//! comes back with [`Status::OutOfTime`].
//!
//! [`Scalar`]: kinetrack_core::Scalar

mod coloring;
mod config;
mod derivatives;
mod error;
mod scaling;
mod solution;


pub use config::{Config, ConfigError};
pub use error::Error;
pub use solution::{Solution, Status};

use std::time::{Duration, Instant};

use kinetrack_core::{Bounds, NlpProblem};
use optimization_engine::{
    SolverError,
    alm::{AlmCache, AlmFactory, AlmOptimizer, AlmProblem, NO_JACOBIAN_MAPPING, NO_MAPPING},
    constraints::{Ball2, Rectangle},
    core::ExitStatus,
    panoc::PANOCCache,
};
use tracing::debug;

use crate::optimization::evaluate;

use derivatives::Derivatives;
use scaling::Scaling;

/// Least time the engine must have left to be started at all.
pub const MIN_ENGINE_TIME: Duration = Duration::from_millis(1);

/// Finds a local minimum of `problem` subject to the given bounds.
///
/// Starts from `seed`, keeps every variable within `variable_bounds`, and
/// drives every constraint residual into `constraint_bounds`.
///
/// # Errors
///
/// Returns an error if the config is invalid, if the seed or either set of
/// bounds does not match the problem's dimensions, if any bound is NaN or has
/// its lower limit above its upper limit, if the problem declares no
/// constraints, or if the engine itself fails.
pub fn minimize<P: NlpProblem>(
    problem: &P,
    seed: &[f64],
    variable_bounds: &Bounds,
    constraint_bounds: &Bounds,
    config: &Config,
) -> Result<Solution, Error> {
    let started = Instant::now();
    config.validate()?;

    let n = problem.num_variables();
    let m = problem.num_constraints();
    check_len("seed", n, seed.len())?;
    check_len("variable bounds", n, variable_bounds.len())?;
    check_len("constraint bounds", m, constraint_bounds.len())?;
    if m == 0 {
        return Err(Error::Unconstrained);
    }
    variable_bounds.validate().map_err(Error::VariableBounds)?;
    constraint_bounds.validate().map_err(Error::ConstraintBounds)?;

    let derivatives = Derivatives::new(problem);
    let scaling = Scaling::jacobi(&derivatives, seed);
    debug!(
        variables = n,
        constraints = m,
        color_groups = derivatives.num_groups(),
        "starting augmented Lagrangian solve"
    );

    let Some(remaining) = config
        .max_duration()
        .checked_sub(started.elapsed())
        .filter(|left| *left >= MIN_ENGINE_TIME)
    else {
        debug!(budget = ?config.max_duration(), "no time left to start the engine");
        return finish(
            problem,
            seed.to_vec(),
            constraint_bounds,
            Status::OutOfTime,
            (0, 0),
            started,
        );
    };

    let cost = |z: &[f64], c: &mut f64| -> Result<(), SolverError> {
        *c = derivatives.cost(&scaling.original(z));
        Ok(())
    };
    let cost_gradient = |z: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
        derivatives.cost_gradient(&scaling.original(z), grad);
        scaling.chain(grad);
        Ok(())
    };
    let mapping = |z: &[f64], residuals: &mut [f64]| -> Result<(), SolverError> {
        derivatives.constraints(&scaling.original(z), residuals);
        Ok(())
    };
    let jacobian_product = |z: &[f64], d: &[f64], out: &mut [f64]| -> Result<(), SolverError> {
        derivatives.jacobian_transpose_product(&scaling.original(z), d, out);
        scaling.chain(out);
        Ok(())
    };

    let residual_set = || {
        Rectangle::new(
            Some(constraint_bounds.lower()),
            Some(constraint_bounds.upper()),
        )
    };

    let factory = AlmFactory::new(
        cost,
        cost_gradient,
        Some(mapping),
        Some(jacobian_product),
        NO_MAPPING,
        NO_JACOBIAN_MAPPING,
        Some(residual_set()),
        0,
    );

    let (lower, upper) = scaling.bounds(variable_bounds);
    let alm_problem = AlmProblem::new(
        Rectangle::new(Some(lower.as_slice()), Some(upper.as_slice())),
        Some(residual_set()),
        Some(Ball2::new(None, config.multiplier_bound)),
        |z: &[f64], xi: &[f64], c: &mut f64| -> Result<(), SolverError> { factory.psi(z, xi, c) },
        |z: &[f64], xi: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
            factory.d_psi(z, xi, grad)
        },
        Some(mapping),
        NO_MAPPING,
        m,
        0,
    );

    let panoc_cache = PANOCCache::new(n, config.epsilon_tolerance, config.lbfgs_memory);
    let mut alm_cache = AlmCache::new(panoc_cache, m, 0);

    let mut optimizer = AlmOptimizer::new(&mut alm_cache, alm_problem)
        .with_epsilon_tolerance(config.epsilon_tolerance)
        .with_delta_tolerance(config.delta_tolerance)
        .with_initial_inner_tolerance(config.initial_inner_tolerance)
        .with_inner_tolerance_update_factor(config.inner_tolerance_update_factor)
        .with_initial_penalty(config.initial_penalty)
        .with_penalty_update_factor(config.penalty_update_factor)
        .with_sufficient_decrease_coefficient(config.sufficient_decrease_coefficient)
        .with_max_outer_iterations(config.max_outer_iterations)
        .with_max_inner_iterations(config.max_inner_iterations)
        .with_max_duration(remaining);

    let mut z = vec![0.0; n];
    let outcome = optimizer.solve(&mut z).map_err(|err| Error::Engine {
        reason: format!("{err:?}"),
    })?;

    let status = match outcome.exit_status() {
        ExitStatus::Converged => Status::Converged,
        ExitStatus::NotConvergedIterations => Status::MaxIterations,
        ExitStatus::NotConvergedOutOfTime => Status::OutOfTime,
    };

    finish(
        problem,
        scaling.original(&z),
        constraint_bounds,
        status,
        (outcome.num_outer_iterations(), outcome.num_inner_iterations()),
        started,
    )
}

/// Re-evaluates the final point in the problem's own variables.
fn finish<P: NlpProblem>(
    problem: &P,
    x: Vec<f64>,
    constraint_bounds: &Bounds,
    status: Status,
    (outer_iterations, inner_iterations): (usize, usize),
    started: Instant,
) -> Result<Solution, Error> {
    let eval = evaluate(problem, &x);
    if !eval.is_finite() {
        return Err(Error::NonFiniteSolution);
    }
    let constraint_violation = eval.max_violation(constraint_bounds);
    let solve_time = started.elapsed();

    debug!(
        ?status,
        cost = eval.cost,
        constraint_violation,
        outer_iterations,
        inner_iterations,
        ?solve_time,
        "augmented Lagrangian solve finished"
    );

    Ok(Solution {
        status,
        x,
        cost: eval.cost,
        constraint_violation,
        outer_iterations,
        inner_iterations,
        solve_time,
    })
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), Error> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}
