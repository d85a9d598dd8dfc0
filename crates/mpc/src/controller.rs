use kinetrack_solvers::optimization::alm;
use tracing::{debug, debug_span, warn};

use crate::{
    ConfigError, ControlCommand, Formulation, InputError, MpcConfig, MpcError, NonConvergence,
    Plan, PredictedTrajectory, ReferencePolynomial, TrackingFunctional, VehicleState, formulation,
    horizon::{BicycleModel, Channel, Layout},
};

/// A receding-horizon controller for the kinematic bicycle model.
///
/// Each call formulates a fresh problem from the current state and reference,
/// solves it, and returns the first actuator command. The predicted trajectory
/// of the last successful solve is kept for display.
#[derive(Debug, Clone)]
pub struct Mpc {
    config: MpcConfig,
    layout: Layout,
    model: BicycleModel,
    trajectory: PredictedTrajectory,
}

impl Mpc {
    /// Creates a controller from a validated copy of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if any config value is out of range.
    pub fn new(config: MpcConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            layout: Layout::new(config.horizon.steps),
            model: BicycleModel::new(config.horizon.dt, config.horizon.lf),
            trajectory: PredictedTrajectory::default(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &MpcConfig {
        &self.config
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns the trajectory predicted by the last successful [`Mpc::solve`].
    ///
    /// Empty before the first solve and after any failed one.
    #[must_use]
    pub fn trajectory(&self) -> &PredictedTrajectory {
        &self.trajectory
    }

    /// Computes the command for this cycle and caches the predicted trajectory.
    ///
    /// `coefficients` are the four reference polynomial coefficients, lowest
    /// order first. On failure the cached trajectory is cleared and no command
    /// is returned; choosing a fallback is up to the caller.
    ///
    /// # Errors
    ///
    /// See [`Mpc::plan`].
    pub fn solve(
        &mut self,
        state: &VehicleState,
        coefficients: &[f64],
    ) -> Result<ControlCommand, MpcError> {
        match self.plan(state, coefficients) {
            Ok(plan) => {
                self.trajectory = plan.trajectory;
                Ok(plan.command)
            }
            Err(err) => {
                self.trajectory.clear();
                Err(err)
            }
        }
    }

    /// Formulates and solves one cycle without touching the cached trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`MpcError::InvalidInput`] if the state or coefficients are
    /// malformed, [`MpcError::Timeout`] if the solver runs out of time, and
    /// [`MpcError::NonConvergence`] for any other solve that does not
    /// converge.
    pub fn plan(&self, state: &VehicleState, coefficients: &[f64]) -> Result<Plan, MpcError> {
        let reference = ReferencePolynomial::from_slice(coefficients)?;
        let formulation = self.build(state, reference)?;
        self.solve_formulation(&formulation)
    }

    /// Assembles the problem for one cycle.
    ///
    /// # Errors
    ///
    /// Returns [`MpcError::InvalidInput`] if any state field is not finite.
    pub fn build(
        &self,
        state: &VehicleState,
        reference: ReferencePolynomial,
    ) -> Result<Formulation, MpcError> {
        state.validate()?;

        let config = &self.config;
        Ok(Formulation {
            seed: formulation::seed(
                self.layout,
                state,
                config.initial_guess,
                &self.model,
                &reference,
            ),
            variable_bounds: formulation::variable_bounds(self.layout, &config.limits),
            constraint_bounds: formulation::constraint_bounds(self.layout, state),
            functional: TrackingFunctional::new(
                self.layout,
                self.model,
                reference,
                config.weights,
                config.reference_velocity,
            ),
        })
    }

    /// Solves an assembled problem and extracts its command and trajectory.
    ///
    /// Nothing is extracted unless the solver converged with every constraint
    /// residual within ten times the solver's `delta_tolerance` of its bounds.
    ///
    /// # Errors
    ///
    /// Returns [`MpcError::InvalidInput`] if the formulation does not match
    /// this controller's horizon or has NaN bounds,
    /// [`NonConvergence::Infeasible`] if any bounds are contradictory,
    /// [`MpcError::Timeout`] if the solver runs out of time,
    /// [`NonConvergence::NumericalFailure`] if a converged point still violates
    /// its constraints, and another [`MpcError::NonConvergence`] for any other
    /// failure.
    pub fn solve_formulation(&self, formulation: &Formulation) -> Result<Plan, MpcError> {
        let layout = formulation.functional.layout();
        if layout != self.layout {
            return Err(InputError::Shape {
                what: "formulation",
                expected: self.layout.steps(),
                found: layout.steps(),
            }
            .into());
        }

        let _span = debug_span!("mpc_solve", steps = layout.steps()).entered();

        let solution = alm::minimize(
            &formulation.functional,
            &formulation.seed,
            &formulation.variable_bounds,
            &formulation.constraint_bounds,
            &self.config.solver,
        )
        .map_err(|err| {
            warn!(error = %err, "solver rejected the problem");
            MpcError::from_solver(err)
        })?;

        accept(&solution, &self.config.solver)?;

        let x = &solution.x;
        let command = ControlCommand {
            steering_angle: x[layout.index(Channel::Delta, 0)],
            acceleration: x[layout.index(Channel::A, 0)],
        };
        let trajectory = PredictedTrajectory::new(
            (0..layout.steps() - 1)
                .map(|t| (x[layout.index(Channel::X, t)], x[layout.index(Channel::Y, t)]))
                .collect(),
        );

        debug!(
            steering_angle = command.steering_angle,
            acceleration = command.acceleration,
            cost = solution.cost,
            "control command ready"
        );

        Ok(Plan {
            command,
            trajectory,
            solution,
        })
    }
}

/// How far past `delta_tolerance` a converged solution may still violate a
/// constraint.
const VIOLATION_SLACK: f64 = 10.0;

/// Decides whether a finished solve can be extracted.
fn accept(solution: &alm::Solution, solver: &alm::Config) -> Result<(), MpcError> {
    match solution.status {
        alm::Status::Converged => {}
        alm::Status::MaxIterations => {
            warn!(
                outer_iterations = solution.outer_iterations,
                inner_iterations = solution.inner_iterations,
                "solve hit its iteration limit"
            );
            return Err(NonConvergence::IterationLimit.into());
        }
        alm::Status::OutOfTime => {
            let budget = solver.max_duration();
            warn!(?budget, elapsed = ?solution.solve_time, "solve ran out of time");
            return Err(MpcError::Timeout {
                budget,
                elapsed: solution.solve_time,
            });
        }
    }

    let limit = VIOLATION_SLACK * solver.delta_tolerance;
    if solution.constraint_violation > limit {
        warn!(
            constraint_violation = solution.constraint_violation,
            limit, "converged point violates its constraints"
        );
        return Err(NonConvergence::NumericalFailure {
            reason: format!(
                "converged with constraint violation {:e} above {limit:e}",
                solution.constraint_violation
            ),
        }
        .into());
    }

    Ok(())
}
