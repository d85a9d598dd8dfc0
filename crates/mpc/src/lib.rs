//! Model predictive control for a kinematic bicycle model.
//!
//! Once per control cycle, [`Mpc`] turns the current [`VehicleState`] and a
//! cubic [`ReferencePolynomial`] into a constrained nonlinear program over a
//! short horizon, solves it with the augmented Lagrangian solver from
//! `kinetrack-solvers`, and returns the first [`ControlCommand`].
//!
//! The decision vector stacks the predicted states and actuator commands (see
//! [`Layout`]). Constraints pin the first predicted state to the measured one
//! and tie each later state to its predecessor through the model. Actuators
//! take effect [`ACTUATION_DELAY_STEPS`] steps late to account for latency.
//!
//! ```no_run
//! use kinetrack_mpc::{Mpc, MpcConfig, VehicleState};
//!
//! let mut mpc = Mpc::new(MpcConfig::default())?;
//! let state = VehicleState { v: 40.0, cte: 0.1, epsi: 0.01, ..VehicleState::default() };
//!
//! let command = mpc.solve(&state, &[0.0, 0.0, 0.0, 0.0])?;
//! println!("steer {:.3}, accelerate {:.3}", command.steering_angle, command.acceleration);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod controller;
mod error;
mod formulation;
mod functional;
mod horizon;
mod plan;
mod reference;
mod state;

pub use config::{ActuatorLimits, ConfigError, CostWeights, HorizonConfig, InitialGuess, MpcConfig};
pub use controller::Mpc;
pub use error::{InputError, MpcError, NonConvergence};
pub use formulation::Formulation;
pub use functional::TrackingFunctional;
pub use horizon::{ACTUATION_DELAY_STEPS, BicycleModel, Channel, Layout};
pub use plan::{ControlCommand, Plan, PredictedTrajectory};
pub use reference::ReferencePolynomial;
pub use state::VehicleState;
