//! Drives the kinematic model onto a straight lane one meter to the left.
//!
//! Run with `cargo run -p kinetrack-mpc --example closed_loop`.

use kinetrack_mpc::{
    BicycleModel, ControlCommand, InitialGuess, Mpc, MpcConfig, ReferencePolynomial, VehicleState,
};
use tracing::{Level, info, warn};

/// Acceleration applied when a cycle fails to produce a command.
const FALLBACK_ACCELERATION: f64 = 0.3;

const CYCLES: usize = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = MpcConfig {
        initial_guess: InitialGuess::Rollout,
        ..MpcConfig::default()
    };
    let mut mpc = Mpc::new(config)?;
    let plant = BicycleModel::new(config.horizon.dt, config.horizon.lf);

    let coefficients = [1.0, 0.0, 0.0, 0.0];
    let lane = ReferencePolynomial::from_slice(&coefficients)?;

    let mut x = 0.0;
    let mut y = 0.0;
    let mut psi = 0.0;
    let mut v = 20.0;

    for cycle in 0..CYCLES {
        let state = VehicleState {
            x,
            y,
            psi,
            v,
            cte: lane.value(x) - y,
            epsi: psi - lane.heading(x),
        };

        let command = mpc.solve(&state, &coefficients).unwrap_or_else(|err| {
            warn!(cycle, error = %err, "no command, holding the wheel straight");
            ControlCommand {
                steering_angle: 0.0,
                acceleration: FALLBACK_ACCELERATION,
            }
        });

        info!(
            cycle,
            x,
            cte = state.cte,
            v,
            steer = command.steering_angle,
            accel = command.acceleration,
            "cycle"
        );

        [x, y, psi, v, _, _] = plant.step(
            state.to_array(),
            command.steering_angle,
            command.acceleration,
            &lane,
        );
    }

    Ok(())
}
