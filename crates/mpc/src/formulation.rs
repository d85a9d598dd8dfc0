use kinetrack_core::Bounds;

use crate::{
    ActuatorLimits, InitialGuess, ReferencePolynomial, TrackingFunctional, VehicleState,
    horizon::{BicycleModel, Channel, Layout},
};

/// A fully assembled optimization problem for one control cycle.
///
/// Produced by [`Mpc::build`](crate::Mpc::build). The fields are public so a
/// caller can inspect or adjust the problem before handing it to
/// [`Mpc::solve_formulation`](crate::Mpc::solve_formulation).
#[derive(Debug, Clone)]
pub struct Formulation {
    pub seed: Vec<f64>,
    pub variable_bounds: Bounds,
    pub constraint_bounds: Bounds,
    pub functional: TrackingFunctional,
}

/// Boxes state entries by `unbounded` and actuators by their limits.
pub(crate) fn variable_bounds(layout: Layout, limits: &ActuatorLimits) -> Bounds {
    let mut bounds = Bounds::uniform(layout.num_variables(), -limits.unbounded, limits.unbounded);

    let span = |ch| layout.offset(ch)..layout.offset(ch) + layout.channel_len(ch);
    bounds.set_range(span(Channel::Delta), -limits.steering, limits.steering);
    bounds.set_range(span(Channel::A), -limits.acceleration, limits.acceleration);

    bounds
}

/// Zero for every dynamics residual, with the pins fixed to `state`.
pub(crate) fn constraint_bounds(layout: Layout, state: &VehicleState) -> Bounds {
    let mut bounds = Bounds::uniform(layout.num_constraints(), 0.0, 0.0);
    for (&ch, value) in Channel::STATES.iter().zip(state.to_array()) {
        bounds.pin(layout.pin_row(ch), value);
    }
    bounds
}

pub(crate) fn seed(
    layout: Layout,
    state: &VehicleState,
    guess: InitialGuess,
    model: &BicycleModel,
    reference: &ReferencePolynomial,
) -> Vec<f64> {
    let mut x = vec![0.0; layout.num_variables()];
    let mut current = state.to_array();

    let steps = match guess {
        InitialGuess::Pinned => 1,
        InitialGuess::Rollout => layout.steps(),
    };

    for t in 0..steps {
        if t > 0 {
            current = model.step(current, 0.0, 0.0, reference);
        }
        for (&ch, value) in Channel::STATES.iter().zip(current) {
            x[layout.index(ch, t)] = value;
        }
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn state() -> VehicleState {
        VehicleState {
            x: 1.0,
            y: -2.0,
            psi: 0.1,
            v: 40.0,
            cte: 0.3,
            epsi: -0.05,
        }
    }

    #[test]
    fn actuators_are_boxed_and_states_free() {
        let layout = Layout::new(11);
        let limits = ActuatorLimits::default();
        let bounds = variable_bounds(layout, &limits);

        assert_eq!(bounds.len(), 86);
        for i in 0..66 {
            assert_relative_eq!(bounds.lower()[i], -1.0e19);
            assert_relative_eq!(bounds.upper()[i], 1.0e19);
        }
        for i in 66..76 {
            assert_relative_eq!(bounds.lower()[i], -limits.steering);
            assert_relative_eq!(bounds.upper()[i], limits.steering);
        }
        for i in 76..86 {
            assert_relative_eq!(bounds.lower()[i], -1.0);
            assert_relative_eq!(bounds.upper()[i], 1.0);
        }
    }

    #[test]
    fn pins_sit_at_channel_offsets() {
        let layout = Layout::new(11);
        let bounds = constraint_bounds(layout, &state());
        let expected = state().to_array();

        for (k, &value) in expected.iter().enumerate() {
            assert_relative_eq!(bounds.lower()[k * 11], value);
            assert_relative_eq!(bounds.upper()[k * 11], value);
        }

        let pinned: usize = (0..66)
            .filter(|&i| bounds.lower()[i] != 0.0 || bounds.upper()[i] != 0.0)
            .count();
        assert_eq!(pinned, 6);
    }

    #[test]
    fn pinned_seed_is_zero_past_the_first_step() {
        let layout = Layout::new(11);
        let reference = ReferencePolynomial::new([0.0; 4]).unwrap();
        let model = BicycleModel::new(0.1, 2.67);

        let x = seed(layout, &state(), InitialGuess::Pinned, &model, &reference);

        for (&ch, value) in Channel::STATES.iter().zip(state().to_array()) {
            assert_relative_eq!(x[layout.index(ch, 0)], value);
        }
        let nonzero = x.iter().filter(|&&v| v != 0.0).count();
        assert_eq!(nonzero, 6);
    }

    #[test]
    fn rollout_seed_follows_the_model() {
        let layout = Layout::new(5);
        let reference = ReferencePolynomial::new([0.0, 0.1, 0.0, 0.0]).unwrap();
        let model = BicycleModel::new(0.1, 2.67);

        let x = seed(layout, &state(), InitialGuess::Rollout, &model, &reference);

        let second = model.step(state().to_array(), 0.0, 0.0, &reference);
        for (&ch, value) in Channel::STATES.iter().zip(second) {
            assert_relative_eq!(x[layout.index(ch, 1)], value);
        }
        assert_relative_eq!(x[layout.index(Channel::V, 4)], 40.0);
        assert!(
            Channel::ACTUATORS
                .iter()
                .all(|&ch| (0..4).all(|t| x[layout.index(ch, t)] == 0.0))
        );
    }
}
