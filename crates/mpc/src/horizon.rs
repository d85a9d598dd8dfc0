//! Decision vector layout and the kinematic model it is propagated with.

use kinetrack_core::Scalar;

use crate::ReferencePolynomial;

/// Steps the actuators lag behind the state they act on.
///
/// Two steps of 0.1 s approximate the actuation latency of the vehicle. A
/// different control period needs a different value.
pub const ACTUATION_DELAY_STEPS: usize = 2;

/// A named series within the decision vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    X,
    Y,
    Psi,
    V,
    Cte,
    Epsi,
    Delta,
    A,
}

impl Channel {
    /// The state channels, in decision vector order.
    pub const STATES: [Channel; 6] = [
        Channel::X,
        Channel::Y,
        Channel::Psi,
        Channel::V,
        Channel::Cte,
        Channel::Epsi,
    ];

    /// The actuator channels, in decision vector order.
    pub const ACTUATORS: [Channel; 2] = [Channel::Delta, Channel::A];

    #[must_use]
    pub fn is_state(self) -> bool {
        !matches!(self, Channel::Delta | Channel::A)
    }
}

/// Where each channel lives in the decision and constraint vectors.
///
/// For a horizon of `N` steps the decision vector holds the six state channels
/// (`N` entries each) followed by steering and acceleration (`N − 1` entries
/// each). The constraint vector holds `6·N` entries and reuses the state
/// offsets: the entry at a state channel's offset pins its initial value, and
/// entry `offset + t + 1` is the dynamics residual of step `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    steps: usize,
}

impl Layout {
    /// Creates the layout for a horizon of `steps` steps.
    ///
    /// # Panics
    ///
    /// Panics if `steps < 2`, which leaves no room for actuators.
    #[must_use]
    pub fn new(steps: usize) -> Self {
        assert!(steps >= 2, "horizon needs at least two steps");
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Returns the number of entries in `channel`.
    #[must_use]
    pub fn channel_len(&self, channel: Channel) -> usize {
        if channel.is_state() {
            self.steps
        } else {
            self.steps - 1
        }
    }

    /// Returns the position of the first entry of `channel`.
    #[must_use]
    pub fn offset(&self, channel: Channel) -> usize {
        let n = self.steps;
        match channel {
            Channel::X => 0,
            Channel::Y => n,
            Channel::Psi => 2 * n,
            Channel::V => 3 * n,
            Channel::Cte => 4 * n,
            Channel::Epsi => 5 * n,
            Channel::Delta => 6 * n,
            Channel::A => 6 * n + (n - 1),
        }
    }

    /// Returns the position of step `t` of `channel` in the decision vector.
    #[must_use]
    pub fn index(&self, channel: Channel, t: usize) -> usize {
        debug_assert!(t < self.channel_len(channel), "step out of range");
        self.offset(channel) + t
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        6 * self.steps + 2 * (self.steps - 1)
    }

    #[must_use]
    pub fn num_constraints(&self) -> usize {
        6 * self.steps
    }

    /// Returns the constraint row pinning the initial value of `channel`.
    #[must_use]
    pub fn pin_row(&self, channel: Channel) -> usize {
        debug_assert!(channel.is_state(), "actuators are not pinned");
        self.offset(channel)
    }

    /// Returns the constraint row of the step `t` dynamics of `channel`.
    #[must_use]
    pub fn dynamics_row(&self, channel: Channel, t: usize) -> usize {
        debug_assert!(channel.is_state(), "actuators have no dynamics");
        debug_assert!(t + 1 < self.steps, "step out of range");
        self.offset(channel) + t + 1
    }

    /// Returns the actuator step the dynamics of step `t` are driven by.
    ///
    /// The first [`ACTUATION_DELAY_STEPS`] steps use their own actuators;
    /// later steps use the command issued that many steps earlier.
    #[must_use]
    pub fn actuator_step(&self, t: usize) -> usize {
        if t >= ACTUATION_DELAY_STEPS {
            t - ACTUATION_DELAY_STEPS
        } else {
            t
        }
    }
}

/// Discrete kinematic bicycle model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BicycleModel {
    dt: f64,
    lf: f64,
}

impl BicycleModel {
    /// Creates a model with time step `dt` and front axle to center of
    /// gravity distance `lf`.
    #[must_use]
    pub fn new(dt: f64, lf: f64) -> Self {
        Self { dt, lf }
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    #[must_use]
    pub fn lf(&self) -> f64 {
        self.lf
    }

    /// Advances `state` one step under steering `delta` and acceleration `a`.
    ///
    /// `state` and the result are ordered as [`Channel::STATES`]. The errors
    /// are propagated against `reference` evaluated at the current position.
    pub fn step<D: Scalar>(
        &self,
        state: [D; 6],
        delta: D,
        a: D,
        reference: &ReferencePolynomial,
    ) -> [D; 6] {
        let [x, y, psi, v, _cte, epsi] = state;
        let dt = self.dt;
        let yaw_step = v * delta / self.lf * dt;

        [
            x + v * psi.cos() * dt,
            y + v * psi.sin() * dt,
            psi + yaw_step,
            v + a * dt,
            reference.value(x) - y + v * epsi.sin() * dt,
            psi - reference.heading(x) + yaw_step,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn offsets_for_eleven_steps() {
        let layout = Layout::new(11);
        let offsets: Vec<usize> = Channel::STATES
            .iter()
            .chain(&Channel::ACTUATORS)
            .map(|&ch| layout.offset(ch))
            .collect();

        assert_eq!(offsets, vec![0, 11, 22, 33, 44, 55, 66, 76]);
        assert_eq!(layout.num_variables(), 86);
        assert_eq!(layout.num_constraints(), 66);
    }

    #[test]
    fn channels_tile_the_decision_vector() {
        let layout = Layout::new(7);
        let mut covered = vec![false; layout.num_variables()];

        for &ch in Channel::STATES.iter().chain(&Channel::ACTUATORS) {
            for t in 0..layout.channel_len(ch) {
                let i = layout.index(ch, t);
                assert!(!covered[i], "entry {i} claimed twice");
                covered[i] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn pins_and_dynamics_rows_tile_the_constraints() {
        let layout = Layout::new(11);
        let mut rows: Vec<usize> = Vec::new();

        for &ch in &Channel::STATES {
            rows.push(layout.pin_row(ch));
            rows.extend((0..10).map(|t| layout.dynamics_row(ch, t)));
        }
        rows.sort_unstable();

        assert_eq!(rows, (0..66).collect::<Vec<_>>());
    }

    #[test]
    fn actuators_lag_by_two_steps_after_the_first_two() {
        let layout = Layout::new(11);
        let steps: Vec<usize> = (0..10).map(|t| layout.actuator_step(t)).collect();

        assert_eq!(steps, vec![0, 1, 0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn straight_step_matches_hand_computation() {
        let model = BicycleModel::new(0.1, 2.67);
        let reference = ReferencePolynomial::new([1.0, 0.0, 0.0, 0.0]).unwrap();
        let state = [2.0, 0.5, 0.0, 10.0, 0.5, 0.0];

        let [x, y, psi, v, cte, epsi] = model.step(state, 0.0, 2.0, &reference);

        assert_relative_eq!(x, 3.0);
        assert_relative_eq!(y, 0.5);
        assert_relative_eq!(psi, 0.0);
        assert_relative_eq!(v, 10.2);
        assert_relative_eq!(cte, 0.5);
        assert_relative_eq!(epsi, 0.0);
    }

    #[test]
    fn steering_turns_heading_and_heading_error_alike() {
        let model = BicycleModel::new(0.1, 2.67);
        let reference = ReferencePolynomial::new([0.0, 1.0, 0.0, 0.0]).unwrap();
        let state = [0.0, 0.0, 0.2, 20.0, 0.0, 0.1];

        let next = model.step(state, 0.05, 0.0, &reference);
        let yaw_step = 20.0 / 2.67 * 0.05 * 0.1;

        assert_relative_eq!(next[2], 0.2 + yaw_step, epsilon = 1e-12);
        assert_relative_eq!(
            next[5],
            0.2 - std::f64::consts::FRAC_PI_4 + yaw_step,
            epsilon = 1e-12
        );
        assert_relative_eq!(next[4], 20.0 * 0.1_f64.sin() * 0.1, epsilon = 1e-12);
    }
}
