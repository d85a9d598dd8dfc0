use kinetrack_core::{NlpProblem, Scalar, Sparsity};

use crate::{
    CostWeights, ReferencePolynomial,
    horizon::{BicycleModel, Channel, Layout},
};

/// Cost and constraints of one control cycle, as a function of the decision
/// vector.
///
/// Holds only the data fixed for the cycle (layout, model, reference, weights),
/// so the same value can be evaluated any number of times with `f64` or dual
/// numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingFunctional {
    layout: Layout,
    model: BicycleModel,
    reference: ReferencePolynomial,
    weights: CostWeights,
    reference_velocity: f64,
}

impl TrackingFunctional {
    #[must_use]
    pub fn new(
        layout: Layout,
        model: BicycleModel,
        reference: ReferencePolynomial,
        weights: CostWeights,
        reference_velocity: f64,
    ) -> Self {
        Self {
            layout,
            model,
            reference,
            weights,
            reference_velocity,
        }
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[must_use]
    pub fn reference(&self) -> &ReferencePolynomial {
        &self.reference
    }

    /// Gathers the six states of step `t` in [`Channel::STATES`] order.
    fn states_at<D: Scalar>(&self, x: &[D], t: usize) -> [D; 6] {
        Channel::STATES.map(|ch| x[self.layout.index(ch, t)])
    }
}

impl NlpProblem for TrackingFunctional {
    fn num_variables(&self) -> usize {
        self.layout.num_variables()
    }

    fn num_constraints(&self) -> usize {
        self.layout.num_constraints()
    }

    fn cost<D: Scalar>(&self, x: &[D]) -> D {
        let l = &self.layout;
        let w = &self.weights;
        let n = l.steps();
        let mut cost = D::from(0.0);

        for t in 0..n {
            let cte = x[l.index(Channel::Cte, t)];
            let epsi = x[l.index(Channel::Epsi, t)];
            let speed_error = x[l.index(Channel::V, t)] - self.reference_velocity;

            cost = cost
                + cte.powi(2) * w.cte
                + epsi.powi(2) * w.epsi
                + speed_error.powi(2) * w.speed;
        }

        for t in 0..n - 1 {
            let delta = x[l.index(Channel::Delta, t)];
            let a = x[l.index(Channel::A, t)];

            cost = cost
                + delta.powi(2) * w.steering
                + a.powi(2) * w.acceleration
                + (a + delta).powi(3) * w.latency;
        }

        for t in 0..n.saturating_sub(2) {
            let d_delta = x[l.index(Channel::Delta, t + 1)] - x[l.index(Channel::Delta, t)];
            let d_a = x[l.index(Channel::A, t + 1)] - x[l.index(Channel::A, t)];

            cost = cost + d_delta.powi(2) * w.steering_rate + d_a.powi(2) * w.acceleration_rate;
        }

        cost
    }

    fn constraints<D: Scalar>(&self, x: &[D], residuals: &mut [D]) {
        let l = &self.layout;

        for &ch in &Channel::STATES {
            residuals[l.pin_row(ch)] = x[l.index(ch, 0)];
        }

        for t in 0..l.steps() - 1 {
            let k = l.actuator_step(t);
            let predicted = self.model.step(
                self.states_at(x, t),
                x[l.index(Channel::Delta, k)],
                x[l.index(Channel::A, k)],
                &self.reference,
            );

            for (&ch, value) in Channel::STATES.iter().zip(predicted) {
                residuals[l.dynamics_row(ch, t)] = x[l.index(ch, t + 1)] - value;
            }
        }
    }

    /// Pins read one entry. A dynamics row reads the six states of its step,
    /// its own channel one step later, and the two actuators chosen by the
    /// latency policy.
    fn constraint_sparsity(&self) -> Sparsity {
        let l = &self.layout;
        let mut rows = vec![Vec::new(); l.num_constraints()];

        for &ch in &Channel::STATES {
            rows[l.pin_row(ch)].push(l.index(ch, 0));
        }

        for t in 0..l.steps() - 1 {
            let k = l.actuator_step(t);
            let mut shared: Vec<usize> =
                Channel::STATES.iter().map(|&ch| l.index(ch, t)).collect();
            shared.push(l.index(Channel::Delta, k));
            shared.push(l.index(Channel::A, k));

            for &ch in &Channel::STATES {
                let row = &mut rows[l.dynamics_row(ch, t)];
                row.extend_from_slice(&shared);
                row.push(l.index(ch, t + 1));
            }
        }

        Sparsity::new(l.num_variables(), rows)
    }
}
