use kinetrack_core::{Bounds, NlpProblem};

use super::derivatives::Derivatives;

/// Affine change of variables `u = center + scale ⊙ z` handed to the engine.
///
/// The engine works on `z`. Its inner solver stops on the length of a
/// projected gradient step and perturbs the iterate in proportion to its
/// magnitude, so `z` is centered on the seed and scaled to unit curvature.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Scaling {
    center: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaling {
    /// Jacobi scaling from the diagonal of the cost Hessian at `seed`.
    ///
    /// Each variable gets `1 / sqrt(max(1, |∂²f/∂uᵢ²|))`. Variables with
    /// little curvature keep their own units, and constraint stiffness is left
    /// to the penalty. Expensive variables therefore move slowly while cheap
    /// ones absorb constraint violation, much like a Newton step would.
    pub(super) fn jacobi<P: NlpProblem>(derivatives: &Derivatives<'_, P>, seed: &[f64]) -> Self {
        let scale = derivatives
            .cost_curvature(seed)
            .iter()
            .map(|h| {
                let h = h.abs();
                if h.is_finite() {
                    1.0 / h.max(1.0).sqrt()
                } else {
                    1.0
                }
            })
            .collect();

        Self {
            center: seed.to_vec(),
            scale,
        }
    }

    #[cfg(test)]
    pub(super) fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Maps an engine iterate back to the problem's variables.
    pub(super) fn original(&self, z: &[f64]) -> Vec<f64> {
        self.center
            .iter()
            .zip(&self.scale)
            .zip(z)
            .map(|((c, s), z)| c + s * z)
            .collect()
    }

    /// Turns a gradient with respect to `u` into one with respect to `z`.
    pub(super) fn chain(&self, grad: &mut [f64]) {
        for (g, s) in grad.iter_mut().zip(&self.scale) {
            *g *= s;
        }
    }

    /// Returns the variable box in engine coordinates as `(lower, upper)`.
    pub(super) fn bounds(&self, bounds: &Bounds) -> (Vec<f64>, Vec<f64>) {
        let to_scaled = |limits: &[f64]| -> Vec<f64> {
            limits
                .iter()
                .zip(&self.center)
                .zip(&self.scale)
                .map(|((l, c), s)| (l - c) / s)
                .collect()
        };
        (to_scaled(bounds.lower()), to_scaled(bounds.upper()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use kinetrack_core::{Scalar, Sparsity};

    /// One stiff variable, one soft variable, and a free one tied to it.
    struct Stiff;

    impl NlpProblem for Stiff {
        fn num_variables(&self) -> usize {
            3
        }

        fn num_constraints(&self) -> usize {
            1
        }

        fn cost<D: Scalar>(&self, x: &[D]) -> D {
            x[0].powi(2) * 5000.0 + x[1].powi(2) * 0.1 - x[2].powi(3) * 2.0
        }

        fn constraints<D: Scalar>(&self, x: &[D], residuals: &mut [D]) {
            residuals[0] = x[2] - x[1] * 3.0;
        }

        fn constraint_sparsity(&self) -> Sparsity {
            Sparsity::new(3, vec![vec![1, 2]])
        }
    }

    #[test]
    fn stiff_variables_shrink_and_soft_ones_stay() {
        let derivatives = Derivatives::new(&Stiff);
        let scaling = Scaling::jacobi(&derivatives, &[1.0, 2.0, 3.0]);

        // 1 / sqrt(10000), unscaled, then 1 / sqrt(|-12·3|)
        assert_relative_eq!(scaling.scale()[0], 0.01, epsilon = 1e-12);
        assert_relative_eq!(scaling.scale()[1], 1.0);
        assert_relative_eq!(scaling.scale()[2], 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn flat_directions_are_left_alone() {
        let derivatives = Derivatives::new(&Stiff);
        let scaling = Scaling::jacobi(&derivatives, &[0.0, 0.0, 0.0]);

        assert_relative_eq!(scaling.scale()[1], 1.0);
        assert_relative_eq!(scaling.scale()[2], 1.0);
    }

    #[test]
    fn origin_maps_to_the_seed() {
        let seed = [1.0, 2.0, 6.0];
        let scaling = Scaling::jacobi(&Derivatives::new(&Stiff), &seed);

        assert_eq!(scaling.original(&[0.0; 3]), seed.to_vec());

        let u = scaling.original(&[1.0, -1.0, 2.0]);
        assert_relative_eq!(u[0], 1.01, epsilon = 1e-12);
        assert_relative_eq!(u[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn gradients_pick_up_the_scale() {
        let scaling = Scaling::jacobi(&Derivatives::new(&Stiff), &[1.0, 2.0, 3.0]);
        let mut grad = [200.0, -4.0, 12.0];

        scaling.chain(&mut grad);

        assert_relative_eq!(grad[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(grad[1], -4.0);
        assert_relative_eq!(grad[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn bounds_follow_the_change_of_variables() {
        let scaling = Scaling::jacobi(&Derivatives::new(&Stiff), &[1.0, 2.0, 6.0]);
        let mut bounds = Bounds::uniform(3, -1e19, 1e19);
        bounds.set(0, 0.5, 1.5);
        bounds.pin(2, 6.0);

        let (lower, upper) = scaling.bounds(&bounds);

        assert_relative_eq!(lower[0], -50.0, epsilon = 1e-9);
        assert_relative_eq!(upper[0], 50.0, epsilon = 1e-9);
        assert_eq!(lower[2], 0.0);
        assert_eq!(upper[2], 0.0);
        assert!(lower[1] <= -1e19 && upper[1] >= 1e19);
    }
}
