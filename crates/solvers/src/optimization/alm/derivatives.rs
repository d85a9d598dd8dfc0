use kinetrack_core::NlpProblem;
use num_dual::{Dual64, HyperDual64};

use super::coloring::{color_columns, num_colors};

/// Columns seeded together and the Jacobian entries one pass recovers.
struct ColorGroup {
    columns: Vec<usize>,
    /// `(row, column)` pairs whose derivative lands in `residuals[row].eps`.
    entries: Vec<(usize, usize)>,
}

/// Evaluates a problem and its derivatives with forward-mode dual numbers.
///
/// Cost gradients seed one variable at a time. Constraint Jacobian products
/// seed a whole color group per pass, so the number of constraint evaluations
/// scales with the number of colors rather than the number of variables.
pub(super) struct Derivatives<'a, P> {
    problem: &'a P,
    groups: Vec<ColorGroup>,
}

impl<'a, P: NlpProblem> Derivatives<'a, P> {
    pub(super) fn new(problem: &'a P) -> Self {
        let sparsity = problem.constraint_sparsity();
        let colors = color_columns(&sparsity);

        let mut groups: Vec<ColorGroup> = (0..num_colors(&colors))
            .map(|_| ColorGroup {
                columns: Vec::new(),
                entries: Vec::new(),
            })
            .collect();

        for (col, &color) in colors.iter().enumerate() {
            groups[color].columns.push(col);
        }
        for (row, col) in sparsity.entries() {
            groups[colors[col]].entries.push((row, col));
        }

        Self { problem, groups }
    }

    pub(super) fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub(super) fn cost(&self, u: &[f64]) -> f64 {
        self.problem.cost(u)
    }

    pub(super) fn cost_gradient(&self, u: &[f64], grad: &mut [f64]) {
        let mut x = lift(u);
        for (i, g) in grad.iter_mut().enumerate() {
            x[i].eps = 1.0;
            *g = self.problem.cost(&x).eps;
            x[i].eps = 0.0;
        }
    }

    pub(super) fn constraints(&self, u: &[f64], residuals: &mut [f64]) {
        self.problem.constraints(u, residuals);
    }

    /// Computes `J(u)ᵀ d` where `J` is the constraint Jacobian.
    pub(super) fn jacobian_transpose_product(&self, u: &[f64], d: &[f64], out: &mut [f64]) {
        out.fill(0.0);
        self.for_each_jacobian_entry(u, |row, col, value| out[col] += value * d[row]);
    }

    /// Returns the diagonal of the cost Hessian at `u`.
    pub(super) fn cost_curvature(&self, u: &[f64]) -> Vec<f64> {
        let mut x: Vec<HyperDual64> = u
            .iter()
            .map(|&v| HyperDual64::new(v, 0.0, 0.0, 0.0))
            .collect();

        (0..u.len())
            .map(|i| {
                x[i].eps1 = 1.0;
                x[i].eps2 = 1.0;
                let second = self.problem.cost(&x).eps1eps2;
                x[i].eps1 = 0.0;
                x[i].eps2 = 0.0;
                second
            })
            .collect()
    }

    /// Visits every declared Jacobian entry at `u`, one forward pass per color.
    fn for_each_jacobian_entry(&self, u: &[f64], mut visit: impl FnMut(usize, usize, f64)) {
        let mut x = lift(u);
        let mut residuals = vec![Dual64::new(0.0, 0.0); self.problem.num_constraints()];

        for group in &self.groups {
            for &col in &group.columns {
                x[col].eps = 1.0;
            }

            self.problem.constraints(&x, &mut residuals);
            for &(row, col) in &group.entries {
                visit(row, col, residuals[row].eps);
            }

            for &col in &group.columns {
                x[col].eps = 0.0;
            }
        }
    }
}

fn lift(u: &[f64]) -> Vec<Dual64> {
    u.iter().map(|&v| Dual64::new(v, 0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use kinetrack_core::{Scalar, Sparsity};

    /// A chain of coupled residuals r_i = x_{i+1} - x_i·sin(x_i) with a
    /// quartic cost, declared with its true banded sparsity.
    struct Chain {
        n: usize,
    }

    impl NlpProblem for Chain {
        fn num_variables(&self) -> usize {
            self.n
        }

        fn num_constraints(&self) -> usize {
            self.n - 1
        }

        fn cost<D: Scalar>(&self, x: &[D]) -> D {
            x.iter()
                .enumerate()
                .fold(D::from(0.0), |acc, (i, &xi)| acc + xi.powi(4) * (i as f64 + 1.0))
        }

        fn constraints<D: Scalar>(&self, x: &[D], residuals: &mut [D]) {
            for i in 0..self.n - 1 {
                residuals[i] = x[i + 1] - x[i] * x[i].sin();
            }
        }

        fn constraint_sparsity(&self) -> Sparsity {
            Sparsity::new(self.n, (0..self.n - 1).map(|i| vec![i, i + 1]).collect())
        }
    }

    /// Dense reference: J[r][c] by seeding one column per pass.
    fn dense_jacobian<P: NlpProblem>(problem: &P, u: &[f64]) -> Vec<Vec<f64>> {
        let m = problem.num_constraints();
        let mut jac = vec![vec![0.0; u.len()]; m];
        let mut x = lift(u);
        let mut residuals = vec![Dual64::new(0.0, 0.0); m];

        for col in 0..u.len() {
            x[col].eps = 1.0;
            problem.constraints(&x, &mut residuals);
            for row in 0..m {
                jac[row][col] = residuals[row].eps;
            }
            x[col].eps = 0.0;
        }
        jac
    }

    #[test]
    fn cost_gradient_matches_analytic() {
        let problem = Chain { n: 4 };
        let u = [0.5, -1.0, 2.0, 0.25];
        let mut grad = [0.0; 4];

        Derivatives::new(&problem).cost_gradient(&u, &mut grad);

        for (i, &ui) in u.iter().enumerate() {
            let expected = 4.0 * ui.powi(3) * (i as f64 + 1.0);
            assert_relative_eq!(grad[i], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn cost_curvature_matches_analytic() {
        let problem = Chain { n: 3 };
        let u = [0.5, -1.0, 2.0];

        let curvature = Derivatives::new(&problem).cost_curvature(&u);

        for (i, &ui) in u.iter().enumerate() {
            let expected = 12.0 * ui.powi(2) * (i as f64 + 1.0);
            assert_relative_eq!(curvature[i], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn banded_sparsity_uses_two_passes() {
        let problem = Chain { n: 12 };
        assert_eq!(Derivatives::new(&problem).num_groups(), 2);
    }

    #[test]
    fn colored_product_matches_dense_jacobian() {
        let problem = Chain { n: 7 };
        let u = [0.3, -0.8, 1.1, 2.0, -0.4, 0.9, 1.7];
        let d = [1.0, -2.0, 0.5, 3.0, -1.5, 0.25];

        let mut out = [0.0; 7];
        Derivatives::new(&problem).jacobian_transpose_product(&u, &d, &mut out);

        let jac = dense_jacobian(&problem, &u);
        for col in 0..u.len() {
            let expected: f64 = (0..d.len()).map(|row| jac[row][col] * d[row]).sum();
            assert_relative_eq!(out[col], expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn dense_fallback_matches_declared_sparsity() {
        /// Same residuals with the default dense pattern.
        struct DenseChain(Chain);

        impl NlpProblem for DenseChain {
            fn num_variables(&self) -> usize {
                self.0.num_variables()
            }

            fn num_constraints(&self) -> usize {
                self.0.num_constraints()
            }

            fn cost<D: Scalar>(&self, x: &[D]) -> D {
                self.0.cost(x)
            }

            fn constraints<D: Scalar>(&self, x: &[D], residuals: &mut [D]) {
                self.0.constraints(x, residuals);
            }
        }

        let sparse = Chain { n: 5 };
        let dense = DenseChain(Chain { n: 5 });
        let u = [1.0, 2.0, -0.5, 0.75, -1.25];
        let d = [0.5, 1.5, -2.0, 1.0];

        let mut a = [0.0; 5];
        let mut b = [0.0; 5];
        Derivatives::new(&sparse).jacobian_transpose_product(&u, &d, &mut a);
        Derivatives::new(&dense).jacobian_transpose_product(&u, &d, &mut b);

        assert_eq!(Derivatives::new(&dense).num_groups(), 5);
        for (x, y) in a.iter().zip(&b) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }
}
