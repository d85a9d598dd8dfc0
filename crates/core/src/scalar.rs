use num_dual::DualNum;

/// The numeric type a problem is evaluated with.
///
/// Problems write their cost and constraints once, generically over `Scalar`.
/// Solvers then call them with plain `f64` for values and with dual numbers
/// when they need derivatives.
///
/// Arithmetic with `f64` works on the right-hand side only (`d * 2.0`, not
/// `2.0 * d`), and constants enter through `D::from(value)`.
pub trait Scalar: DualNum<f64> + Copy {}

impl<T> Scalar for T where T: DualNum<f64> + Copy {}
