use kinetrack_core::Scalar;

use crate::InputError;

/// A cubic reference path `y = c0 + c1·x + c2·x² + c3·x³`.
///
/// Constructed only from finite coefficients, so every evaluation at a finite
/// `x` is finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePolynomial {
    coefficients: [f64; 4],
}

impl ReferencePolynomial {
    /// Creates a reference from its four coefficients, lowest order first.
    ///
    /// # Errors
    ///
    /// Returns an error if any coefficient is NaN or infinite.
    pub fn new(coefficients: [f64; 4]) -> Result<Self, InputError> {
        if let Some((index, &value)) = coefficients
            .iter()
            .enumerate()
            .find(|(_, c)| !c.is_finite())
        {
            return Err(InputError::NonFiniteCoefficient { index, value });
        }
        Ok(Self { coefficients })
    }

    /// Creates a reference from a slice of coefficients, lowest order first.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice does not hold exactly four coefficients
    /// or if any of them is not finite.
    pub fn from_slice(coefficients: &[f64]) -> Result<Self, InputError> {
        let coefficients: [f64; 4] =
            coefficients
                .try_into()
                .map_err(|_| InputError::CoefficientCount {
                    found: coefficients.len(),
                })?;
        Self::new(coefficients)
    }

    #[must_use]
    pub fn coefficients(&self) -> [f64; 4] {
        self.coefficients
    }

    /// Evaluates the path height at `x`.
    pub fn value<D: Scalar>(&self, x: D) -> D {
        let [c0, c1, c2, c3] = self.coefficients;
        x.powi(3) * c3 + x.powi(2) * c2 + x * c1 + c0
    }

    /// Evaluates the path slope `dy/dx` at `x`.
    pub fn slope<D: Scalar>(&self, x: D) -> D {
        let [_, c1, c2, c3] = self.coefficients;
        x.powi(2) * (3.0 * c3) + x * (2.0 * c2) + c1
    }

    /// Evaluates the desired heading `atan(dy/dx)` at `x`.
    pub fn heading<D: Scalar>(&self, x: D) -> D {
        self.slope(x).atan()
    }
}
