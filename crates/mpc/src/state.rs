use crate::InputError;

/// A snapshot of the vehicle at the start of a control cycle.
///
/// `cte` is the cross-track error and `epsi` the heading error relative to the
/// reference path, both already computed by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleState {
    pub x: f64,
    pub y: f64,
    pub psi: f64,
    pub v: f64,
    pub cte: f64,
    pub epsi: f64,
}

impl VehicleState {
    /// Returns the fields in the order of the state channels.
    #[must_use]
    pub fn to_array(&self) -> [f64; 6] {
        [self.x, self.y, self.psi, self.v, self.cte, self.epsi]
    }

    /// Checks that every field is finite.
    ///
    /// # Errors
    ///
    /// Returns the first field that is NaN or infinite.
    pub fn validate(&self) -> Result<(), InputError> {
        const FIELDS: [&str; 6] = ["x", "y", "psi", "v", "cte", "epsi"];

        for (field, value) in FIELDS.into_iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(InputError::NonFiniteState { field, value });
            }
        }
        Ok(())
    }
}
