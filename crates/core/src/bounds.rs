use thiserror::Error;

/// Parallel lower and upper limits, one pair per entry.
///
/// Used both for the box on decision variables and for the admissible range of
/// each constraint residual. An entry with `lower == upper` pins the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

/// Errors that can occur when validating bounds.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BoundsError {
    #[error("lower has {lower} entries but upper has {upper}")]
    LengthMismatch { lower: usize, upper: usize },

    #[error("bound at index {index} is NaN")]
    NotANumber { index: usize },

    #[error("lower bound {lower} exceeds upper bound {upper} at index {index}")]
    Contradictory { index: usize, lower: f64, upper: f64 },
}

impl Bounds {
    /// Creates bounds from parallel lower and upper vectors.
    ///
    /// Bounds are not validated here so that callers can assemble them entry
    /// by entry; solvers call [`Bounds::validate`] before use.
    ///
    /// # Errors
    ///
    /// Returns an error if the vectors have different lengths.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, BoundsError> {
        if lower.len() != upper.len() {
            return Err(BoundsError::LengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        Ok(Self { lower, upper })
    }

    /// Creates `len` entries that all share the same range.
    #[must_use]
    pub fn uniform(len: usize, lower: f64, upper: f64) -> Self {
        Self {
            lower: vec![lower; len],
            upper: vec![upper; len],
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Sets the range of every entry in `range`.
    ///
    /// # Panics
    ///
    /// Panics if `range` extends past the end of the bounds.
    pub fn set_range(&mut self, range: std::ops::Range<usize>, lower: f64, upper: f64) {
        self.lower[range.clone()].fill(lower);
        self.upper[range].fill(upper);
    }

    /// Pins entry `index` to exactly `value`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn pin(&mut self, index: usize, value: f64) {
        self.lower[index] = value;
        self.upper[index] = value;
    }

    /// Sets the range of a single entry.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: usize, lower: f64, upper: f64) {
        self.lower[index] = lower;
        self.upper[index] = upper;
    }

    /// Checks that no entry is NaN and every lower bound is at most its upper.
    ///
    /// Infinite bounds are allowed.
    ///
    /// # Errors
    ///
    /// Returns the first offending entry.
    pub fn validate(&self) -> Result<(), BoundsError> {
        for (index, (&lower, &upper)) in self.lower.iter().zip(&self.upper).enumerate() {
            if lower.is_nan() || upper.is_nan() {
                return Err(BoundsError::NotANumber { index });
            }
            if lower > upper {
                return Err(BoundsError::Contradictory {
                    index,
                    lower,
                    upper,
                });
            }
        }
        Ok(())
    }

    /// Returns how far `value` lies outside entry `index`, or zero if inside.
    #[must_use]
    pub fn violation(&self, index: usize, value: f64) -> f64 {
        if value < self.lower[index] {
            self.lower[index] - value
        } else if value > self.upper[index] {
            value - self.upper[index]
        } else {
            0.0
        }
    }

    /// Returns `true` if every value lies within its entry.
    #[must_use]
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.len()
            && values
                .iter()
                .enumerate()
                .all(|(i, &v)| self.violation(i, v) == 0.0)
    }
}
