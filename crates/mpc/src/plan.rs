use kinetrack_solvers::optimization::alm;

/// The actuator values to apply this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlCommand {
    /// Steering angle in radians.
    pub steering_angle: f64,

    pub acceleration: f64,
}

/// Positions the controller expects the vehicle to pass through.
///
/// Holds the first `N − 1` predicted `(x, y)` positions of the most recent
/// solve, or nothing if there is none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictedTrajectory {
    points: Vec<(f64, f64)>,
}

impl PredictedTrajectory {
    pub(crate) fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Returns the predicted x positions in order.
    pub fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(x, _)| x)
    }

    /// Returns the predicted y positions in order.
    pub fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|&(_, y)| y)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
    }
}

/// Everything one successful solve produced.
#[derive(Debug, Clone)]
pub struct Plan {
    pub command: ControlCommand,
    pub trajectory: PredictedTrajectory,

    /// The converged solver result, including the full decision vector.
    pub solution: alm::Solution,
}
