use kinetrack_solvers::optimization::alm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scale shared by the hand-tuned default weights.
const WEIGHT_SCALE: f64 = 100.0;

/// Complete controller configuration.
///
/// Every field has a default, so a TOML file only needs the values it
/// changes. Validate with [`MpcConfig::validate`] (done by
/// [`Mpc::new`](crate::Mpc::new)) before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpcConfig {
    pub horizon: HorizonConfig,
    pub weights: CostWeights,
    pub limits: ActuatorLimits,

    /// Speed the cost pulls toward.
    pub reference_velocity: f64,

    pub initial_guess: InitialGuess,

    pub solver: alm::Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonConfig {
    /// Number of predicted states, including the current one.
    pub steps: usize,

    /// Time between steps, in seconds.
    pub dt: f64,

    /// Distance from the front axle to the center of gravity.
    pub lf: f64,
}

/// Weights of the cost terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostWeights {
    pub cte: f64,
    pub epsi: f64,
    pub speed: f64,
    pub steering: f64,
    pub acceleration: f64,

    /// Weight of the cubed sum of acceleration and steering.
    pub latency: f64,

    pub steering_rate: f64,
    pub acceleration_rate: f64,
}

/// Symmetric limits on the decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorLimits {
    /// Largest steering angle magnitude, in radians.
    pub steering: f64,

    /// Largest acceleration magnitude.
    pub acceleration: f64,

    /// Bound placed on state entries, which are otherwise free.
    pub unbounded: f64,
}

/// How the decision vector is seeded before each solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialGuess {
    /// Zero except for the pinned initial state.
    #[default]
    Pinned,

    /// The initial state rolled forward through the model with zero
    /// actuation, which satisfies every dynamics constraint.
    Rollout,
}

/// Errors that can occur when loading or validating a controller config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("horizon needs at least 2 steps, got {0}")]
    Steps(usize),

    #[error("dt must be finite and positive")]
    Dt,

    #[error("lf must be finite and positive")]
    Lf,

    #[error("cost weight `{0}` must be finite and non-negative")]
    Weight(&'static str),

    #[error("limit `{0}` must be positive and not NaN")]
    Limit(&'static str),

    #[error("reference_velocity must be finite")]
    ReferenceVelocity,

    #[error("invalid solver config")]
    Solver(#[from] alm::ConfigError),

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

impl Default for MpcConfig {
    fn default() -> Self {
        Self {
            horizon: HorizonConfig::default(),
            weights: CostWeights::default(),
            limits: ActuatorLimits::default(),
            reference_velocity: 80.0,
            initial_guess: InitialGuess::default(),
            solver: alm::Config::default(),
        }
    }
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            steps: 11,
            dt: 0.1,
            lf: 2.67,
        }
    }
}

impl Default for CostWeights {
    fn default() -> Self {
        let s = WEIGHT_SCALE;
        Self {
            cte: s / 2.0,
            epsi: s / 240.0,
            speed: s / 340.0,
            steering: s * 3450.0,
            acceleration: s / 2.8,
            latency: s * 2.3,
            steering_rate: s / 1000.0,
            acceleration_rate: s / 2000.0,
        }
    }
}

impl Default for ActuatorLimits {
    fn default() -> Self {
        Self {
            steering: 25.0 * std::f64::consts::PI / 180.0,
            acceleration: 1.0,
            unbounded: 1.0e19,
        }
    }
}

impl MpcConfig {
    /// Parses a config from TOML and validates it.
    ///
    /// Missing tables and fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or any value is invalid.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value against the range the controller accepts.
    ///
    /// # Errors
    ///
    /// Returns the first value found out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let HorizonConfig { steps, dt, lf } = self.horizon;
        if steps < 2 {
            return Err(ConfigError::Steps(steps));
        }
        if !is_positive(dt) {
            return Err(ConfigError::Dt);
        }
        if !is_positive(lf) {
            return Err(ConfigError::Lf);
        }

        for (name, weight) in self.weights.named() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::Weight(name));
            }
        }

        let limits = [
            ("steering", self.limits.steering),
            ("acceleration", self.limits.acceleration),
            ("unbounded", self.limits.unbounded),
        ];
        for (name, limit) in limits {
            // Infinite limits are fine; the solver's box accepts them.
            if limit.is_nan() || limit <= 0.0 {
                return Err(ConfigError::Limit(name));
            }
        }

        if !self.reference_velocity.is_finite() {
            return Err(ConfigError::ReferenceVelocity);
        }

        self.solver.validate()?;
        Ok(())
    }
}

impl CostWeights {
    fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("cte", self.cte),
            ("epsi", self.epsi),
            ("speed", self.speed),
            ("steering", self.steering),
            ("acceleration", self.acceleration),
            ("latency", self.latency),
            ("steering_rate", self.steering_rate),
            ("acceleration_rate", self.acceleration_rate),
        ]
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
