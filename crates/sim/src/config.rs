//! Physics configuration for a single shot.
//!
//! One `PhysicsConfig` is immutable for the duration of a `simulate()` call.
//! The shipped defaults define the one course this system targets: tee at the
//! origin, hole 45 m down the +x axis.

// ============================================================================
// Normative Constants
// ============================================================================

/// Scale applied to the wind vector before it enters the acceleration sum.
pub const WIND_ACCEL_FACTOR: f64 = 0.25;

/// Wind attenuation while the ball is rolling on the ground.
pub const ROLLING_WIND_ATTENUATION: f64 = 0.1;

/// Multiplicative spin decay per step.
pub const SPIN_DECAY: f64 = 0.99;

/// Vertical rebound speeds below this are zeroed to kill micro-bounces.
pub const BOUNCE_SUPPRESS_SPEED: f64 = 0.5;

/// Course envelope, generous around the playable area. Leaving it ends the
/// shot with a `boundary` stop reason.
pub const COURSE_MIN_X: f64 = -50.0;
pub const COURSE_MAX_X: f64 = 300.0;
pub const COURSE_MAX_ABS_Z: f64 = 150.0;

// ============================================================================
// PhysicsConfig
// ============================================================================

/// Immutable per-run physics parameters.
///
/// Axes: x forward (tee toward hole), y up, z lateral.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    /// Launch speed at power = 1.0, in m/s.
    pub max_launch_speed: f64,
    /// Ground friction deceleration applied as a per-step velocity decay.
    pub friction: f64,
    /// Hole center position [x, y, z].
    pub hole_position: [f64; 3],
    /// Capture radius around the hole center (horizontal distance).
    pub hole_radius: f64,
    /// Slack the flat-target solver accepts beyond the ideal maximum range.
    pub success_tolerance: f64,
    /// Maximum wind magnitude drawn from the seed, in m/s.
    pub max_wind: f64,
    /// Simulation time budget in seconds; hitting it ends with `timeout`.
    pub max_sim_time: f64,
    /// Rolling slower than this is `friction`-stopped.
    pub stop_speed: f64,
    /// Fixed integration timestep in seconds.
    pub timestep: f64,
    /// Gravity magnitude, vertical axis only.
    pub gravity: f64,
    /// Quadratic air-resistance coefficient.
    pub air_resistance: f64,
    /// Vertical velocity retained by a ground bounce.
    pub bounce_restitution: f64,
    /// Linear drag coefficient while rolling.
    pub rolling_resistance: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_launch_speed: 34.0,
            friction: 3.0,
            hole_position: [45.0, 0.0, 0.0],
            hole_radius: 2.5,
            success_tolerance: 0.5,
            max_wind: 5.0,
            max_sim_time: 15.0,
            stop_speed: 0.5,
            timestep: 1.0 / 120.0,
            gravity: 9.81,
            air_resistance: 0.01,
            bounce_restitution: 0.35,
            rolling_resistance: 0.8,
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A coefficient that must be non-negative is negative.
    NegativeCoefficient { field: &'static str },
    /// `timestep` must be strictly positive.
    NonPositiveTimestep,
    /// `max_sim_time` must be strictly positive.
    NonPositiveSimTime,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeCoefficient { field } => {
                write!(f, "Physics coefficient {field} must be non-negative")
            }
            Self::NonPositiveTimestep => write!(f, "timestep must be > 0"),
            Self::NonPositiveSimTime => write!(f, "max_sim_time must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl PhysicsConfig {
    /// Check the config invariants: coefficients non-negative, timestep and
    /// time budget strictly positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestep <= 0.0 || !self.timestep.is_finite() {
            return Err(ConfigError::NonPositiveTimestep);
        }
        if self.max_sim_time <= 0.0 || !self.max_sim_time.is_finite() {
            return Err(ConfigError::NonPositiveSimTime);
        }
        let coefficients = [
            ("max_launch_speed", self.max_launch_speed),
            ("friction", self.friction),
            ("hole_radius", self.hole_radius),
            ("success_tolerance", self.success_tolerance),
            ("max_wind", self.max_wind),
            ("stop_speed", self.stop_speed),
            ("gravity", self.gravity),
            ("air_resistance", self.air_resistance),
            ("bounce_restitution", self.bounce_restitution),
            ("rolling_resistance", self.rolling_resistance),
        ];
        for (field, value) in coefficients {
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::NegativeCoefficient { field });
            }
        }
        Ok(())
    }

    /// Tuning parameters in canonical order (sorted by key), for recording in
    /// shot artifacts and for config fingerprinting.
    pub fn tuning_parameters(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("air_resistance", self.air_resistance),
            ("bounce_restitution", self.bounce_restitution),
            ("friction", self.friction),
            ("gravity", self.gravity),
            ("hole_radius", self.hole_radius),
            ("hole_x", self.hole_position[0]),
            ("hole_y", self.hole_position[1]),
            ("hole_z", self.hole_position[2]),
            ("max_launch_speed", self.max_launch_speed),
            ("max_sim_time", self.max_sim_time),
            ("max_wind", self.max_wind),
            ("rolling_resistance", self.rolling_resistance),
            ("stop_speed", self.stop_speed),
            ("success_tolerance", self.success_tolerance),
            ("timestep", self.timestep),
            ("wind_accel_factor", WIND_ACCEL_FACTOR),
        ]
    }
}
