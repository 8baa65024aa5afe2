//! Trajectory simulator: orchestrates the step engine across the time budget
//! and assembles the durable artifact of a shot.
//!
//! One `simulate()` call consumes one `ShotInput` and one `PhysicsConfig` and
//! produces one `SimulationResult`; the result is never mutated afterwards.

use crate::config::{COURSE_MAX_ABS_Z, COURSE_MAX_X, COURSE_MIN_X, PhysicsConfig};
use crate::rng::SeededRng;
use crate::step::{BallState, magnitude, round4, step};

/// Power below this draws a non-fatal validation warning.
const LOW_POWER_WARNING: f64 = 0.05;

/// Launch angles steeper than this (radians) draw a non-fatal warning.
const STEEP_ANGLE_WARNING: f64 = 1.4;

// ============================================================================
// Input & Validation
// ============================================================================

/// Shot parameters as supplied by the player, plus the session seed.
///
/// The seed is `u32` by construction: the RNG contract is 32-bit, and
/// non-integer or negative seeds are unrepresentable in this API. The wire
/// layer enforces the same at decode time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotInput {
    /// Vertical launch angle in radians, within [-pi/2, pi/2].
    pub angle: f64,
    /// Horizontal deflection angle in radians, within [-pi/2, pi/2].
    pub angle_phi: f64,
    /// Launch power in [0, 1].
    pub power: f64,
    /// Session seed driving the wind draw.
    pub seed: u32,
}

/// Outcome of input validation: hard errors and non-fatal warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate shot parameters before simulation.
///
/// Angles exactly at ±pi/2 and power exactly at 0 or 1 are accepted; values
/// epsilon beyond are rejected.
pub fn validate(input: &ShotInput) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let half_pi = std::f64::consts::FRAC_PI_2;

    if !input.angle.is_finite() {
        errors.push("angle must be a finite number".to_string());
    } else if input.angle < -half_pi || input.angle > half_pi {
        errors.push(format!(
            "angle {} outside allowed range [-pi/2, pi/2]",
            input.angle
        ));
    }

    if !input.angle_phi.is_finite() {
        errors.push("angle_phi must be a finite number".to_string());
    } else if input.angle_phi < -half_pi || input.angle_phi > half_pi {
        errors.push(format!(
            "angle_phi {} outside allowed range [-pi/2, pi/2]",
            input.angle_phi
        ));
    }

    if !input.power.is_finite() {
        errors.push("power must be a finite number".to_string());
    } else if !(0.0..=1.0).contains(&input.power) {
        errors.push(format!("power {} outside allowed range [0, 1]", input.power));
    }

    if errors.is_empty() {
        if input.power < LOW_POWER_WARNING {
            warnings.push(format!(
                "power {} is very low; the ball will barely leave the tee",
                input.power
            ));
        }
        if input.angle.abs() > STEEP_ANGLE_WARNING {
            warnings.push(format!(
                "angle {} is nearly vertical; the shot will gain little distance",
                input.angle
            ));
        }
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Simulation failure. The simulator has no partial-failure modes; the only
/// error is refusing to run on out-of-domain input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulateError {
    /// Input validation failed; carries the specific messages.
    InvalidInput(Vec<String>),
}

impl std::fmt::Display for SimulateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(errors) => {
                write!(f, "Invalid shot input: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for SimulateError {}

// ============================================================================
// Result Types
// ============================================================================

/// Win/loss outcome. Win iff the stop reason is `Hole`; no partial credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Lose => "lose",
        }
    }
}

/// Why the simulation loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Rolling ball crossed into the hole capture radius. There is
    /// deliberately no upper speed limit: fast balls still go in.
    Hole,
    /// Rolling speed fell below the stop threshold.
    Friction,
    /// Time budget exhausted.
    Timeout,
    /// Ball left the course envelope.
    Boundary,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hole => "hole",
            Self::Friction => "friction",
            Self::Timeout => "timeout",
            Self::Boundary => "boundary",
        }
    }
}

/// Complete record of one simulated shot. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// One entry per accepted timestep, plus the initial state at t = 0.
    pub trajectory: Vec<BallState>,
    pub outcome: Outcome,
    pub final_position: [f64; 3],
    pub total_time: f64,
    pub max_height: f64,
    /// Total path length along the rounded trajectory.
    pub total_distance: f64,
    /// The wind vector actually applied, drawn once from the seed.
    pub wind: [f64; 3],
    pub stopped_reason: StopReason,
}

// ============================================================================
// Trajectory Digest (FNV-1a 64)
// ============================================================================

/// FNV-1a 64-bit offset basis.
const FNV1A_OFFSET_BASIS: u64 = 0xcbf29ce484222325;

/// FNV-1a 64-bit prime.
const FNV1A_PRIME: u64 = 0x100000001b3;

#[derive(Debug, Clone)]
struct Fnv1a64 {
    state: u64,
}

impl Fnv1a64 {
    fn new() -> Self {
        Self {
            state: FNV1A_OFFSET_BASIS,
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(FNV1A_PRIME);
        }
    }

    fn finish(self) -> u64 {
        self.state
    }
}

/// Canonicalize an f64 for hashing: `-0.0` → `+0.0`, any NaN → quiet NaN.
///
/// The 4-decimal rounding can legitimately produce `-0.0` (e.g. a velocity
/// component decaying through -0.00004), so canonicalization is required even
/// though every hashed value is already rounded.
fn canonicalize_f64(value: f64) -> u64 {
    const QUIET_NAN_BITS: u64 = 0x7ff8000000000000;

    if value.is_nan() {
        QUIET_NAN_BITS
    } else if value == 0.0 {
        0u64
    } else {
        value.to_bits()
    }
}

impl SimulationResult {
    /// Compact equality check over the whole trajectory, used by the
    /// anti-cheat verifier instead of shipping every snapshot.
    ///
    /// Algorithm: FNV-1a 64 over the entry count followed by, per entry, the
    /// canonicalized little-endian position, velocity, spin and time fields.
    pub fn trajectory_digest(&self) -> u64 {
        let mut hasher = Fnv1a64::new();
        hasher.update(&(self.trajectory.len() as u64).to_le_bytes());
        for state in &self.trajectory {
            for axis in 0..3 {
                hasher.update(&canonicalize_f64(state.position[axis]).to_le_bytes());
            }
            for axis in 0..3 {
                hasher.update(&canonicalize_f64(state.velocity[axis]).to_le_bytes());
            }
            hasher.update(&canonicalize_f64(state.spin).to_le_bytes());
            hasher.update(&canonicalize_f64(state.time).to_le_bytes());
        }
        hasher.finish()
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Horizontal distance from a position to the hole center.
fn hole_distance(position: [f64; 3], cfg: &PhysicsConfig) -> f64 {
    let dx = position[0] - cfg.hole_position[0];
    let dz = position[2] - cfg.hole_position[2];
    (dx * dx + dz * dz).sqrt()
}

fn outside_course(position: [f64; 3]) -> bool {
    position[0] < COURSE_MIN_X || position[0] > COURSE_MAX_X || position[2].abs() > COURSE_MAX_ABS_Z
}

/// Run one shot to completion.
///
/// The RNG is reset to the input seed and the wind direction and magnitude
/// are drawn exactly once, before the loop; this single draw is what makes
/// the wind session-deterministic. The initial velocity and wind components
/// are rounded to 4 decimals so that every value entering the step loop
/// already lives in rounded space (libm sin/cos differences would otherwise
/// leak platform drift into the first step).
pub fn simulate(
    input: &ShotInput,
    cfg: &PhysicsConfig,
) -> Result<SimulationResult, SimulateError> {
    let report = validate(input);
    if !report.is_valid {
        return Err(SimulateError::InvalidInput(report.errors));
    }

    let mut rng = SeededRng::new(input.seed);

    let launch_speed = input.power * cfg.max_launch_speed;
    let horizontal = launch_speed * input.angle.cos();
    let vy = launch_speed * input.angle.sin();
    let vx = horizontal * input.angle_phi.cos();
    let vz = horizontal * input.angle_phi.sin();

    let wind_dir = rng.range(0.0, 2.0 * std::f64::consts::PI);
    let wind_mag = rng.range(0.0, cfg.max_wind);
    let wind = [
        round4(wind_dir.cos() * wind_mag),
        0.0,
        round4(wind_dir.sin() * wind_mag),
    ];

    let mut ball = BallState::launched([round4(vx), round4(vy), round4(vz)], 0.0);
    let mut trajectory = vec![ball.clone()];
    let mut max_height = 0.0_f64;
    let mut total_distance = 0.0_f64;
    let mut stopped_reason = StopReason::Timeout;

    while ball.time < cfg.max_sim_time {
        let previous = ball.position;
        step(&mut ball, cfg, wind);

        let dx = ball.position[0] - previous[0];
        let dy = ball.position[1] - previous[1];
        let dz = ball.position[2] - previous[2];
        total_distance += (dx * dx + dy * dy + dz * dz).sqrt();
        max_height = max_height.max(ball.position[1]);
        trajectory.push(ball.clone());

        // Terminal conditions, in priority order.
        if ball.rolling && hole_distance(ball.position, cfg) < cfg.hole_radius {
            stopped_reason = StopReason::Hole;
            break;
        }
        if ball.rolling && magnitude(ball.velocity) < cfg.stop_speed {
            stopped_reason = StopReason::Friction;
            break;
        }
        if outside_course(ball.position) {
            stopped_reason = StopReason::Boundary;
            break;
        }
    }

    let outcome = if stopped_reason == StopReason::Hole {
        Outcome::Win
    } else {
        Outcome::Lose
    };

    Ok(SimulationResult {
        final_position: ball.position,
        total_time: ball.time,
        max_height,
        total_distance,
        wind,
        outcome,
        stopped_reason,
        trajectory,
    })
}

// ============================================================================
// Debug / Analysis
// ============================================================================

/// Derived trajectory metrics. Never consulted for win determination.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugInfo {
    pub average_speed: f64,
    /// Fraction of initial kinetic energy lost by the end of the shot.
    pub energy_loss_ratio: f64,
    /// Final horizontal distance to the configured hole center.
    pub final_hole_distance: f64,
}

/// Compute derived metrics from a completed simulation.
pub fn debug_info(result: &SimulationResult, cfg: &PhysicsConfig) -> DebugInfo {
    let average_speed = if result.total_time > 0.0 {
        result.total_distance / result.total_time
    } else {
        0.0
    };

    let initial_speed = result
        .trajectory
        .first()
        .map(BallState::speed)
        .unwrap_or(0.0);
    let final_speed = result
        .trajectory
        .last()
        .map(BallState::speed)
        .unwrap_or(0.0);
    let energy_loss_ratio = if initial_speed > 0.0 {
        1.0 - (final_speed * final_speed) / (initial_speed * initial_speed)
    } else {
        0.0
    };

    DebugInfo {
        average_speed,
        energy_loss_ratio,
        final_hole_distance: hole_distance(result.final_position, cfg),
    }
}

// ============================================================================
// Tests
// ============================================================================
