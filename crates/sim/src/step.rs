//! Fixed-timestep rigid-body step for one ball.
//!
//! The step order is normative; reordering any of these phases changes the
//! rounded trajectory and breaks the client/server determinism contract:
//!
//! 1. Reset acceleration; gravity when airborne, ground clamp when not.
//! 2. Wind acceleration (attenuated to 10% while rolling).
//! 3. Quadratic air resistance opposing velocity.
//! 4. Rolling resistance and multiplicative friction decay (ground only).
//! 5. Semi-implicit Euler: velocity first, then position.
//! 6. Ground collision with damped vertical reflection.
//! 7. Spin decay.
//! 8. 4-decimal rounding of every position/velocity component.

use crate::config::{
    BOUNCE_SUPPRESS_SPEED, PhysicsConfig, ROLLING_WIND_ATTENUATION, SPIN_DECAY, WIND_ACCEL_FACTOR,
};

/// Kinematic state of the ball, advanced in place each step.
#[derive(Debug, Clone, PartialEq)]
pub struct BallState {
    /// Position [x, y, z]; y is height above the ground.
    pub position: [f64; 3],
    /// Velocity [vx, vy, vz].
    pub velocity: [f64; 3],
    /// Acceleration scratch, recomputed from zero every step.
    pub acceleration: [f64; 3],
    /// Scalar spin; decays each step, purely cosmetic for playback.
    pub spin: f64,
    /// Elapsed simulation time in seconds.
    pub time: f64,
    /// Whether the ball is currently on the ground.
    pub rolling: bool,
}

impl BallState {
    /// State at t = 0 for a ball leaving the tee with the given velocity.
    pub fn launched(velocity: [f64; 3], spin: f64) -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            velocity,
            acceleration: [0.0, 0.0, 0.0],
            spin,
            time: 0.0,
            rolling: false,
        }
    }

    /// Current speed (velocity magnitude).
    pub fn speed(&self) -> f64 {
        magnitude(self.velocity)
    }
}

/// Round to 4 decimal places, half away from zero.
///
/// This is the load-bearing determinism device: it runs after integration and
/// collision response, before the state is observable, and eliminates
/// platform-specific least-significant-bit drift. It is idempotent, so every
/// emitted component equals itself re-rounded.
pub fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}

/// Vector magnitude.
pub fn magnitude(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Advance `ball` by one fixed timestep under the constant `wind` vector.
pub fn step(ball: &mut BallState, cfg: &PhysicsConfig, wind: [f64; 3]) {
    let dt = cfg.timestep;
    let mut accel = [0.0_f64; 3];

    // Airborne iff above ground or still moving upward.
    let airborne = ball.position[1] > 0.0 || ball.velocity[1] > 0.0;
    let rolling = if airborne {
        accel[1] -= cfg.gravity;
        false
    } else {
        ball.position[1] = 0.0;
        true
    };

    // Wind matters far less once the ball is on the ground.
    let wind_scale = if rolling {
        WIND_ACCEL_FACTOR * ROLLING_WIND_ATTENUATION
    } else {
        WIND_ACCEL_FACTOR
    };
    for axis in 0..3 {
        accel[axis] += wind[axis] * wind_scale;
    }

    // Quadratic drag: accel = -v * (air * |v|), i.e. proportional to speed^2.
    let speed = magnitude(ball.velocity);
    if speed > 0.0 {
        let drag = cfg.air_resistance * speed;
        for axis in 0..3 {
            accel[axis] -= ball.velocity[axis] * drag;
        }
    }

    if rolling {
        // Linear rolling resistance on the horizontal axes.
        accel[0] -= ball.velocity[0] * cfg.rolling_resistance;
        accel[2] -= ball.velocity[2] * cfg.rolling_resistance;

        // Friction as a direct per-step velocity decay, saturating at a full
        // stop when the friction impulse would exceed the current speed.
        if speed > 0.0 {
            let decay = 1.0 - (cfg.friction * dt / speed).min(1.0);
            for axis in 0..3 {
                ball.velocity[axis] *= decay;
            }
        }
    }

    // Semi-implicit Euler: velocity before position.
    for axis in 0..3 {
        ball.velocity[axis] += accel[axis] * dt;
        ball.position[axis] += ball.velocity[axis] * dt;
    }

    // Ground collision: clamp and reflect with restitution damping.
    if ball.position[1] < 0.0 {
        ball.position[1] = 0.0;
        ball.velocity[1] = -ball.velocity[1] * cfg.bounce_restitution;
        if ball.velocity[1].abs() < BOUNCE_SUPPRESS_SPEED {
            ball.velocity[1] = 0.0;
        }
    }

    ball.spin *= SPIN_DECAY;

    for axis in 0..3 {
        ball.position[axis] = round4(ball.position[axis]);
        ball.velocity[axis] = round4(ball.velocity[axis]);
    }

    ball.acceleration = accel;
    ball.time += dt;
    ball.rolling = rolling;
}
