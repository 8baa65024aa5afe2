//! Preview and playback helpers layered over the simulator.
//!
//! Everything here is a pure free function; none of it affects the
//! authoritative outcome. The parabolic arc is a cheap approximation for the
//! aiming UI, `full_preview` delegates to the real simulator so the preview
//! matches what the server will compute, and `interpolate` densifies a coarse
//! trajectory log for smooth playback.

use crate::config::PhysicsConfig;
use crate::simulate::{ShotInput, SimulateError, SimulationResult, simulate};
use crate::step::BallState;

/// Closed-form parabolic arc (no wind, no resistance) for live aiming
/// preview. Returns `samples` points from launch to touchdown.
pub fn parabolic_arc(
    angle: f64,
    angle_phi: f64,
    power: f64,
    cfg: &PhysicsConfig,
    samples: usize,
) -> Vec<[f64; 3]> {
    if samples == 0 {
        return Vec::new();
    }

    let launch_speed = power * cfg.max_launch_speed;
    let horizontal = launch_speed * angle.cos();
    let vy = launch_speed * angle.sin();
    let vx = horizontal * angle_phi.cos();
    let vz = horizontal * angle_phi.sin();

    // Ideal flight time; zero for level or downward launches.
    let flight_time = if vy > 0.0 { 2.0 * vy / cfg.gravity } else { 0.0 };

    (0..samples)
        .map(|i| {
            let t = if samples == 1 {
                0.0
            } else {
                flight_time * (i as f64) / ((samples - 1) as f64)
            };
            let y = (vy * t - 0.5 * cfg.gravity * t * t).max(0.0);
            [vx * t, y, vz * t]
        })
        .collect()
}

/// Full-fidelity preview: runs the real simulator with the same RNG draw
/// convention, so what the player sees is what the server will verify.
pub fn full_preview(
    input: &ShotInput,
    cfg: &PhysicsConfig,
) -> Result<SimulationResult, SimulateError> {
    simulate(input, cfg)
}

/// Linearly interpolate a coarse trajectory into a denser one sampled at
/// `target_hz`. Vector fields, spin and time interpolate linearly; the
/// rolling flag takes the later state once past the midpoint of a span.
pub fn interpolate(trajectory: &[BallState], target_hz: f64) -> Vec<BallState> {
    if trajectory.len() < 2 || target_hz <= 0.0 {
        return trajectory.to_vec();
    }

    let total_time = trajectory[trajectory.len() - 1].time;
    let dt = 1.0 / target_hz;
    let mut out = Vec::new();
    let mut cursor = 0usize;
    let mut t = 0.0;

    while t < total_time {
        while cursor + 1 < trajectory.len() - 1 && trajectory[cursor + 1].time <= t {
            cursor += 1;
        }
        let a = &trajectory[cursor];
        let b = &trajectory[cursor + 1];
        let span = b.time - a.time;
        let frac = if span > 0.0 { (t - a.time) / span } else { 0.0 };
        out.push(lerp_state(a, b, frac.clamp(0.0, 1.0)));
        t += dt;
    }

    // Always end exactly on the final recorded state.
    out.push(trajectory[trajectory.len() - 1].clone());
    out
}

fn lerp_state(a: &BallState, b: &BallState, frac: f64) -> BallState {
    let lerp = |x: f64, y: f64| x + (y - x) * frac;
    BallState {
        position: [
            lerp(a.position[0], b.position[0]),
            lerp(a.position[1], b.position[1]),
            lerp(a.position[2], b.position[2]),
        ],
        velocity: [
            lerp(a.velocity[0], b.velocity[0]),
            lerp(a.velocity[1], b.velocity[1]),
            lerp(a.velocity[2], b.velocity[2]),
        ],
        acceleration: [0.0, 0.0, 0.0],
        spin: lerp(a.spin, b.spin),
        time: lerp(a.time, b.time),
        rolling: if frac > 0.5 { b.rolling } else { a.rolling },
    }
}

/// Suggested angle/power for a flat target distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTargetSolution {
    pub angle: f64,
    pub power: f64,
}

/// Solve for the lowest-power shot reaching `distance` on flat ground using
/// the ideal projectile-range formula `R = v^2 sin(2a) / g` (no wind or
/// drag). Used for tooling and tuning, not gameplay.
///
/// Returns the 45-degree minimum-speed solution when the distance is
/// reachable, a full-power 45-degree shot when within the configured success
/// tolerance of the maximum range, and `None` beyond that.
pub fn solve_flat_target(distance: f64, cfg: &PhysicsConfig) -> Option<FlatTargetSolution> {
    if distance <= 0.0 || !distance.is_finite() || cfg.max_launch_speed <= 0.0 {
        return None;
    }

    let max_range = cfg.max_launch_speed * cfg.max_launch_speed / cfg.gravity;
    if distance <= max_range {
        let speed = (distance * cfg.gravity).sqrt();
        return Some(FlatTargetSolution {
            angle: std::f64::consts::FRAC_PI_4,
            power: speed / cfg.max_launch_speed,
        });
    }
    if distance <= max_range + cfg.success_tolerance {
        return Some(FlatTargetSolution {
            angle: std::f64::consts::FRAC_PI_4,
            power: 1.0,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::StopReason;

    fn cfg() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    #[test]
    fn test_parabolic_arc_starts_at_origin_and_lands() {
        let arc = parabolic_arc(0.4, 0.0, 0.8, &cfg(), 32);
        assert_eq!(arc.len(), 32);
        assert_eq!(arc[0], [0.0, 0.0, 0.0]);
        let last = arc[arc.len() - 1];
        assert!(last[1].abs() < 1e-9, "did not land: {:?}", last);
        assert!(last[0] > 0.0);
    }

    #[test]
    fn test_parabolic_arc_apex_matches_formula() {
        let power = 0.8;
        let angle = 0.5;
        let arc = parabolic_arc(angle, 0.0, power, &cfg(), 1001);
        let apex = arc.iter().map(|p| p[1]).fold(0.0_f64, f64::max);
        let vy = power * cfg().max_launch_speed * angle.sin();
        let expected = vy * vy / (2.0 * cfg().gravity);
        assert!((apex - expected).abs() < 0.01, "apex {apex} vs {expected}");
    }

    #[test]
    fn test_parabolic_arc_level_launch_is_degenerate() {
        let arc = parabolic_arc(0.0, 0.0, 0.5, &cfg(), 8);
        for p in &arc {
            assert_eq!(*p, [0.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn test_full_preview_matches_authoritative_run() {
        let shot = ShotInput {
            angle: 0.2618,
            angle_phi: 0.0,
            power: 0.85,
            seed: 42,
        };
        let preview = full_preview(&shot, &cfg()).unwrap();
        let authoritative = simulate(&shot, &cfg()).unwrap();
        assert_eq!(preview.trajectory_digest(), authoritative.trajectory_digest());
        assert_eq!(preview.outcome, authoritative.outcome);
    }

    #[test]
    fn test_interpolate_densifies_and_preserves_endpoints() {
        let shot = ShotInput {
            angle: 0.3,
            angle_phi: 0.0,
            power: 0.6,
            seed: 5,
        };
        let result = simulate(&shot, &cfg()).unwrap();
        // 120 Hz source to 240 Hz playback.
        let dense = interpolate(&result.trajectory, 240.0);
        assert!(dense.len() > result.trajectory.len());
        assert_eq!(dense[0], result.trajectory[0]);
        assert_eq!(
            dense[dense.len() - 1],
            result.trajectory[result.trajectory.len() - 1]
        );
        // Time is non-decreasing throughout.
        for pair in dense.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn test_interpolate_rolling_flag_takes_later_past_midpoint() {
        let mut a = BallState::launched([1.0, 0.0, 0.0], 0.0);
        a.rolling = false;
        let mut b = BallState::launched([1.0, 0.0, 0.0], 0.0);
        b.time = 1.0;
        b.rolling = true;

        let early = lerp_state(&a, &b, 0.25);
        assert!(!early.rolling);
        let late = lerp_state(&a, &b, 0.75);
        assert!(late.rolling);
    }

    #[test]
    fn test_interpolate_short_inputs_pass_through() {
        let single = vec![BallState::launched([1.0, 2.0, 0.0], 0.0)];
        assert_eq!(interpolate(&single, 240.0), single);
        assert!(interpolate(&[], 240.0).is_empty());
    }

    #[test]
    fn test_solve_flat_target_reachable() {
        let solution = solve_flat_target(45.0, &cfg()).unwrap();
        assert_eq!(solution.angle, std::f64::consts::FRAC_PI_4);
        assert!(solution.power > 0.0 && solution.power <= 1.0);
        // Round-trip through the range formula.
        let v = solution.power * cfg().max_launch_speed;
        let range = v * v * (2.0 * solution.angle).sin() / cfg().gravity;
        assert!((range - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_solve_flat_target_unreachable() {
        let max_range = cfg().max_launch_speed.powi(2) / cfg().gravity;
        assert!(solve_flat_target(max_range * 2.0, &cfg()).is_none());
        assert!(solve_flat_target(-1.0, &cfg()).is_none());
        // Just past max range but within tolerance: full power.
        let edge = solve_flat_target(max_range + cfg().success_tolerance / 2.0, &cfg()).unwrap();
        assert_eq!(edge.power, 1.0);
    }

    /// The solver's suggestion actually gets close under the real physics
    /// when wind is disabled. Loose bound: drag bleeds some distance.
    #[test]
    fn test_solver_suggestion_lands_near_target_without_wind() {
        let mut calm = cfg();
        calm.max_wind = 0.0;
        let target = calm.hole_position[0];
        let solution = solve_flat_target(target, &calm).unwrap();
        let result = simulate(
            &ShotInput {
                angle: solution.angle,
                angle_phi: 0.0,
                power: solution.power,
                seed: 1,
            },
            &calm,
        )
        .unwrap();
        assert_ne!(result.stopped_reason, StopReason::Boundary);
        let miss = (result.final_position[0] - target).abs();
        assert!(miss < 15.0, "missed by {miss}");
    }
}
