//! Fairway Simulation Core
//!
//! This crate contains the deterministic, fixed-timestep golf-shot simulation.
//! It is the authoritative source of truth for the outcome of a shot: the
//! server re-runs the exact same computation the client ran, and only the
//! server's result awards a coupon.
//!
//! # Architecture Constraints
//!
//! The Simulation Core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time
//! - Use ambient/unseeded randomness
//! - Make system calls
//!
//! All randomness flows from a single `u32` seed through [`SeededRng`], and
//! every position/velocity component is rounded to 4 decimal places after
//! each step. Together these give the determinism contract: for a fixed
//! `(PhysicsConfig, seed, angle, angle_phi, power)`, every conforming run on
//! every platform produces byte-identical rounded trajectory values.

#![deny(unsafe_code)]

pub mod config;
pub mod preview;
pub mod rng;
pub mod simulate;
pub mod step;

pub use config::{ConfigError, PhysicsConfig};
pub use rng::SeededRng;
pub use simulate::{
    DebugInfo, Outcome, ShotInput, SimulateError, SimulationResult, StopReason, ValidationReport,
    debug_info, simulate, validate,
};
pub use step::{BallState, round4, step};
