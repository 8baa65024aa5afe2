//! Fairway Wire Protocol Types
//!
//! This crate defines the shared Protobuf message types used between the
//! aiming client and the server edge. Both binaries MUST depend on this crate
//! so the session and play contracts cannot drift.
//!
//! # Message Categories
//!
//! - **Session lifecycle**: `SessionGrant` (session-start response)
//! - **Play**: `PlayRequest` / `PlayReceipt`
//! - **Audit**: `ShotRecordProto` (the anti-cheat artifact)
//!
//! The actual determinism contract lives in `fairway-sim`: for a fixed
//! `(PhysicsConfig, seed, angle, angle_phi, power)` every conforming
//! implementation produces byte-identical rounded trajectory values. The
//! messages here only ferry those inputs and summaries around.

#![deny(unsafe_code)]

use prost::Message;

use fairway_sim::{BallState, Outcome, SimulationResult, StopReason};

// ============================================================================
// Session Lifecycle Messages
// ============================================================================

/// Session-start response: everything the client needs to run its local
/// preview of the very shot the server will verify.
#[derive(Clone, PartialEq, Message)]
pub struct SessionGrant {
    /// Opaque session identifier.
    #[prost(string, tag = "1")]
    pub session_id: String,

    /// Seed for the deterministic wind draw; client and server both use it.
    #[prost(uint32, tag = "2")]
    pub seed: u32,

    /// Session expiry, milliseconds since the Unix epoch.
    #[prost(uint64, tag = "3")]
    pub expires_at_ms: u64,

    /// Coupons this session is eligible to win.
    #[prost(string, repeated, tag = "4")]
    pub coupon_ids: Vec<String>,
}

// ============================================================================
// Play Messages
// ============================================================================

/// One shot attempt against an existing session.
///
/// Note: the seed is NOT included; the server uses the seed stored with the
/// session, which is what makes its re-simulation authoritative.
#[derive(Clone, PartialEq, Message)]
pub struct PlayRequest {
    #[prost(string, tag = "1")]
    pub session_id: String,

    /// Vertical launch angle in radians.
    #[prost(double, tag = "2")]
    pub angle: f64,

    /// Horizontal deflection angle in radians.
    #[prost(double, tag = "3")]
    pub angle_phi: f64,

    /// Launch power in [0, 1].
    #[prost(double, tag = "4")]
    pub power: f64,

    /// Client timestamp, milliseconds since the Unix epoch. Checked against
    /// the server clock for replay protection.
    #[prost(uint64, tag = "5")]
    pub timestamp_ms: u64,
}

/// Summary of the authoritative simulation attached to a play receipt.
#[derive(Clone, PartialEq, Message)]
pub struct ShotSummary {
    /// Final position [x, y, z].
    #[prost(double, repeated, tag = "1")]
    pub final_position: Vec<f64>,

    /// Total elapsed simulation time in seconds.
    #[prost(double, tag = "2")]
    pub total_time: f64,

    /// Number of trajectory entries (including the initial state).
    #[prost(uint32, tag = "3")]
    pub trajectory_len: u32,

    /// Maximum height reached.
    #[prost(double, tag = "4")]
    pub max_height: f64,

    /// Wind vector applied for the whole shot.
    #[prost(double, repeated, tag = "5")]
    pub wind: Vec<f64>,

    /// "hole" | "friction" | "timeout" | "boundary".
    #[prost(string, tag = "6")]
    pub stopped_reason: String,
}

/// Server response to a play request.
#[derive(Clone, PartialEq, Message)]
pub struct PlayReceipt {
    /// True when the server's own simulation produced this result.
    #[prost(bool, tag = "1")]
    pub verified: bool,

    /// "win" | "lose".
    #[prost(string, tag = "2")]
    pub outcome: String,

    /// Coupon identifier awarded on a win.
    #[prost(string, optional, tag = "3")]
    pub awarded_coupon: Option<String>,

    #[prost(message, optional, tag = "4")]
    pub summary: Option<ShotSummary>,
}

// ============================================================================
// Audit / Artifact Messages
// ============================================================================

/// One snapshot of the ball, as recorded in the trajectory log.
#[derive(Clone, PartialEq, Message)]
pub struct BallStateProto {
    /// Position [x, y, z].
    #[prost(double, repeated, tag = "1")]
    pub position: Vec<f64>,

    /// Velocity [vx, vy, vz].
    #[prost(double, repeated, tag = "2")]
    pub velocity: Vec<f64>,

    #[prost(double, tag = "3")]
    pub spin: f64,

    #[prost(double, tag = "4")]
    pub time: f64,

    #[prost(bool, tag = "5")]
    pub rolling: bool,
}

/// Tuning parameter key-value pair, sorted by key in any containing message.
#[derive(Clone, PartialEq, Message)]
pub struct TuningParameter {
    #[prost(string, tag = "1")]
    pub key: String,

    #[prost(double, tag = "2")]
    pub value: f64,
}

/// Complete shot record for offline anti-cheat verification.
#[derive(Clone, PartialEq, Message)]
pub struct ShotRecordProto {
    /// Schema version (starts at 1).
    #[prost(uint32, tag = "1")]
    pub record_format_version: u32,

    /// Session seed the shot was simulated with.
    #[prost(uint32, tag = "2")]
    pub seed: u32,

    #[prost(double, tag = "3")]
    pub angle: f64,

    #[prost(double, tag = "4")]
    pub angle_phi: f64,

    #[prost(double, tag = "5")]
    pub power: f64,

    /// Physics tuning parameters in effect, sorted by key.
    #[prost(message, repeated, tag = "6")]
    pub tuning_parameters: Vec<TuningParameter>,

    /// SHA-256 over the canonical tuning-parameter encoding.
    #[prost(string, tag = "7")]
    pub config_fingerprint: String,

    /// "win" | "lose".
    #[prost(string, tag = "8")]
    pub outcome: String,

    /// "hole" | "friction" | "timeout" | "boundary".
    #[prost(string, tag = "9")]
    pub stopped_reason: String,

    /// FNV-1a 64 digest of the rounded trajectory.
    #[prost(uint64, tag = "10")]
    pub trajectory_digest: u64,

    /// Number of trajectory entries.
    #[prost(uint32, tag = "11")]
    pub trajectory_len: u32,

    /// Final position [x, y, z].
    #[prost(double, repeated, tag = "12")]
    pub final_position: Vec<f64>,

    /// Wind vector applied [x, y, z].
    #[prost(double, repeated, tag = "13")]
    pub wind: Vec<f64>,
}

// ============================================================================
// Conversion Traits
// ============================================================================

impl From<&BallState> for BallStateProto {
    fn from(state: &BallState) -> Self {
        Self {
            position: state.position.to_vec(),
            velocity: state.velocity.to_vec(),
            spin: state.spin,
            time: state.time,
            rolling: state.rolling,
        }
    }
}

impl TryFrom<BallStateProto> for BallState {
    type Error = &'static str;

    fn try_from(proto: BallStateProto) -> Result<Self, Self::Error> {
        if proto.position.len() != 3 {
            return Err("position must have exactly 3 elements");
        }
        if proto.velocity.len() != 3 {
            return Err("velocity must have exactly 3 elements");
        }
        Ok(Self {
            position: [proto.position[0], proto.position[1], proto.position[2]],
            velocity: [proto.velocity[0], proto.velocity[1], proto.velocity[2]],
            acceleration: [0.0, 0.0, 0.0],
            spin: proto.spin,
            time: proto.time,
            rolling: proto.rolling,
        })
    }
}

impl From<&SimulationResult> for ShotSummary {
    fn from(result: &SimulationResult) -> Self {
        Self {
            final_position: result.final_position.to_vec(),
            total_time: result.total_time,
            trajectory_len: result.trajectory.len() as u32,
            max_height: result.max_height,
            wind: result.wind.to_vec(),
            stopped_reason: result.stopped_reason.as_str().to_string(),
        }
    }
}

/// Parse a stop-reason tag back from the wire.
pub fn parse_stop_reason(tag: &str) -> Result<StopReason, &'static str> {
    match tag {
        "hole" => Ok(StopReason::Hole),
        "friction" => Ok(StopReason::Friction),
        "timeout" => Ok(StopReason::Timeout),
        "boundary" => Ok(StopReason::Boundary),
        _ => Err("unknown stop reason"),
    }
}

/// Parse an outcome tag back from the wire.
pub fn parse_outcome(tag: &str) -> Result<Outcome, &'static str> {
    match tag {
        "win" => Ok(Outcome::Win),
        "lose" => Ok(Outcome::Lose),
        _ => Err("unknown outcome"),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_grant_roundtrip() {
        let msg = SessionGrant {
            session_id: "a1b2c3".to_string(),
            seed: 12345,
            expires_at_ms: 1_700_000_000_000,
            coupon_ids: vec!["coffee-small".to_string(), "coffee-large".to_string()],
        };
        let encoded = msg.encode_to_vec();
        let decoded = SessionGrant::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_play_request_roundtrip() {
        let msg = PlayRequest {
            session_id: "a1b2c3".to_string(),
            angle: 0.2618,
            angle_phi: -0.02,
            power: 0.85,
            timestamp_ms: 1_700_000_000_123,
        };
        let encoded = msg.encode_to_vec();
        let decoded = PlayRequest::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_play_receipt_roundtrip() {
        let msg = PlayReceipt {
            verified: true,
            outcome: "win".to_string(),
            awarded_coupon: Some("coffee-small".to_string()),
            summary: Some(ShotSummary {
                final_position: vec![44.49, 0.0, -0.61],
                total_time: 2.058,
                trajectory_len: 248,
                max_height: 2.47,
                wind: vec![-1.8042, 0.0, -1.33],
                stopped_reason: "hole".to_string(),
            }),
        };
        let encoded = msg.encode_to_vec();
        let decoded = PlayReceipt::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_ball_state_conversion_roundtrip() {
        let state = BallState {
            position: [1.2345, 0.5, -0.25],
            velocity: [10.0, -2.5, 0.125],
            acceleration: [0.0, 0.0, 0.0],
            spin: 0.75,
            time: 1.25,
            rolling: false,
        };
        let proto = BallStateProto::from(&state);
        let back = BallState::try_from(proto).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn test_ball_state_rejects_malformed_vectors() {
        let proto = BallStateProto {
            position: vec![1.0, 2.0],
            velocity: vec![0.0, 0.0, 0.0],
            spin: 0.0,
            time: 0.0,
            rolling: false,
        };
        assert!(BallState::try_from(proto).is_err());
    }

    #[test]
    fn test_shot_record_roundtrip() {
        let msg = ShotRecordProto {
            record_format_version: 1,
            seed: 42,
            angle: 0.2618,
            angle_phi: 0.0,
            power: 0.85,
            tuning_parameters: vec![TuningParameter {
                key: "gravity".to_string(),
                value: 9.81,
            }],
            config_fingerprint: "deadbeef".to_string(),
            outcome: "win".to_string(),
            stopped_reason: "hole".to_string(),
            trajectory_digest: 0xfeed_face_dead_beef,
            trajectory_len: 248,
            final_position: vec![44.49, 0.0, -0.61],
            wind: vec![-1.8042, 0.0, -1.33],
        };
        let encoded = msg.encode_to_vec();
        let decoded = ShotRecordProto::decode(encoded.as_slice()).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_stop_reason("hole"), Ok(StopReason::Hole));
        assert_eq!(parse_stop_reason("friction"), Ok(StopReason::Friction));
        assert!(parse_stop_reason("gopher").is_err());
        assert_eq!(parse_outcome("win"), Ok(Outcome::Win));
        assert_eq!(parse_outcome("lose"), Ok(Outcome::Lose));
        assert!(parse_outcome("draw").is_err());
    }

    #[test]
    fn test_summary_from_result_reports_reason() {
        use fairway_sim::{PhysicsConfig, ShotInput, simulate};
        let result = simulate(
            &ShotInput {
                angle: 0.3,
                angle_phi: 0.0,
                power: 0.5,
                seed: 9,
            },
            &PhysicsConfig::default(),
        )
        .unwrap();
        let summary = ShotSummary::from(&result);
        assert_eq!(summary.trajectory_len as usize, result.trajectory.len());
        assert_eq!(summary.stopped_reason, result.stopped_reason.as_str());
        assert_eq!(summary.final_position.len(), 3);
    }
}
