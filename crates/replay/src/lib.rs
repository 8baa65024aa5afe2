//! Fairway Shot Records
//!
//! This crate turns a completed simulation into a durable `ShotRecord` and
//! verifies records by re-running the deterministic simulation, which is the
//! anti-cheat pipeline. A record that a client (or an attacker) claims is a
//! win must reproduce bit-for-bit from `(seed, angle, angle_phi, power)`
//! under the configured physics, or verification fails with a specific
//! mismatch error.
//!
//! # Components
//!
//! - `ShotRecord`: native record + Protobuf conversion
//! - `config_fingerprint`: SHA-256 over the canonical tuning parameters, so
//!   records verified under a different physics config fail fast
//! - `verify_shot`: re-simulation and field-by-field comparison
//! - `write_record` / `read_record`: file persistence of the encoded record

#![deny(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use fairway_sim::{PhysicsConfig, ShotInput, SimulationResult, simulate};
use fairway_wire::{ShotRecordProto, TuningParameter};
use prost::Message;
use sha2::{Digest, Sha256};

/// Shot record schema version.
pub const RECORD_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Config Fingerprint
// ============================================================================

/// SHA-256 fingerprint of a physics configuration.
///
/// Canonical encoding: one `key=bits\n` line per tuning parameter in sorted
/// key order, with the f64 value rendered as its exact bit pattern in hex.
/// Rendering bits rather than decimal text makes the fingerprint exact.
pub fn config_fingerprint(cfg: &PhysicsConfig) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in cfg.tuning_parameters() {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(format!("{:016x}", value.to_bits()).as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// Shot Record
// ============================================================================

/// Durable record of one verified shot.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotRecord {
    pub record_format_version: u32,
    pub seed: u32,
    pub angle: f64,
    pub angle_phi: f64,
    pub power: f64,
    pub tuning_parameters: Vec<(String, f64)>,
    pub config_fingerprint: String,
    pub outcome: String,
    pub stopped_reason: String,
    pub trajectory_digest: u64,
    pub trajectory_len: u32,
    pub final_position: [f64; 3],
    pub wind: [f64; 3],
}

impl ShotRecord {
    /// Build a record from a completed simulation.
    pub fn from_simulation(
        input: &ShotInput,
        cfg: &PhysicsConfig,
        result: &SimulationResult,
    ) -> Self {
        Self {
            record_format_version: RECORD_FORMAT_VERSION,
            seed: input.seed,
            angle: input.angle,
            angle_phi: input.angle_phi,
            power: input.power,
            tuning_parameters: cfg
                .tuning_parameters()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            config_fingerprint: config_fingerprint(cfg),
            outcome: result.outcome.as_str().to_string(),
            stopped_reason: result.stopped_reason.as_str().to_string(),
            trajectory_digest: result.trajectory_digest(),
            trajectory_len: result.trajectory.len() as u32,
            final_position: result.final_position,
            wind: result.wind,
        }
    }

    /// The shot input this record claims to describe.
    pub fn shot_input(&self) -> ShotInput {
        ShotInput {
            angle: self.angle,
            angle_phi: self.angle_phi,
            power: self.power,
            seed: self.seed,
        }
    }
}

impl From<ShotRecord> for ShotRecordProto {
    fn from(record: ShotRecord) -> Self {
        Self {
            record_format_version: record.record_format_version,
            seed: record.seed,
            angle: record.angle,
            angle_phi: record.angle_phi,
            power: record.power,
            tuning_parameters: record
                .tuning_parameters
                .into_iter()
                .map(|(key, value)| TuningParameter { key, value })
                .collect(),
            config_fingerprint: record.config_fingerprint,
            outcome: record.outcome,
            stopped_reason: record.stopped_reason,
            trajectory_digest: record.trajectory_digest,
            trajectory_len: record.trajectory_len,
            final_position: record.final_position.to_vec(),
            wind: record.wind.to_vec(),
        }
    }
}

impl TryFrom<ShotRecordProto> for ShotRecord {
    type Error = &'static str;

    fn try_from(proto: ShotRecordProto) -> Result<Self, Self::Error> {
        if proto.final_position.len() != 3 {
            return Err("final_position must have exactly 3 elements");
        }
        if proto.wind.len() != 3 {
            return Err("wind must have exactly 3 elements");
        }
        Ok(Self {
            record_format_version: proto.record_format_version,
            seed: proto.seed,
            angle: proto.angle,
            angle_phi: proto.angle_phi,
            power: proto.power,
            tuning_parameters: proto
                .tuning_parameters
                .into_iter()
                .map(|p| (p.key, p.value))
                .collect(),
            config_fingerprint: proto.config_fingerprint,
            outcome: proto.outcome,
            stopped_reason: proto.stopped_reason,
            trajectory_digest: proto.trajectory_digest,
            trajectory_len: proto.trajectory_len,
            final_position: [
                proto.final_position[0],
                proto.final_position[1],
                proto.final_position[2],
            ],
            wind: [proto.wind[0], proto.wind[1], proto.wind[2]],
        })
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Shot verification error.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    /// Record schema version not understood.
    UnsupportedFormatVersion { version: u32 },
    /// Record was produced under a different physics configuration.
    ConfigFingerprintMismatch { expected: String, actual: String },
    /// Recorded input no longer passes validation.
    InvalidInput { errors: Vec<String> },
    /// Re-simulated trajectory digest differs from the recorded one.
    TrajectoryDigestMismatch { expected: u64, actual: u64 },
    /// Re-simulated trajectory length differs.
    TrajectoryLengthMismatch { expected: u32, actual: u32 },
    /// Re-simulated outcome differs.
    OutcomeMismatch { expected: String, actual: String },
    /// Re-simulated stop reason differs.
    StopReasonMismatch { expected: String, actual: String },
    /// Re-simulated final position differs.
    FinalPositionMismatch {
        expected: [f64; 3],
        actual: [f64; 3],
    },
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormatVersion { version } => {
                write!(f, "Unsupported shot record format version {version}")
            }
            Self::ConfigFingerprintMismatch { expected, actual } => {
                write!(
                    f,
                    "Config fingerprint mismatch: record {expected}, current {actual}"
                )
            }
            Self::InvalidInput { errors } => {
                write!(f, "Recorded input is invalid: {}", errors.join("; "))
            }
            Self::TrajectoryDigestMismatch { expected, actual } => {
                write!(
                    f,
                    "Trajectory digest mismatch: expected {expected:#x}, got {actual:#x}"
                )
            }
            Self::TrajectoryLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Trajectory length mismatch: expected {expected}, got {actual}"
                )
            }
            Self::OutcomeMismatch { expected, actual } => {
                write!(f, "Outcome mismatch: expected {expected}, got {actual}")
            }
            Self::StopReasonMismatch { expected, actual } => {
                write!(f, "Stop reason mismatch: expected {expected}, got {actual}")
            }
            Self::FinalPositionMismatch { expected, actual } => {
                write!(
                    f,
                    "Final position mismatch: expected {expected:?}, got {actual:?}"
                )
            }
        }
    }
}

impl std::error::Error for VerifyError {}

/// Verify a shot record by re-running the deterministic simulation.
///
/// # Verification Steps
/// 1. Format version is supported.
/// 2. Config fingerprint matches the supplied physics config.
/// 3. Recorded input still passes validation.
/// 4. Re-simulate with the recorded seed and input.
/// 5. Compare trajectory digest, trajectory length, outcome, stop reason and
///    final position, all exact.
pub fn verify_shot(record: &ShotRecord, cfg: &PhysicsConfig) -> Result<(), VerifyError> {
    if record.record_format_version != RECORD_FORMAT_VERSION {
        return Err(VerifyError::UnsupportedFormatVersion {
            version: record.record_format_version,
        });
    }

    let actual_fingerprint = config_fingerprint(cfg);
    if record.config_fingerprint != actual_fingerprint {
        return Err(VerifyError::ConfigFingerprintMismatch {
            expected: record.config_fingerprint.clone(),
            actual: actual_fingerprint,
        });
    }

    let result = simulate(&record.shot_input(), cfg).map_err(|err| match err {
        fairway_sim::SimulateError::InvalidInput(errors) => VerifyError::InvalidInput { errors },
    })?;

    let actual_digest = result.trajectory_digest();
    if actual_digest != record.trajectory_digest {
        return Err(VerifyError::TrajectoryDigestMismatch {
            expected: record.trajectory_digest,
            actual: actual_digest,
        });
    }

    let actual_len = result.trajectory.len() as u32;
    if actual_len != record.trajectory_len {
        return Err(VerifyError::TrajectoryLengthMismatch {
            expected: record.trajectory_len,
            actual: actual_len,
        });
    }

    if result.outcome.as_str() != record.outcome {
        return Err(VerifyError::OutcomeMismatch {
            expected: record.outcome.clone(),
            actual: result.outcome.as_str().to_string(),
        });
    }

    if result.stopped_reason.as_str() != record.stopped_reason {
        return Err(VerifyError::StopReasonMismatch {
            expected: record.stopped_reason.clone(),
            actual: result.stopped_reason.as_str().to_string(),
        });
    }

    if result.final_position != record.final_position {
        return Err(VerifyError::FinalPositionMismatch {
            expected: record.final_position,
            actual: result.final_position,
        });
    }

    Ok(())
}

// ============================================================================
// Record I/O
// ============================================================================

/// Write a shot record to a file.
pub fn write_record(record: &ShotRecord, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("Shot record already exists at {}", path.display()),
        ));
    }

    let proto: ShotRecordProto = record.clone().into();
    let encoded = proto.encode_to_vec();
    let mut file = fs::File::create(path)?;
    file.write_all(&encoded)?;

    Ok(())
}

/// Read a shot record from a file.
pub fn read_record(path: &Path) -> io::Result<ShotRecord> {
    let data = fs::read(path)?;
    let proto = ShotRecordProto::decode(data.as_slice()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to decode shot record: {e}"),
        )
    })?;
    proto
        .try_into()
        .map_err(|e: &str| io::Error::new(io::ErrorKind::InvalidData, e))
}

// ============================================================================
// Tests
// ============================================================================
