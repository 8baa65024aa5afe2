//! Fairway Server Edge
//!
//! The server edge mediates between promotional clients and the simulation
//! core. It owns:
//! - Session issuance and the per-client session limit
//! - The replay/abuse guard on play requests
//! - The authoritative re-simulation of every shot
//! - Coupon awards and shot-record capture for offline audit
//!
//! # Architecture
//!
//! The simulation core never sees a clock, a socket, or a session; the edge
//! performs all of that on its behalf and invokes `fairway_sim::simulate`
//! with nothing but a `ShotInput` and a `PhysicsConfig`. Whatever the client
//! previewed locally is advisory; the receipt reflects only what the server
//! simulated itself.

#![deny(unsafe_code)]

pub mod guard;
pub mod session;

use std::sync::Mutex;

use fairway_replay::ShotRecord;
use fairway_sim::{PhysicsConfig, ShotInput, SimulateError, Outcome, simulate, validate};
use fairway_wire::{PlayReceipt, PlayRequest, SessionGrant, ShotSummary};
use guard::{GuardConfig, PlayError};
use session::{GameSession, SessionError, SessionStore};

// ============================================================================
// Server Configuration
// ============================================================================

/// Everything the edge needs to run: physics tuning, guard limits, and the
/// coupon pool offered to new sessions.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub physics: PhysicsConfig,
    pub guard: GuardConfig,
    /// Coupons granted to each new session, in award-priority order.
    pub default_coupons: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            guard: GuardConfig::default(),
            default_coupons: vec!["coffee-regular".to_string()],
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// The promotional shot server.
///
/// All methods take `now_ms` explicitly so tests control time; a production
/// caller passes wall-clock milliseconds.
pub struct Server {
    config: ServerConfig,
    store: SessionStore,
    /// Shot records captured since the last drain, oldest first.
    records: Mutex<Vec<ShotRecord>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            store: SessionStore::new(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a session for `client_id` with a random seed.
    pub fn create_session(
        &self,
        client_id: &str,
        now_ms: u64,
    ) -> Result<SessionGrant, SessionError> {
        self.create_session_with_seed(client_id, rand::random::<u32>(), now_ms)
    }

    /// Create a session with a caller-chosen seed. Production uses the random
    /// variant; this one exists so tests and reconciliation tools can pin the
    /// wind draw.
    pub fn create_session_with_seed(
        &self,
        client_id: &str,
        seed: u32,
        now_ms: u64,
    ) -> Result<SessionGrant, SessionError> {
        let session_id = format!(
            "{:016x}{:016x}",
            rand::random::<u64>(),
            rand::random::<u64>()
        );
        let expires_at_ms = now_ms + self.config.guard.session_ttl_ms;

        let session = GameSession {
            session_id: session_id.clone(),
            client_id: client_id.to_string(),
            seed,
            coupon_ids: self.config.default_coupons.clone(),
            created_at_ms: now_ms,
            expires_at_ms,
            used: false,
            play_count: 0,
            last_play_ms: None,
        };
        self.store
            .create(session, self.config.guard.max_sessions_per_client, now_ms)?;

        log::info!("session created: id={session_id} client={client_id} seed={seed}");

        Ok(SessionGrant {
            session_id,
            seed,
            expires_at_ms,
            coupon_ids: self.config.default_coupons.clone(),
        })
    }

    /// Handle one play request end to end: validate, claim, simulate, award.
    ///
    /// Shot parameters are validated before the session is touched, so a
    /// malformed request never consumes the player's single attempt. Once the
    /// claim succeeds the session is spent regardless of outcome.
    pub fn play(&self, request: &PlayRequest, now_ms: u64) -> Result<PlayReceipt, PlayError> {
        let input = ShotInput {
            angle: request.angle,
            angle_phi: request.angle_phi,
            power: request.power,
            seed: 0, // replaced with the session seed after the claim
        };

        let report = validate(&input);
        if !report.is_valid {
            log::warn!(
                "play rejected: session={} invalid shot: {}",
                request.session_id,
                report.errors.join("; ")
            );
            return Err(PlayError::InvalidShot(report.errors));
        }
        for warning in &report.warnings {
            log::warn!("play warning: session={} {warning}", request.session_id);
        }

        let claimed = self.store.claim_play(
            &request.session_id,
            request.timestamp_ms,
            now_ms,
            &self.config.guard,
        )?;

        let input = ShotInput {
            seed: claimed.seed,
            ..input
        };
        let result = match simulate(&input, &self.config.physics) {
            Ok(result) => result,
            // Unreachable after the validate() above, but the session is
            // already spent, so surface the errors rather than panic.
            Err(SimulateError::InvalidInput(errors)) => {
                return Err(PlayError::InvalidShot(errors));
            }
        };

        let awarded_coupon = match result.outcome {
            Outcome::Win => claimed.coupon_ids.first().cloned(),
            Outcome::Lose => None,
        };

        log::info!(
            "play resolved: session={} client={} outcome={} reason={} coupon={:?}",
            request.session_id,
            claimed.client_id,
            result.outcome.as_str(),
            result.stopped_reason.as_str(),
            awarded_coupon
        );

        let record = ShotRecord::from_simulation(&input, &self.config.physics, &result);
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(record);

        Ok(PlayReceipt {
            verified: true,
            outcome: result.outcome.as_str().to_string(),
            awarded_coupon,
            summary: Some(ShotSummary::from(&result)),
        })
    }

    /// Purge expired sessions; returns how many were removed. Run this
    /// periodically from the host process.
    pub fn sweep(&self, now_ms: u64) -> usize {
        let purged = self.store.purge_expired(now_ms);
        if purged > 0 {
            log::info!("session sweep: purged={purged}");
        }
        purged
    }

    /// Take all shot records captured so far, leaving the buffer empty. The
    /// host process persists these for offline verification.
    pub fn drain_records(&self) -> Vec<ShotRecord> {
        std::mem::take(
            &mut *self
                .records
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
