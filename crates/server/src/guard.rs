//! Replay and abuse guard for incoming play requests.
//!
//! The checks here are pure functions over session state and two clocks: the
//! client-supplied request timestamp and the server's own `now_ms`. Keeping
//! them free of the store lets the ordering be tested exhaustively without a
//! `SessionStore` in hand.

use crate::session::GameSession;

/// Tunable limits for the play guard.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Maximum skew tolerated between the request timestamp and server time,
    /// in either direction.
    pub timestamp_window_ms: u64,
    /// Minimum gap between two accepted plays from the same session.
    pub min_play_spacing_ms: u64,
    /// Live-session cap per client id.
    pub max_sessions_per_client: usize,
    /// Lifetime of a session from creation to expiry.
    pub session_ttl_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timestamp_window_ms: 60_000,
            min_play_spacing_ms: 1_000,
            max_sessions_per_client: 5,
            session_ttl_ms: 600_000,
        }
    }
}

/// Why a play request was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    UnknownSession,
    Expired,
    AlreadyUsed,
    TimestampOutsideWindow,
    BurstDetected,
    /// Shot parameters failed validation; carries the individual messages.
    InvalidShot(Vec<String>),
}

impl std::fmt::Display for PlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSession => write!(f, "Session not found"),
            Self::Expired => write!(f, "Session expired"),
            Self::AlreadyUsed => write!(f, "Session already used"),
            Self::TimestampOutsideWindow => {
                write!(f, "Timestamp outside acceptable window")
            }
            Self::BurstDetected => write!(f, "Too many plays in short time window"),
            Self::InvalidShot(errors) => {
                write!(f, "Invalid shot parameters: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for PlayError {}

/// Check a play request against a session without mutating anything.
///
/// Checks run in a fixed order and the first failure wins: expiry, single
/// use, timestamp window, burst spacing. The timestamp window is symmetric,
/// so both stale and future-dated requests are rejected.
pub fn check_play(
    session: &GameSession,
    timestamp_ms: u64,
    now_ms: u64,
    config: &GuardConfig,
) -> Result<(), PlayError> {
    if session.is_expired(now_ms) {
        return Err(PlayError::Expired);
    }
    if session.used {
        return Err(PlayError::AlreadyUsed);
    }

    let skew = now_ms.abs_diff(timestamp_ms);
    if skew > config.timestamp_window_ms {
        return Err(PlayError::TimestampOutsideWindow);
    }

    if let Some(last) = session.last_play_ms {
        if now_ms.saturating_sub(last) < config.min_play_spacing_ms {
            return Err(PlayError::BurstDetected);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000_000;

    fn fresh_session() -> GameSession {
        GameSession {
            session_id: "s1".to_string(),
            client_id: "ip1".to_string(),
            seed: 7,
            coupon_ids: vec![],
            created_at_ms: NOW,
            expires_at_ms: NOW + 600_000,
            used: false,
            play_count: 0,
            last_play_ms: None,
        }
    }

    #[test]
    fn test_fresh_session_passes() {
        let cfg = GuardConfig::default();
        assert!(check_play(&fresh_session(), NOW, NOW, &cfg).is_ok());
    }

    #[test]
    fn test_expired_rejected() {
        let cfg = GuardConfig::default();
        let s = fresh_session();
        let later = s.expires_at_ms;
        assert_eq!(check_play(&s, later, later, &cfg), Err(PlayError::Expired));
    }

    #[test]
    fn test_used_rejected() {
        let cfg = GuardConfig::default();
        let mut s = fresh_session();
        s.used = true;
        assert_eq!(check_play(&s, NOW, NOW, &cfg), Err(PlayError::AlreadyUsed));
        assert_eq!(
            PlayError::AlreadyUsed.to_string(),
            "Session already used"
        );
    }

    #[test]
    fn test_expiry_checked_before_used() {
        // An expired session that was also used reports expiry.
        let cfg = GuardConfig::default();
        let mut s = fresh_session();
        s.used = true;
        let later = s.expires_at_ms + 1;
        assert_eq!(check_play(&s, later, later, &cfg), Err(PlayError::Expired));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let cfg = GuardConfig::default();
        let s = fresh_session();
        assert_eq!(
            check_play(&s, NOW - 60_001, NOW, &cfg),
            Err(PlayError::TimestampOutsideWindow)
        );
        // Exactly on the window edge is accepted.
        assert!(check_play(&s, NOW - 60_000, NOW, &cfg).is_ok());
    }

    #[test]
    fn test_future_timestamp_rejected() {
        let cfg = GuardConfig::default();
        let s = fresh_session();
        assert_eq!(
            check_play(&s, NOW + 60_001, NOW, &cfg),
            Err(PlayError::TimestampOutsideWindow)
        );
        assert!(check_play(&s, NOW + 60_000, NOW, &cfg).is_ok());
    }

    #[test]
    fn test_burst_rejected() {
        let cfg = GuardConfig::default();
        let mut s = fresh_session();
        s.last_play_ms = Some(NOW - 500);
        assert_eq!(check_play(&s, NOW, NOW, &cfg), Err(PlayError::BurstDetected));

        // A full spacing interval later, the session would pass the burst
        // check (it still fails single-use if it was actually played).
        s.last_play_ms = Some(NOW - 1_000);
        assert!(check_play(&s, NOW, NOW, &cfg).is_ok());
    }
}
