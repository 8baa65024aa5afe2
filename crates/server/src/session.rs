//! Session store for the server edge.
//!
//! Sessions live in an explicitly owned `SessionStore` that is constructed
//! once at process start and passed by reference to request handlers, with no
//! process-wide globals. All mutation happens under a single mutex, which is
//! what upholds the one invariant that matters here: two concurrent play
//! requests against the same session must not both observe `used == false`.
//!
//! The store never reads a clock; every operation takes `now_ms` explicitly,
//! the same isolation discipline the simulation core applies to time.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::guard::{GuardConfig, PlayError, check_play};

/// Session identifier, opaque to clients.
pub type SessionId = String;

/// Server-side state of one promotional shot session.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub session_id: SessionId,
    /// Identifier of the creating client (IP or equivalent).
    pub client_id: String,
    /// Seed for the deterministic wind draw; fixed at creation.
    pub seed: u32,
    /// Coupons this session is eligible to win.
    pub coupon_ids: Vec<String>,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
    /// Flips to true at most once, on the first accepted play.
    pub used: bool,
    pub play_count: u32,
    pub last_play_ms: Option<u64>,
}

impl GameSession {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Session creation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Per-client live-session limit reached.
    TooManySessions { client_id: String },
    /// Session id collision (practically unreachable with random ids).
    DuplicateSessionId,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManySessions { .. } => {
                write!(f, "Too many active sessions from this IP")
            }
            Self::DuplicateSessionId => write!(f, "Session id already exists"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Data handed back by a successful claim: everything the play handler needs
/// after the lock is released.
#[derive(Debug, Clone)]
pub struct ClaimedPlay {
    pub seed: u32,
    pub client_id: String,
    pub coupon_ids: Vec<String>,
}

struct StoreInner {
    sessions: HashMap<SessionId, GameSession>,
    /// Rejected-request count per client id, for escalation.
    suspicion: HashMap<String, u32>,
}

/// Concurrency-safe owner of all live sessions.
pub struct SessionStore {
    inner: Mutex<StoreInner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                suspicion: HashMap::new(),
            }),
        }
    }

    // A poisoned lock only means another thread panicked mid-request; the
    // store itself stays coherent, so recover rather than propagate.
    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Insert a freshly created session, enforcing the per-client limit on
    /// live (non-expired) sessions.
    pub fn create(
        &self,
        session: GameSession,
        max_per_client: usize,
        now_ms: u64,
    ) -> Result<(), SessionError> {
        let mut inner = self.lock();

        if inner.sessions.contains_key(&session.session_id) {
            return Err(SessionError::DuplicateSessionId);
        }

        let live = inner
            .sessions
            .values()
            .filter(|s| s.client_id == session.client_id && !s.is_expired(now_ms))
            .count();
        if live >= max_per_client {
            return Err(SessionError::TooManySessions {
                client_id: session.client_id.clone(),
            });
        }

        inner.sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    /// Atomically run the replay-guard checks and claim the session.
    ///
    /// On success the session is marked used and its play accounting updated
    /// before the lock is released, so a concurrent request for the same
    /// session observes `used == true` and loses the race. Rejections bump
    /// the owning client's suspicion counter.
    pub fn claim_play(
        &self,
        session_id: &str,
        timestamp_ms: u64,
        now_ms: u64,
        guard: &GuardConfig,
    ) -> Result<ClaimedPlay, PlayError> {
        let mut inner = self.lock();

        let Some(session) = inner.sessions.get_mut(session_id) else {
            return Err(PlayError::UnknownSession);
        };

        if let Err(err) = check_play(session, timestamp_ms, now_ms, guard) {
            let client_id = session.client_id.clone();
            *inner.suspicion.entry(client_id).or_insert(0) += 1;
            return Err(err);
        }

        session.used = true;
        session.play_count += 1;
        session.last_play_ms = Some(now_ms);

        Ok(ClaimedPlay {
            seed: session.seed,
            client_id: session.client_id.clone(),
            coupon_ids: session.coupon_ids.clone(),
        })
    }

    /// Remove sessions past their expiry. Idempotent; returns the number of
    /// sessions purged.
    pub fn purge_expired(&self, now_ms: u64) -> usize {
        let mut inner = self.lock();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| !s.is_expired(now_ms));
        before - inner.sessions.len()
    }

    /// Number of stored sessions (live and not yet purged).
    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one session, for inspection and tests.
    pub fn get(&self, session_id: &str) -> Option<GameSession> {
        self.lock().sessions.get(session_id).cloned()
    }

    /// Rejected-request count recorded against a client id.
    pub fn suspicion(&self, client_id: &str) -> u32 {
        self.lock().suspicion.get(client_id).copied().unwrap_or(0)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, client: &str, now_ms: u64) -> GameSession {
        GameSession {
            session_id: id.to_string(),
            client_id: client.to_string(),
            seed: 42,
            coupon_ids: vec!["coffee".to_string()],
            created_at_ms: now_ms,
            expires_at_ms: now_ms + 600_000,
            used: false,
            play_count: 0,
            last_play_ms: None,
        }
    }

    const NOW: u64 = 1_700_000_000_000;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new();
        store.create(session("s1", "ip1", NOW), 5, NOW).unwrap();
        let s = store.get("s1").unwrap();
        assert!(!s.used);
        assert_eq!(s.seed, 42);
    }

    #[test]
    fn test_per_client_limit() {
        let store = SessionStore::new();
        for i in 0..3 {
            store
                .create(session(&format!("s{i}"), "ip1", NOW), 3, NOW)
                .unwrap();
        }
        let err = store.create(session("s3", "ip1", NOW), 3, NOW).unwrap_err();
        assert!(matches!(err, SessionError::TooManySessions { .. }));
        assert_eq!(err.to_string(), "Too many active sessions from this IP");

        // A different client is unaffected.
        store.create(session("s4", "ip2", NOW), 3, NOW).unwrap();
    }

    #[test]
    fn test_expired_sessions_free_the_limit() {
        let store = SessionStore::new();
        let mut s = session("s1", "ip1", NOW);
        s.expires_at_ms = NOW + 10;
        store.create(s, 1, NOW).unwrap();

        // Still live: blocked.
        assert!(store.create(session("s2", "ip1", NOW), 1, NOW).is_err());
        // Past expiry: allowed even before the sweep runs.
        store
            .create(session("s2", "ip1", NOW + 20), 1, NOW + 20)
            .unwrap();
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = SessionStore::new();
        store.create(session("s1", "ip1", NOW), 5, NOW).unwrap();
        assert_eq!(
            store.create(session("s1", "ip2", NOW), 5, NOW),
            Err(SessionError::DuplicateSessionId)
        );
    }

    #[test]
    fn test_claim_marks_used_once() {
        let store = SessionStore::new();
        store.create(session("s1", "ip1", NOW), 5, NOW).unwrap();
        let guard = GuardConfig::default();

        let claimed = store.claim_play("s1", NOW, NOW, &guard).unwrap();
        assert_eq!(claimed.seed, 42);
        assert_eq!(claimed.coupon_ids, vec!["coffee".to_string()]);

        let s = store.get("s1").unwrap();
        assert!(s.used);
        assert_eq!(s.play_count, 1);

        // Second claim loses: session already used.
        let err = store
            .claim_play("s1", NOW + 5000, NOW + 5000, &guard)
            .unwrap_err();
        assert_eq!(err, PlayError::AlreadyUsed);
    }

    #[test]
    fn test_claim_unknown_session() {
        let store = SessionStore::new();
        assert_eq!(
            store
                .claim_play("nope", NOW, NOW, &GuardConfig::default())
                .unwrap_err(),
            PlayError::UnknownSession
        );
    }

    #[test]
    fn test_rejections_accumulate_suspicion() {
        let store = SessionStore::new();
        store.create(session("s1", "ip1", NOW), 5, NOW).unwrap();
        let guard = GuardConfig::default();

        // Stale timestamp, rejected.
        let _ = store.claim_play("s1", NOW - 120_000, NOW, &guard);
        let _ = store.claim_play("s1", NOW - 120_000, NOW, &guard);
        assert_eq!(store.suspicion("ip1"), 2);
        // Unknown sessions have no client to charge.
        let _ = store.claim_play("ghost", NOW, NOW, &guard);
        assert_eq!(store.suspicion("ip1"), 2);
    }

    #[test]
    fn test_purge_expired_is_idempotent() {
        let store = SessionStore::new();
        let mut s = session("s1", "ip1", NOW);
        s.expires_at_ms = NOW + 100;
        store.create(s, 5, NOW).unwrap();
        store.create(session("s2", "ip1", NOW), 5, NOW).unwrap();

        assert_eq!(store.purge_expired(NOW + 200), 1);
        assert_eq!(store.purge_expired(NOW + 200), 0);
        assert_eq!(store.len(), 1);
        assert!(store.get("s1").is_none());
        assert!(store.get("s2").is_some());
    }

    #[test]
    fn test_concurrent_claims_single_winner() {
        use std::sync::Arc;

        let store = Arc::new(SessionStore::new());
        store.create(session("s1", "ip1", NOW), 5, NOW).unwrap();
        let guard = GuardConfig::default();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let guard = guard.clone();
            handles.push(std::thread::spawn(move || {
                store.claim_play("s1", NOW, NOW, &guard).is_ok()
            }));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(store.get("s1").unwrap().play_count, 1);
    }
}
