//! In-memory map from browser session id to [`Session`].
//!
//! Each session sits behind its own `tokio::sync::Mutex`; a handler keeps
//! the guard for the whole turn (model call included), so one session
//! never has two requests in flight while other sessions proceed
//! independently. Nothing is persisted.
//!
//! Every lookup stamps the entry; [`spawn_idle_sweeper`] drops sessions
//! that nobody has looked up for the configured idle period.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use super::Session;

/// Opaque browser session identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Upper bound on the time between two idle sweeps.
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

struct Entry {
    session: SharedSession,
    last_seen: StdMutex<Instant>,
}

impl Entry {
    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen.lock().unwrap_or_else(PoisonError::into_inner).elapsed()
    }

    /// A handler still holds a clone of the session.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.session) > 1
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Entry>>,
    system_template: Arc<str>,
}

impl SessionRegistry {
    /// Sessions created here build their persona from `system_template`.
    pub fn new(system_template: impl Into<Arc<str>>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            system_template: system_template.into(),
        }
    }

    /// Start a new empty session and return its id.
    pub fn create(&self) -> SessionId {
        let id = SessionId::new();
        let entry = Entry {
            session: Arc::new(Mutex::new(Session::new(self.system_template.clone()))),
            last_seen: StdMutex::new(Instant::now()),
        };
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, entry);
        debug!(session_id = %id, "session created");
        id
    }

    /// Look up a session and mark it as recently used.
    pub fn get(&self, id: &SessionId) -> Option<SharedSession> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get(id)?;
        entry.touch();
        Some(entry.session.clone())
    }

    /// Look up by the raw string form used in URLs.
    pub fn get_str(&self, raw: &str) -> Option<(SessionId, SharedSession)> {
        let id = raw.parse::<SessionId>().ok()?;
        self.get(&id).map(|s| (id, s))
    }

    /// End a session. Returns `false` when the id was unknown.
    pub fn remove(&self, id: &SessionId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            debug!(session_id = %id, "session ended");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions not looked up for at least `idle`. Sessions a
    /// handler is still using are kept. Returns how many were dropped.
    pub fn sweep_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep = entry.in_use() || entry.idle_for() < idle;
            if !keep {
                debug!(session_id = %id, "idle session dropped");
            }
            keep
        });
        before - sessions.len()
    }
}

/// Spawn a background task that runs [`SessionRegistry::sweep_idle`]
/// periodically. The task stops when `shutdown` is cancelled.
pub fn spawn_idle_sweeper(
    registry: Arc<SessionRegistry>,
    idle: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let period = idle.min(MAX_SWEEP_PERIOD).max(Duration::from_secs(1));
    tokio::spawn(async move {
        info!(idle_secs = idle.as_secs(), "idle session sweeper started");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume the first (immediate) tick
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let dropped = registry.sweep_idle(idle);
                    if dropped > 0 {
                        info!(dropped, remaining = registry.len(), "idle sessions dropped");
                    }
                }
            }
        }
        debug!("idle session sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::DEFAULT_SYSTEM_TEMPLATE;

    #[tokio::test]
    async fn create_get_remove() {
        let reg = SessionRegistry::new(DEFAULT_SYSTEM_TEMPLATE);
        assert!(reg.is_empty());

        let id = reg.create();
        assert_eq!(reg.len(), 1);
        let session = reg.get(&id).expect("session exists");
        assert!(!session.lock().await.is_started());

        assert!(reg.remove(&id));
        assert!(!reg.remove(&id));
        assert!(reg.get(&id).is_none());
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let reg = SessionRegistry::new(DEFAULT_SYSTEM_TEMPLATE);
        let a = reg.create();
        let b = reg.create();
        assert_ne!(a, b);

        reg.get(&a).unwrap().lock().await.initialize(Some("SQL"), Some("3")).unwrap();
        assert!(reg.get(&a).unwrap().lock().await.is_started());
        assert!(!reg.get(&b).unwrap().lock().await.is_started());
    }

    #[test]
    fn get_str_rejects_garbage_and_unknown_ids() {
        let reg = SessionRegistry::new(DEFAULT_SYSTEM_TEMPLATE);
        let id = reg.create();
        assert!(reg.get_str("not-a-uuid").is_none());
        assert!(reg.get_str(&SessionId::new().to_string()).is_none());
        let (found, _) = reg.get_str(&id.to_string()).unwrap();
        assert_eq!(found, id);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_swept() {
        let reg = SessionRegistry::new(DEFAULT_SYSTEM_TEMPLATE);
        let stale = reg.create();
        let fresh = reg.create();

        tokio::time::advance(Duration::from_secs(50)).await;
        reg.get(&fresh).unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(reg.sweep_idle(Duration::from_secs(60)), 1);
        assert!(reg.get(&stale).is_none());
        assert!(reg.get(&fresh).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_in_use_are_not_swept() {
        let reg = SessionRegistry::new(DEFAULT_SYSTEM_TEMPLATE);
        let id = reg.create();
        let held = reg.get(&id).unwrap();

        tokio::time::advance(Duration::from_secs(600)).await;
        assert_eq!(reg.sweep_idle(Duration::from_secs(60)), 0);

        drop(held);
        assert_eq!(reg.sweep_idle(Duration::from_secs(60)), 1);
        assert!(reg.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_abandoned_sessions_until_shutdown() {
        let reg = Arc::new(SessionRegistry::new(DEFAULT_SYSTEM_TEMPLATE));
        for _ in 0..3 {
            reg.create();
        }
        let shutdown = CancellationToken::new();
        let task = spawn_idle_sweeper(reg.clone(), Duration::from_secs(30), shutdown.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(reg.is_empty());

        shutdown.cancel();
        task.await.unwrap();
    }

    #[test]
    fn id_round_trips_through_display() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
    }
}
