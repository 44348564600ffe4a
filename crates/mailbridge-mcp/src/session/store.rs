//! Registry of live protocol sessions keyed by server-generated id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Mutex};

use crate::auth::AuthContext;
use crate::types::{GatewayError, GatewayResult, JsonRpcMessage};

/// Attempts at drawing an unused id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// Session-HTTP sessions with no request for this long are dropped.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// How often the idle sweep runs.
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Produces candidate session ids.
pub type IdSource = Box<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    EventStream,
    SessionHttp,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::EventStream => write!(f, "event-stream"),
            TransportKind::SessionHttp => write!(f, "session-http"),
        }
    }
}

/// The live channel a session answers through.
pub enum TransportHandle {
    /// Feeds the session worker; responses leave on the worker's SSE stream.
    EventStream {
        inbound: mpsc::Sender<JsonRpcMessage>,
    },
    /// Requests are answered inline; the lane keeps them in dispatch order.
    SessionHttp {
        lane: Mutex<()>,
        liveness: watch::Sender<bool>,
    },
}

impl TransportHandle {
    pub fn event_stream(inbound: mpsc::Sender<JsonRpcMessage>) -> Self {
        TransportHandle::EventStream { inbound }
    }

    pub fn session_http() -> Self {
        let (liveness, _) = watch::channel(true);
        TransportHandle::SessionHttp {
            lane: Mutex::new(()),
            liveness,
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            TransportHandle::EventStream { .. } => TransportKind::EventStream,
            TransportHandle::SessionHttp { .. } => TransportKind::SessionHttp,
        }
    }
}

/// One client's protocol session. Only the activity stamp changes after creation.
pub struct Session {
    id: String,
    handle: TransportHandle,
    auth: AuthContext,
    created_at: DateTime<Utc>,
    last_active: parking_lot::Mutex<Instant>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TransportKind {
        self.handle.kind()
    }

    pub fn handle(&self) -> &TransportHandle {
        &self.handle
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Record client activity.
    pub fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }

    fn idle_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_active.lock())
    }

    /// Liveness of a session-HTTP session; `None` for event-stream sessions.
    pub fn subscribe_liveness(&self) -> Option<watch::Receiver<bool>> {
        match &self.handle {
            TransportHandle::SessionHttp { liveness, .. } => Some(liveness.subscribe()),
            TransportHandle::EventStream { .. } => None,
        }
    }

    /// Signal termination to anything watching this session.
    fn close(&self) {
        if let TransportHandle::SessionHttp { liveness, .. } = &self.handle {
            liveness.send_replace(false);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Process-wide session table.
///
/// The lock is synchronous and never held across an `.await`, so sessions can
/// be removed from `Drop` guards.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    id_source: IdSource,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_id_source(Box::new(|| uuid::Uuid::new_v4().to_string()))
    }

    pub fn with_id_source(id_source: IdSource) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            id_source,
        }
    }

    /// Register a new session under a fresh id.
    pub fn create(&self, handle: TransportHandle, auth: AuthContext) -> GatewayResult<Arc<Session>> {
        let mut sessions = self.sessions.write();

        let id = (0..MAX_ID_ATTEMPTS)
            .map(|_| (self.id_source)())
            .find(|id| {
                let taken = sessions.contains_key(id);
                if taken {
                    tracing::warn!("Session id collision on {id}, drawing again");
                }
                !taken
            })
            .ok_or_else(|| {
                GatewayError::InternalError("could not allocate a unique session id".to_string())
            })?;

        let session = Arc::new(Session {
            id: id.clone(),
            handle,
            auth,
            created_at: Utc::now(),
            last_active: parking_lot::Mutex::new(Instant::now()),
        });
        sessions.insert(id, session.clone());
        tracing::debug!(
            session_id = %session.id,
            kind = %session.kind(),
            "Session registered"
        );
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        let removed = self.sessions.write().remove(id);
        if let Some(session) = &removed {
            session.close();
            tracing::debug!(session_id = %id, kind = %session.kind(), "Session removed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Remove session-HTTP sessions idle for longer than `max_idle`.
    /// Event-stream sessions end with their stream and are left alone.
    pub fn expire_idle(&self, max_idle: Duration) -> usize {
        self.expire_idle_at(Instant::now(), max_idle)
    }

    fn expire_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let expired: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<String> = sessions
                .values()
                .filter(|s| s.kind() == TransportKind::SessionHttp && s.idle_at(now) > max_idle)
                .map(|s| s.id.clone())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };
        for session in &expired {
            session.close();
            tracing::info!(session_id = %session.id, "Session-HTTP session expired after inactivity");
        }
        expired.len()
    }

    /// Drop every session; used on shutdown.
    pub fn clear(&self) {
        let drained: Vec<Arc<Session>> = self.sessions.write().drain().map(|(_, s)| s).collect();
        for session in &drained {
            session.close();
        }
        if !drained.is_empty() {
            tracing::info!("Closed {} session(s)", drained.len());
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
