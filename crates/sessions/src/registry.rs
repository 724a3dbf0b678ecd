use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, Instant},
};

use {
    tokio::sync::{Mutex as AsyncMutex, MutexGuard},
    tracing::{debug, error, info},
};

use mantle_assistant::{AssistantBackend, ThreadId};

use crate::error::{Error, Result};

/// Owned map of conversation identifier → session.
///
/// All session records live here for the process lifetime; callers only
/// reach session state through [`Session::begin`], which serializes the
/// whole reply pipeline per identifier.
pub struct SessionRegistry {
    idle_threshold: Duration,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(idle_threshold: Duration) -> Self {
        Self {
            idle_threshold,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return the session for `identifier`, creating a cold one if absent.
    pub fn resolve(&self, identifier: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().unwrap().get(identifier) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().unwrap();
        Arc::clone(sessions.entry(identifier.to_string()).or_insert_with(|| {
            debug!(identifier, "creating cold session");
            Arc::new(Session::new(identifier))
        }))
    }

    /// Record activity for `identifier`, creating its session if absent.
    /// Called for every inbound event, whether or not a reply follows.
    pub fn touch(&self, identifier: &str) {
        self.resolve(identifier).touch_now();
    }

    /// Evict every session idle longer than the configured threshold.
    ///
    /// Runs opportunistically (once per inbound event) rather than on a
    /// timer. Sessions whose pipeline is in flight are skipped: the handle
    /// being created right now must not be swept out from under the caller.
    pub fn sweep_expired(&self) {
        let evicted = self.sweep_expired_at(Instant::now());
        if evicted > 0 {
            debug!(evicted, remaining = self.len(), "swept idle sessions");
        }
    }

    fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|identifier, session| {
            if session.state.try_lock().is_err() {
                return true;
            }
            let idle = now.saturating_duration_since(session.last_active_at());
            if idle > self.idle_threshold {
                debug!(identifier, idle_secs = idle.as_secs(), "evicting idle session");
                false
            } else {
                true
            }
        });
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One conversation session. Cold until [`SessionGuard::ensure_thread`]
/// stores a backend thread handle; the handle is then never replaced.
pub struct Session {
    identifier: String,
    last_active: Mutex<Instant>,
    state: AsyncMutex<SessionState>,
}

#[derive(Default)]
struct SessionState {
    thread: Option<ThreadId>,
}

impl Session {
    fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            last_active: Mutex::new(Instant::now()),
            state: AsyncMutex::new(SessionState::default()),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn touch_now(&self) {
        *self.last_active.lock().unwrap() = Instant::now();
    }

    fn last_active_at(&self) -> Instant {
        *self.last_active.lock().unwrap()
    }

    /// Enter the session's reply pipeline.
    ///
    /// The returned guard is the only path to thread state, so two
    /// concurrent events for the same identifier cannot race on thread
    /// creation or interleave their pipelines.
    pub async fn begin(&self) -> SessionGuard<'_> {
        SessionGuard {
            session: self,
            state: self.state.lock().await,
        }
    }
}

/// Exclusive hold on a session for the duration of one reply pipeline.
pub struct SessionGuard<'a> {
    session: &'a Session,
    state: MutexGuard<'a, SessionState>,
}

impl SessionGuard<'_> {
    pub fn thread(&self) -> Option<&ThreadId> {
        self.state.thread.as_ref()
    }

    /// Return the session's thread handle, creating it on the backend when
    /// the session is cold.
    ///
    /// The external creation call happens at most once per session: once a
    /// handle is stored it is only ever read back. On failure the session
    /// stays cold and a later message retries creation.
    pub async fn ensure_thread(&mut self, backend: &dyn AssistantBackend) -> Result<ThreadId> {
        if let Some(thread) = &self.state.thread {
            return Ok(thread.clone());
        }

        let identifier = self.session.identifier();
        match backend.create_thread().await {
            Ok(thread) => {
                info!(identifier, thread = %thread, "created backend thread for session");
                self.state.thread = Some(thread.clone());
                Ok(thread)
            },
            Err(source) => {
                error!(identifier, error = %source, "backend thread creation failed");
                Err(Error::ThreadCreation {
                    identifier: identifier.to_string(),
                    source,
                })
            },
        }
    }
}
