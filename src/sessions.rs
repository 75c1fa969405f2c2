use crate::api::ChurnSource;
use crate::detail_loader::DetailLoader;
use crate::errors::AppError;
use crate::list_loader::ListLoader;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

pub const SESSION_HEADER: &str = "x-session-id";
const MAX_SESSION_ID_LEN: usize = 128;

/// Loader state owned by a single browser session.
pub struct Session<S> {
    pub customers: ListLoader<S>,
    pub detail: DetailLoader<S>,
}

struct Entry<S> {
    session: Arc<Session<S>>,
    last_seen: Instant,
}

/// Sessions keyed by the id the page sends in `x-session-id`. Entries idle
/// longer than `idle_timeout` are swept whenever the map is touched.
pub struct SessionRegistry<S> {
    source: Arc<S>,
    idle_timeout: Duration,
    sessions: Mutex<HashMap<String, Entry<S>>>,
}

impl<S: ChurnSource> SessionRegistry<S> {
    pub fn new(source: Arc<S>, idle_timeout: Duration) -> Self {
        Self {
            source,
            idle_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the session for `id`, creating it on first use.
    pub async fn session(&self, id: &str) -> Arc<Session<S>> {
        self.session_at(id, Instant::now()).await
    }

    async fn session_at(&self, id: &str, now: Instant) -> Arc<Session<S>> {
        let mut sessions = self.sessions.lock().await;
        evict_idle(&mut sessions, now, self.idle_timeout);

        let entry = sessions.entry(id.to_string()).or_insert_with(|| {
            info!(session = id, "session started");
            Entry {
                session: Arc::new(Session {
                    customers: ListLoader::new(Arc::clone(&self.source)),
                    detail: DetailLoader::new(Arc::clone(&self.source)),
                }),
                last_seen: now,
            }
        });
        entry.last_seen = now;
        Arc::clone(&entry.session)
    }

    /// Drops the session. Requests still running against it finish on their
    /// own copy and are not observed again.
    pub async fn end(&self, id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id).is_some();
        if removed {
            info!(session = id, "session ended");
        }
        removed
    }
}

fn evict_idle<S>(sessions: &mut HashMap<String, Entry<S>>, now: Instant, idle: Duration) {
    let before = sessions.len();
    sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) < idle);
    let evicted = before - sessions.len();
    if evicted > 0 {
        debug!(evicted, "evicted idle sessions");
    }
}

pub fn session_id(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= MAX_SESSION_ID_LEN)
        .map(str::to_string)
        .ok_or_else(|| AppError::bad_request("missing or invalid x-session-id header"))
}
