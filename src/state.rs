use crate::api::ApiClient;
use crate::preferences::{JsonFilePreferences, PreferenceStore};
use crate::sessions::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

pub struct AppState<P = JsonFilePreferences> {
    pub api: Arc<ApiClient>,
    pub sessions: Arc<SessionRegistry<ApiClient>>,
    pub preferences: Arc<P>,
}

impl<P: PreferenceStore> AppState<P> {
    pub fn new(api: ApiClient, preferences: P) -> Self {
        Self::with_session_idle(api, preferences, DEFAULT_SESSION_IDLE)
    }

    pub fn with_session_idle(api: ApiClient, preferences: P, idle_timeout: Duration) -> Self {
        let api = Arc::new(api);
        Self {
            sessions: Arc::new(SessionRegistry::new(Arc::clone(&api), idle_timeout)),
            api,
            preferences: Arc::new(preferences),
        }
    }
}

impl<P> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            sessions: Arc::clone(&self.sessions),
            preferences: Arc::clone(&self.preferences),
        }
    }
}
