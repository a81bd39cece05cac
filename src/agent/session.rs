//! Session management
//!
//! Binds caller-visible session ids to long-lived agents so memory carries
//! across runs. Bindings are in-memory only; `end_session` discards them.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::agent::runner::Agent;
use crate::core::Config;

/// Factory producing a fresh agent for a new session
pub type AgentFactory = Box<dyn Fn() -> Agent + Send + Sync>;

/// Maps session ids to their agents
pub struct SessionManager {
    factory: AgentFactory,
    sessions: Mutex<HashMap<String, Arc<Mutex<Agent>>>>,
}

impl SessionManager {
    /// Create a manager whose sessions are built from the given config
    pub fn from_config(config: Config) -> Self {
        Self::with_factory(Box::new(move || Agent::from_config(config.clone())))
    }

    /// Create a manager with a custom agent factory
    pub fn with_factory(factory: AgentFactory) -> Self {
        Self {
            factory,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Get an existing session or create a new one
    ///
    /// Returns the session id (generated when none is supplied) and the
    /// agent. Each agent is behind its own lock, so concurrent sessions
    /// never contend with each other.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> (String, Arc<Mutex<Agent>>) {
        let mut sessions = self.sessions.lock().await;

        if let Some(id) = session_id {
            if let Some(agent) = sessions.get(id) {
                return (id.to_string(), Arc::clone(agent));
            }
        }

        let id = session_id
            .map(|s| s.to_string())
            .unwrap_or_else(new_session_id);
        let agent = Arc::new(Mutex::new((self.factory)()));
        sessions.insert(id.clone(), Arc::clone(&agent));
        (id, agent)
    }

    /// Discard a session binding; returns whether it existed
    pub async fn end_session(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Check if no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

/// Generate a random session id
fn new_session_id() -> String {
    format!(
        "{:016x}{:016x}",
        rand::random::<u64>(),
        rand::random::<u64>()
    )
}
