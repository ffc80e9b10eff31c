//! Application State

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use mindflow_core::{GenerationOptions, ModelGateway, ModelProvider};
use mindflow_tutor::{ResourceLookup, TutorSession};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Model provider (Gemini, or a fake in tests)
    pub provider: Arc<dyn ModelProvider>,

    /// Crisis-resource resolver for safety escalation
    pub resources: Arc<dyn ResourceLookup>,

    /// Generation options applied to every gateway call
    pub options: GenerationOptions,

    /// Live sessions. The per-session mutex serializes calls: at most one
    /// operation runs against a `LearningState` at a time.
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<TutorSession>>>>>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        resources: Arc<dyn ResourceLookup>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            provider,
            resources,
            options,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a fresh tutor session bound to the caller's IP hint.
    pub fn build_session(&self, user_ip: Option<String>) -> TutorSession {
        let gateway = ModelGateway::new(self.provider.clone(), self.options.clone());
        TutorSession::new(gateway, self.resources.clone(), user_ip)
    }

    /// Register a new session and return its identifier.
    pub async fn create_session(&self, user_ip: Option<String>) -> Uuid {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(self.build_session(user_ip)));
        self.sessions.write().await.insert(id, session);
        id
    }

    /// Look up a live session by identifier.
    pub async fn session(&self, id: Uuid) -> Option<Arc<Mutex<TutorSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }
}
