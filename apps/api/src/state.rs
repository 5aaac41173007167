use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::{ApiKey, CompletionService};
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable completion backend. Default: `LlmClient` against the configured endpoint.
    pub llm: Arc<dyn CompletionService>,
    pub config: Config,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(llm: Arc<dyn CompletionService>, config: Config) -> Self {
        let sessions = SessionStore::new(config.max_sessions);
        Self {
            llm,
            config,
            sessions,
        }
    }

    /// The stored secret wins; otherwise whatever the user typed, if anything.
    pub fn resolve_credential(&self, supplied: Option<&str>) -> Option<ApiKey> {
        ApiKey::resolve(self.config.openai_api_key.as_deref(), supplied)
    }
}
