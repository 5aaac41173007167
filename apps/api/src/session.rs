//! In-memory review sessions.
//!
//! A session ties one extracted resume to its most recent rewrite so the
//! download endpoint can serve the unparsed text later. Process lifetime only.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::extract::PlainResumeText;

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub file_name: String,
    pub resume_text: PlainResumeText,
    pub created_at: DateTime<Utc>,
    pub last_rewrite: Option<String>,
}

/// Bounded session map; the oldest session is evicted when full.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    capacity: usize,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Stores a freshly extracted resume and returns its session.
    pub async fn create(&self, file_name: &str, resume_text: PlainResumeText) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            resume_text,
            created_at: Utc::now(),
            last_rewrite: None,
        };

        let mut sessions = self.inner.write().await;
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .values()
                .min_by_key(|s| s.created_at)
                .map(|s| s.id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!("Evicted session {id}");
                }
                None => break,
            }
        }
        sessions.insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Records the unparsed rewrite. Returns false if the session is gone.
    pub async fn record_rewrite(&self, id: Uuid, rewritten: &str) -> bool {
        match self.inner.write().await.get_mut(&id) {
            Some(session) => {
                session.last_rewrite = Some(rewritten.to_string());
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
