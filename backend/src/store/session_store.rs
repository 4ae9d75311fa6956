use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;
use shared::DetectionOutcome;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub created_at: DateTime<Utc>,
    pub frames_analyzed: u64,
    pub last_result: Option<DetectionOutcome>,
}

/// Tracks live webcam streams. Sessions are never expired; like the
/// analysis store this is process-lifetime state only.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one analyzed frame, creating the session when the id is
    /// missing or unknown. The increment happens under a single write-lock
    /// acquisition, so concurrent frames on one session cannot lose counts.
    /// Returns the session id and the updated cumulative frame count.
    pub async fn touch(
        &self,
        session_id: Option<Uuid>,
        outcome: DetectionOutcome,
    ) -> (Uuid, u64) {
        let id = session_id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(id).or_insert_with(|| {
            debug!("Starting webcam session {}", id);
            SessionState {
                created_at: Utc::now(),
                frames_analyzed: 0,
                last_result: None,
            }
        });
        session.frames_analyzed += 1;
        session.last_result = Some(outcome);
        (id, session.frames_analyzed)
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionState> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
