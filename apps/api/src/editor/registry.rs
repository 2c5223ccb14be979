use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::editor::session::EditorSession;

/// Open editor sessions, at most one per resume on this instance.
///
/// Clients close sessions with `DELETE .../session`. Sessions that are
/// abandoned instead are saved and evicted by [`SessionRegistry::spawn_sweeper`]
/// once idle for the configured timeout.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Arc<EditorSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a session and marks it active.
    pub fn get(&self, resume_id: Uuid) -> Option<Arc<EditorSession>> {
        let session = self.lock().get(&resume_id).cloned();
        if let Some(session) = &session {
            session.touch();
        }
        session
    }

    /// Registers `session` unless one is already open for the same resume,
    /// in which case the existing session wins and the new one is torn down.
    pub fn insert(&self, session: EditorSession) -> Arc<EditorSession> {
        let mut sessions = self.lock();
        if let Some(existing) = sessions.get(&session.resume_id()) {
            session.close();
            return Arc::clone(existing);
        }
        let session = Arc::new(session);
        sessions.insert(session.resume_id(), Arc::clone(&session));
        session
    }

    pub fn remove(&self, resume_id: Uuid) -> Option<Arc<EditorSession>> {
        let removed = self.lock().remove(&resume_id);
        if let Some(session) = &removed {
            session.close();
        }
        removed
    }

    /// Saves and closes every session idle for at least `max_idle`. A
    /// session whose save fails stays open so its edits are not lost.
    /// Returns how many sessions were evicted.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let idle: Vec<Arc<EditorSession>> = self
            .lock()
            .values()
            .filter(|s| s.idle_for() >= max_idle)
            .cloned()
            .collect();

        let mut evicted = 0;
        for session in idle {
            let resume_id = session.resume_id();
            if let Err(e) = session.save_now().await {
                warn!("Keeping idle session for resume {resume_id}, save failed: {e}");
                continue;
            }
            let removed = {
                let mut sessions = self.lock();
                let current = sessions
                    .get(&resume_id)
                    .is_some_and(|s| Arc::ptr_eq(s, &session));
                if current && session.idle_for() >= max_idle {
                    sessions.remove(&resume_id)
                } else {
                    None
                }
            };
            if let Some(session) = removed {
                session.close();
                evicted += 1;
            }
        }
        evicted
    }

    /// Runs [`SessionRegistry::evict_idle`] periodically in the background.
    pub fn spawn_sweeper(&self, max_idle: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = (max_idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(max_idle).await;
                if evicted > 0 {
                    info!("Evicted {evicted} idle editor session(s)");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<EditorSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
