//! One open resume: the owned draft plus its synchronizer.
//!
//! The draft is mutated only through [`EditorSession::apply`], which hands
//! the fresh snapshot to the synchronizer after every edit.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::draft::{DraftEditor, EditError, ResumeDraft};
use crate::sync::notify::Notice;
use crate::sync::{
    DocumentStore, DraftSynchronizer, IdentityProvider, NoticeBoard, SaveStatus, SectionKey,
    StoreError,
};

pub struct EditorSession {
    resume_id: Uuid,
    editor: Mutex<DraftEditor>,
    sync: DraftSynchronizer,
    notices: Arc<NoticeBoard>,
    delay: Duration,
    last_active: Mutex<Instant>,
}

impl EditorSession {
    /// Hydrates the draft from the store and primes the synchronizer with
    /// it. A failed or malformed load is logged and the session starts from
    /// an empty draft.
    pub async fn open(
        resume_id: Uuid,
        store: Arc<dyn DocumentStore>,
        identity: &dyn IdentityProvider,
        delay: Duration,
    ) -> Self {
        let editor = DraftEditor::new(hydrate(store.as_ref(), resume_id).await);
        let notices = Arc::new(NoticeBoard::new());
        let sync = DraftSynchronizer::new(store, notices.clone());
        sync.observe(editor.draft(), resume_id, identity.current_actor(), delay);

        Self {
            resume_id,
            editor: Mutex::new(editor),
            sync,
            notices,
            delay,
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn resume_id(&self) -> Uuid {
        self.resume_id
    }

    pub fn snapshot(&self) -> ResumeDraft {
        self.lock_editor().draft().clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.sync.status()
    }

    /// The most recent save-failure notice, if any.
    pub fn latest_notice(&self) -> Option<Notice> {
        self.notices.latest()
    }

    pub fn failed_saves(&self) -> usize {
        self.notices.count()
    }

    /// Runs one edit against the draft and registers the result for saving.
    /// Without an actor the draft still changes locally but nothing is sent.
    pub fn apply<T>(
        &self,
        identity: &dyn IdentityProvider,
        edit: impl FnOnce(&mut DraftEditor) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        self.touch();
        let mut editor = self.lock_editor();
        let out = edit(&mut editor)?;
        self.sync.observe(
            editor.draft(),
            self.resume_id,
            identity.current_actor(),
            self.delay,
        );
        Ok(out)
    }

    /// Marks the session as in use, postponing idle eviction.
    pub fn touch(&self) {
        *self.lock_last_active() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.lock_last_active().elapsed()
    }

    /// Saves any pending edit immediately.
    pub async fn save_now(&self) -> Result<bool, StoreError> {
        self.sync.flush().await
    }

    pub fn close(&self) {
        self.sync.teardown();
        info!("Editor session closed for resume {}", self.resume_id);
    }

    fn lock_editor(&self) -> MutexGuard<'_, DraftEditor> {
        self.editor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_last_active(&self) -> MutexGuard<'_, Instant> {
        self.last_active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn hydrate(store: &dyn DocumentStore, resume_id: Uuid) -> ResumeDraft {
    match store.get(&SectionKey::full_document(resume_id)).await {
        Ok(Some(record)) => match serde_json::from_value::<ResumeDraft>(record.content) {
            Ok(draft) => draft,
            Err(e) => {
                warn!("Stored draft for resume {resume_id} is malformed, starting empty: {e}");
                ResumeDraft::default()
            }
        },
        Ok(None) => ResumeDraft::default(),
        Err(e) => {
            warn!("Failed to load resume {resume_id}, starting empty: {e}");
            ResumeDraft::default()
        }
    }
}
