use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::sync::store::StoreError;

pub const SAVE_FAILED_MESSAGE: &str = "Failed to auto-save resume data.";

/// User-facing notification channel for save failures.
pub trait SaveNotifier: Send + Sync {
    fn save_failed(&self, resume_id: Uuid, error: &StoreError);

    /// Called after a successful write. A previous failure notice no longer
    /// describes the stored state.
    fn save_succeeded(&self, _resume_id: Uuid) {}
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notice {
    pub message: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

/// Logs failures and keeps the latest one until a later save succeeds, so
/// the editor can surface it. `count` is cumulative.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    latest: Mutex<Option<Notice>>,
    count: Mutex<usize>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<Notice> {
        self.latest.lock().ok().and_then(|n| n.clone())
    }

    pub fn count(&self) -> usize {
        self.count.lock().map(|c| *c).unwrap_or(0)
    }
}

impl SaveNotifier for NoticeBoard {
    fn save_failed(&self, resume_id: Uuid, error: &StoreError) {
        tracing::error!("Auto-save failed for resume {resume_id}: {error}");
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(Notice {
                message: SAVE_FAILED_MESSAGE.to_string(),
                detail: error.to_string(),
                at: Utc::now(),
            });
        }
        if let Ok(mut count) = self.count.lock() {
            *count += 1;
        }
    }

    fn save_succeeded(&self, _resume_id: Uuid) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_clears_notice_but_keeps_count() {
        let board = NoticeBoard::new();
        let resume_id = Uuid::new_v4();
        board.save_failed(resume_id, &StoreError::Unavailable("down".to_string()));
        assert_eq!(board.latest().unwrap().message, SAVE_FAILED_MESSAGE);

        board.save_succeeded(resume_id);
        assert!(board.latest().is_none());
        assert_eq!(board.count(), 1);
    }
}
