//! DraftSynchronizer keeps the remote whole-document record eventually
//! consistent with local edits to one resume draft.
//!
//! Protocol:
//! 1. The first observation after creation only records a baseline.
//! 2. Each later, value-different observation restarts a debounce timer.
//! 3. When the timer fires the snapshot is upserted under
//!    `(resume_id, full_document)`; status goes `saving → saved | error`.
//! 4. Failures notify the user and are not retried automatically.
//! 5. Teardown cancels a pending timer. In-flight writes always complete.
//!
//! Writes from one synchronizer pass a FIFO gate, so they commit in firing
//! order. A write still waiting at the gate when a newer timer fires is
//! skipped, since the newer snapshot supersedes it.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::draft::model::ResumeDraft;
use crate::sync::identity::ActorId;
use crate::sync::store::SectionValue;
use crate::sync::{DocumentStore, SaveNotifier, SectionKey, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

struct PendingWrite {
    handle: JoinHandle<()>,
    generation: u64,
    key: SectionKey,
    snapshot: Value,
}

#[derive(Default)]
struct SyncState {
    primed: bool,
    closed: bool,
    /// Snapshot of the most recent scheduled window (or the baseline).
    last_scheduled: Option<Value>,
    last_key: Option<SectionKey>,
    /// Bumped for every scheduled window.
    generation: u64,
    /// Newest generation whose write has been issued.
    fired: u64,
    pending: Option<PendingWrite>,
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn SaveNotifier>,
    state: Mutex<SyncState>,
    status: watch::Sender<SaveStatus>,
    write_gate: tokio::sync::Mutex<()>,
}

pub struct DraftSynchronizer {
    inner: Arc<Inner>,
}

impl DraftSynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn SaveNotifier>) -> Self {
        let (status, _) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                store,
                notifier,
                state: Mutex::new(SyncState::default()),
                status,
                write_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn status(&self) -> SaveStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status.subscribe()
    }

    /// Registers the current snapshot of `draft`. Call after every local
    /// mutation. Never blocks on the network and never fails: without an
    /// actor, or with a nil resume id, it does nothing.
    pub fn observe(
        &self,
        draft: &ResumeDraft,
        resume_id: Uuid,
        actor: Option<ActorId>,
        delay: Duration,
    ) {
        let snapshot = match serde_json::to_value(draft) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Could not serialize draft for resume {resume_id}: {e}");
                return;
            }
        };

        let mut state = self.inner.lock_state();
        if state.closed {
            return;
        }

        if !state.primed {
            state.primed = true;
            state.last_scheduled = Some(snapshot);
            debug!("Baseline recorded for resume {resume_id}");
            return;
        }

        let Some(actor) = actor else {
            return;
        };
        if resume_id.is_nil() {
            return;
        }
        if state.last_scheduled.as_ref() == Some(&snapshot) {
            return;
        }

        if let Some(superseded) = state.pending.take() {
            superseded.handle.abort();
        }

        state.generation += 1;
        let generation = state.generation;
        let key = SectionKey::full_document(resume_id);

        let inner = Arc::clone(&self.inner);
        let task_snapshot = snapshot.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !inner.begin_write(generation) {
                return;
            }
            // Failures are reported through status and notifier.
            let _ = inner.write(key, task_snapshot, generation).await;
        });

        state.pending = Some(PendingWrite {
            handle,
            generation,
            key,
            snapshot: snapshot.clone(),
        });
        state.last_scheduled = Some(snapshot);
        state.last_key = Some(key);
        debug!(
            "Save scheduled for resume {resume_id} by {actor} in {}ms (window {generation})",
            delay.as_millis()
        );
    }

    /// Writes the pending snapshot now instead of waiting for its timer.
    /// After a failed save with nothing pending, re-attempts the last
    /// snapshot. Returns whether a write was issued.
    pub async fn flush(&self) -> Result<bool, StoreError> {
        let (key, snapshot, generation) = {
            let mut state = self.inner.lock_state();
            if state.closed {
                return Ok(false);
            }
            if let Some(pending) = state.pending.take() {
                pending.handle.abort();
                state.fired = pending.generation;
                (pending.key, pending.snapshot, pending.generation)
            } else if self.status() == SaveStatus::Error {
                let (Some(key), Some(snapshot)) = (state.last_key, state.last_scheduled.clone())
                else {
                    return Ok(false);
                };
                state.generation += 1;
                state.fired = state.generation;
                (key, snapshot, state.generation)
            } else {
                return Ok(false);
            }
        };

        self.inner.status.send_replace(SaveStatus::Saving);
        self.inner.write(key, snapshot, generation).await?;
        Ok(true)
    }

    /// Stops the synchronizer. A pending, not yet fired save is dropped.
    pub fn teardown(&self) {
        let mut state = self.inner.lock_state();
        if state.closed {
            return;
        }
        state.closed = true;
        if let Some(pending) = state.pending.take() {
            pending.handle.abort();
            info!(
                "Dropped pending save for resume {} on teardown",
                pending.key.resume_id
            );
        }
    }

    pub fn has_pending(&self) -> bool {
        self.inner.lock_state().pending.is_some()
    }
}

impl Drop for DraftSynchronizer {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims the pending slot for a fired timer. False when the window was
    /// superseded, flushed or torn down in the meantime.
    fn begin_write(&self, generation: u64) -> bool {
        let mut state = self.lock_state();
        if state.closed {
            return false;
        }
        match &state.pending {
            Some(pending) if pending.generation == generation => {}
            _ => return false,
        }
        state.pending = None;
        state.fired = generation;
        drop(state);

        self.status.send_replace(SaveStatus::Saving);
        true
    }

    async fn write(
        &self,
        key: SectionKey,
        snapshot: Value,
        generation: u64,
    ) -> Result<(), StoreError> {
        let _gate = self.write_gate.lock().await;
        if self.lock_state().fired > generation {
            debug!(
                "Skipping superseded save for resume {} (window {generation})",
                key.resume_id
            );
            return Ok(());
        }

        let value = SectionValue {
            content: snapshot,
            updated_at: Utc::now(),
            order_index: 0,
        };
        let result = self.store.upsert(&key, value).await;
        let newest = self.lock_state().fired == generation;

        match &result {
            Ok(()) => {
                info!("Saved resume {} (window {generation})", key.resume_id);
                if newest {
                    self.status.send_replace(SaveStatus::Saved);
                }
                self.notifier.save_succeeded(key.resume_id);
            }
            Err(e) => {
                if newest {
                    self.status.send_replace(SaveStatus::Error);
                }
                self.notifier.save_failed(key.resume_id, e);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::memory::InMemoryDocumentStore;
    use crate::sync::notify::NoticeBoard;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(1000);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup() -> (Arc<InMemoryDocumentStore>, Arc<NoticeBoard>, DraftSynchronizer) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let notices = Arc::new(NoticeBoard::new());
        let sync = DraftSynchronizer::new(store.clone(), notices.clone());
        (store, notices, sync)
    }

    fn named(first_name: &str) -> ResumeDraft {
        let mut draft = ResumeDraft::default();
        draft.personal_details.first_name = first_name.to_string();
        draft
    }

    fn actor() -> Option<ActorId> {
        Some(ActorId(Uuid::new_v4()))
    }

    fn first_name_of(content: &Value) -> &str {
        content["personal_details"]["first_name"].as_str().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_scenario_saves_final_value_once() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        store.set_write_latency(ms(100));

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        assert_eq!(sync.status(), SaveStatus::Idle);

        for prefix in ["A", "Ad", "Ada", "Adam", "Adams"] {
            sync.observe(&named(prefix), resume_id, actor, DELAY);
            sleep(ms(60)).await;
        }
        assert_eq!(store.upsert_count(), 0);
        assert_eq!(sync.status(), SaveStatus::Idle);

        // Last observation at t=240; the window closes at t=1240.
        sleep(ms(1000)).await;
        assert_eq!(sync.status(), SaveStatus::Saving);
        assert_eq!(store.upsert_count(), 1);

        sleep(ms(100)).await;
        assert_eq!(sync.status(), SaveStatus::Saved);
        assert_eq!(store.upsert_count(), 1);

        let record = store.record(&SectionKey::full_document(resume_id)).unwrap();
        assert_eq!(first_name_of(&record.content), "Adams");
        assert_eq!(record.order_index, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_observation_schedules_nothing() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let hydrated = named("Grace");

        sync.observe(&hydrated, resume_id, actor(), DELAY);
        sync.observe(&hydrated, resume_id, actor(), DELAY);
        sleep(DELAY * 3).await;

        assert_eq!(store.upsert_count(), 0);
        assert_eq!(sync.status(), SaveStatus::Idle);
        assert!(!sync.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_snapshot_is_not_rewritten() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Linus"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;
        assert_eq!(store.upsert_count(), 1);

        // Echoed back as a fresh, value-equal object.
        sync.observe(&named("Linus"), resume_id, actor, DELAY);
        sync.observe(&named("Linus"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;
        assert_eq!(store.upsert_count(), 1);
        assert_eq!(sync.status(), SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverting_within_window_still_saves_latest() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("A"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;
        sync.observe(&named("B"), resume_id, actor, DELAY);
        sync.observe(&named("A"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(first_name_of(&history[1].content), "A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_observe_touches_nothing() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();

        sync.observe(&ResumeDraft::default(), resume_id, None, DELAY);
        for name in ["x", "xy", "xyz"] {
            sync.observe(&named(name), resume_id, None, DELAY);
        }
        sleep(DELAY * 3).await;

        assert_eq!(store.upsert_count(), 0);
        assert_eq!(store.get_count(), 0);
        assert_eq!(sync.status(), SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nil_resume_id_is_ignored() {
        let (store, _, sync) = setup();
        sync.observe(&ResumeDraft::default(), Uuid::nil(), actor(), DELAY);
        sync.observe(&named("Ken"), Uuid::nil(), actor(), DELAY);
        sleep(DELAY * 2).await;
        assert_eq!(store.upsert_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_write() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Barbara"), resume_id, actor, DELAY);
        sleep(ms(500)).await;
        sync.teardown();
        sleep(DELAY * 3).await;

        assert_eq!(store.upsert_count(), 0);

        // Further observations after teardown are inert.
        sync.observe(&named("Liskov"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;
        assert_eq!(store.upsert_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_write() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        sync.observe(&ResumeDraft::default(), resume_id, actor(), DELAY);
        sync.observe(&named("Dennis"), resume_id, actor(), DELAY);
        drop(sync);
        sleep(DELAY * 2).await;
        assert_eq!(store.upsert_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_does_not_cancel_in_flight_write() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        store.set_write_latency(ms(500));

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Edsger"), resume_id, actor, DELAY);
        sleep(DELAY + ms(10)).await;
        assert_eq!(store.upsert_count(), 1);
        sync.teardown();
        sleep(DELAY).await;

        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_sets_error_and_does_not_retry() {
        let (store, notices, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        store.set_fail_writes(true);

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Barbara"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;

        assert_eq!(sync.status(), SaveStatus::Error);
        assert_eq!(notices.count(), 1);
        assert!(notices.latest().is_some());

        sleep(DELAY * 10).await;
        assert_eq!(store.upsert_count(), 1);

        // The next edit re-attempts with the latest snapshot.
        store.set_fail_writes(false);
        sync.observe(&named("Barbara L"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;
        assert_eq!(sync.status(), SaveStatus::Saved);
        let record = store.record(&SectionKey::full_document(resume_id)).unwrap();
        assert_eq!(first_name_of(&record.content), "Barbara L");
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_commit_in_firing_order() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        let key = SectionKey::full_document(resume_id);
        store.set_write_latency(ms(2000));

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("first"), resume_id, actor, DELAY);
        // First write in flight from t=1000 to t=3000.
        sleep(DELAY + ms(10)).await;
        sync.observe(&named("second"), resume_id, actor, DELAY);

        // Second timer fires at t=2010 and waits behind the first write.
        sleep(ms(2990)).await;
        assert_eq!(sync.status(), SaveStatus::Saving);
        assert_eq!(first_name_of(&store.record(&key).unwrap().content), "first");

        sleep(ms(2000)).await;
        assert_eq!(sync.status(), SaveStatus::Saved);
        let names: Vec<_> = store
            .history()
            .iter()
            .map(|r| first_name_of(&r.content).to_string())
            .collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_write_is_superseded_by_newer_window() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        store.set_write_latency(ms(5000));

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("a"), resume_id, actor, DELAY);
        sleep(DELAY + ms(10)).await; // "a" writing until t=6000
        sync.observe(&named("b"), resume_id, actor, DELAY);
        sleep(DELAY + ms(10)).await; // "b" fired at t=2010, queued
        sync.observe(&named("c"), resume_id, actor, DELAY);
        sleep(ms(20_000)).await;

        let names: Vec<_> = store
            .history()
            .iter()
            .map(|r| first_name_of(&r.content).to_string())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(store.upsert_count(), 2);
        assert_eq!(sync.status(), SaveStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_pending_snapshot_immediately() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();

        assert!(!sync.flush().await.unwrap());

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Margaret"), resume_id, actor, DELAY);
        assert!(sync.flush().await.unwrap());
        assert_eq!(store.upsert_count(), 1);
        assert_eq!(sync.status(), SaveStatus::Saved);

        sleep(DELAY * 2).await;
        assert_eq!(store.upsert_count(), 1);
        assert!(!sync.flush().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_retries_after_failure() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        store.set_fail_writes(true);

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Frances"), resume_id, actor, DELAY);
        sleep(DELAY * 2).await;
        assert_eq!(sync.status(), SaveStatus::Error);

        store.set_fail_writes(false);
        assert!(sync.flush().await.unwrap());
        assert_eq!(sync.status(), SaveStatus::Saved);
        assert_eq!(store.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_subscription_sees_saving_then_saved() {
        let (store, _, sync) = setup();
        let resume_id = Uuid::new_v4();
        let actor = actor();
        store.set_write_latency(ms(50));
        let mut rx = sync.subscribe();

        sync.observe(&ResumeDraft::default(), resume_id, actor, DELAY);
        sync.observe(&named("Alan"), resume_id, actor, DELAY);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SaveStatus::Saving);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SaveStatus::Saved);
    }
}
