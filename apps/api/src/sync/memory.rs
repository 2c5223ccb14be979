use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::sync::store::{DocumentStore, PersistedRecord, SectionKey, SectionValue, StoreError};

/// In-process store used by the test suites. Counts calls and can be told
/// to fail writes or to hold each write for a simulated latency.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    records: Mutex<HashMap<SectionKey, PersistedRecord>>,
    history: Mutex<Vec<PersistedRecord>>,
    gets: AtomicUsize,
    upserts: AtomicUsize,
    fail_writes: AtomicBool,
    write_latency: Mutex<Duration>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PersistedRecord) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(
            SectionKey {
                resume_id: record.resume_id,
                section_type: record.section_type,
            },
            record,
        );
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_write_latency(&self, latency: Duration) {
        *self.write_latency.lock().unwrap() = latency;
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn row_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn record(&self, key: &SectionKey) -> Option<PersistedRecord> {
        self.records.lock().unwrap().get(key).cloned()
    }

    /// Every successful write, in commit order.
    pub fn history(&self) -> Vec<PersistedRecord> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &SectionKey) -> Result<Option<PersistedRecord>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.record(key))
    }

    async fn upsert(&self, key: &SectionKey, value: SectionValue) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);

        let latency = *self.write_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".to_string()));
        }

        let record = PersistedRecord::new(*key, value);
        self.records.lock().unwrap().insert(*key, record.clone());
        self.history.lock().unwrap().push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = InMemoryDocumentStore::new();
        let key = SectionKey::full_document(Uuid::new_v4());
        let value = SectionValue {
            content: json!({ "personal_details": { "first_name": "Ada" } }),
            updated_at: Utc::now(),
            order_index: 0,
        };

        store.upsert(&key, value.clone()).await.unwrap();
        store.upsert(&key, value.clone()).await.unwrap();

        assert_eq!(store.row_count(), 1);
        assert_eq!(store.get(&key).await.unwrap().unwrap().content, value.content);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = InMemoryDocumentStore::new();
        let key = SectionKey::full_document(Uuid::new_v4());
        for name in ["A", "B"] {
            store
                .upsert(
                    &key,
                    SectionValue {
                        content: json!({ "name": name }),
                        updated_at: Utc::now(),
                        order_index: 0,
                    },
                )
                .await
                .unwrap();
        }
        assert_eq!(store.row_count(), 1);
        assert_eq!(store.record(&key).unwrap().content, json!({ "name": "B" }));
    }

    #[tokio::test]
    async fn test_missing_key_is_absent() {
        let store = InMemoryDocumentStore::new();
        let key = SectionKey::full_document(Uuid::new_v4());
        assert!(store.get(&key).await.unwrap().is_none());
        assert_eq!(store.get_count(), 1);
    }
}
