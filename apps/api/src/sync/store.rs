//! The keyed record store the synchronizer writes to.
//!
//! One logical resume maps to exactly one row, keyed by
//! `(resume_id, section_type)` with the section type fixed to
//! [`SectionType::FullDocument`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::ResumeSectionRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Pool exhaustion and shutdown are reported as the store being
    /// unavailable rather than as query failures.
    fn from_sqlx(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(e.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    FullDocument,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::FullDocument => "full_document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionKey {
    pub resume_id: Uuid,
    pub section_type: SectionType,
}

impl SectionKey {
    pub fn full_document(resume_id: Uuid) -> Self {
        Self {
            resume_id,
            section_type: SectionType::FullDocument,
        }
    }
}

/// The value half of an upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionValue {
    pub content: Value,
    pub updated_at: DateTime<Utc>,
    /// Placeholder ordering index, always 0 for the whole-document bucket.
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub resume_id: Uuid,
    pub section_type: SectionType,
    pub content: Value,
    pub order_index: i32,
    pub updated_at: DateTime<Utc>,
}

impl PersistedRecord {
    pub fn new(key: SectionKey, value: SectionValue) -> Self {
        Self {
            resume_id: key.resume_id,
            section_type: key.section_type,
            content: value.content,
            order_index: value.order_index,
            updated_at: value.updated_at,
        }
    }
}

/// Keyed record store. `upsert` is insert-or-replace on key conflict, so it
/// is idempotent and safe when the row does not exist yet.
///
/// Carried as `Arc<dyn DocumentStore>` so tests can swap in the in-memory
/// store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, key: &SectionKey) -> Result<Option<PersistedRecord>, StoreError>;

    async fn upsert(&self, key: &SectionKey, value: SectionValue) -> Result<(), StoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, key: &SectionKey) -> Result<Option<PersistedRecord>, StoreError> {
        let row: Option<ResumeSectionRow> = sqlx::query_as(
            r#"
            SELECT resume_id, section_type, content, order_index, updated_at
            FROM resume_sections
            WHERE resume_id = $1 AND section_type = $2
            "#,
        )
        .bind(key.resume_id)
        .bind(key.section_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(row.map(|row| PersistedRecord {
            resume_id: row.resume_id,
            section_type: key.section_type,
            content: row.content,
            order_index: row.order_index,
            updated_at: row.updated_at,
        }))
    }

    async fn upsert(&self, key: &SectionKey, value: SectionValue) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO resume_sections (resume_id, section_type, content, order_index, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (resume_id, section_type) DO UPDATE
            SET content = EXCLUDED.content,
                order_index = EXCLUDED.order_index,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key.resume_id)
        .bind(key.section_type.as_str())
        .bind(&value.content)
        .bind(value.order_index)
        .bind(value.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(())
    }
}
