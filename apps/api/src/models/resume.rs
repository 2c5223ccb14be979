use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub template_name: String,
    pub theme_config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row per `(resume_id, section_type)`. The editor only ever writes the
/// `full_document` bucket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeSectionRow {
    pub resume_id: Uuid,
    pub section_type: String,
    pub content: Value,
    pub order_index: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeExportRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub file_name: String,
    pub format: String,
    pub s3_key: String,
    pub created_at: DateTime<Utc>,
}
