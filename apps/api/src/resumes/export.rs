//! Export bookkeeping. Document generation happens client-side; the server
//! keeps a JSON snapshot of what was exported and a row per export.

use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::draft::ResumeDraft;
use crate::errors::AppError;
use crate::models::resume::ResumeExportRow;
use crate::sync::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

/// `"{first name without whitespace, lowercased}_resume.{ext}"`, falling
/// back to `user` when no first name is set.
pub fn export_file_name(first_name: &str, format: ExportFormat) -> String {
    let safe: String = first_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    let safe = if safe.is_empty() { "user".to_string() } else { safe };
    format!("{safe}_resume.{}", format.extension())
}

pub fn export_s3_key(user_id: Uuid, export_id: Uuid) -> String {
    format!("exports/{user_id}/{export_id}.json")
}

/// Uploads the exported snapshot and records the export.
pub async fn record_export(
    pool: &PgPool,
    s3: &aws_sdk_s3::Client,
    s3_bucket: &str,
    actor: ActorId,
    resume_id: Uuid,
    format: ExportFormat,
    draft: &ResumeDraft,
) -> Result<ResumeExportRow, AppError> {
    let export_id = Uuid::new_v4();
    let s3_key = export_s3_key(actor.0, export_id);
    let file_name = export_file_name(&draft.personal_details.first_name, format);

    let body = serde_json::to_vec_pretty(draft).map_err(|e| AppError::Internal(e.into()))?;
    s3.put_object()
        .bucket(s3_bucket)
        .key(&s3_key)
        .body(ByteStream::from(body))
        .content_type("application/json")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Snapshot upload failed: {e}")))?;

    info!("Uploaded export snapshot to s3://{}/{}", s3_bucket, s3_key);

    let row = sqlx::query_as::<_, ResumeExportRow>(
        r#"
        INSERT INTO resume_exports (id, user_id, resume_id, file_name, format, s3_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(export_id)
    .bind(actor.0)
    .bind(resume_id)
    .bind(&file_name)
    .bind(format.extension())
    .bind(&s3_key)
    .fetch_one(pool)
    .await?;

    info!("Recorded {} export {export_id} for resume {resume_id}", format.extension());
    Ok(row)
}

/// The actor's exports, newest first.
pub async fn list_exports(pool: &PgPool, actor: ActorId) -> Result<Vec<ResumeExportRow>, AppError> {
    Ok(sqlx::query_as::<_, ResumeExportRow>(
        "SELECT * FROM resume_exports WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(actor.0)
    .fetch_all(pool)
    .await?)
}

pub async fn delete_export(pool: &PgPool, actor: ActorId, export_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM resume_exports WHERE id = $1 AND user_id = $2")
        .bind(export_id)
        .bind(actor.0)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Export {export_id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_strips_whitespace_and_lowercases() {
        assert_eq!(
            export_file_name("Mary Ann", ExportFormat::Pdf),
            "maryann_resume.pdf"
        );
    }

    #[test]
    fn test_file_name_falls_back_to_user() {
        assert_eq!(export_file_name("  ", ExportFormat::Docx), "user_resume.docx");
    }

    #[test]
    fn test_s3_key_is_scoped_by_user() {
        let user = Uuid::nil();
        let export = Uuid::nil();
        assert_eq!(
            export_s3_key(user, export),
            format!("exports/{user}/{export}.json")
        );
    }

    #[test]
    fn test_format_parses_lowercase() {
        let f: ExportFormat = serde_json::from_str("\"docx\"").unwrap();
        assert_eq!(f, ExportFormat::Docx);
    }
}
