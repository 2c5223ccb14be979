use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::sync::ActorId;

pub const DEFAULT_TITLE: &str = "Untitled Document";
pub const DEFAULT_TEMPLATE: &str = "modern";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThemeConfig {
    pub primary_color: String,
    pub font_family: String,
    pub font_scale: String,
    pub spacing_scale: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary_color: "#000000".to_string(),
            font_family: "inter".to_string(),
            font_scale: "medium".to_string(),
            spacing_scale: "comfortable".to_string(),
        }
    }
}

/// Creates the top-level resume row. Its content row is created lazily by
/// the first autosave.
pub async fn create_resume(
    pool: &PgPool,
    actor: ActorId,
    title: Option<&str>,
) -> Result<ResumeRow, AppError> {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    let theme: Value =
        serde_json::to_value(ThemeConfig::default()).map_err(|e| AppError::Internal(e.into()))?;

    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, user_id, title, template_name, theme_config)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor.0)
    .bind(title)
    .bind(DEFAULT_TEMPLATE)
    .bind(theme)
    .fetch_one(pool)
    .await?;

    info!("Created resume {} for user {}", row.id, actor);
    Ok(row)
}

/// Fails unless `resume_id` exists and belongs to `actor`.
pub async fn authorize_resume(
    pool: &PgPool,
    actor: ActorId,
    resume_id: Uuid,
) -> Result<(), AppError> {
    let owner: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM resumes WHERE id = $1")
        .bind(resume_id)
        .fetch_optional(pool)
        .await?;

    match owner {
        None => Err(AppError::NotFound(format!("Resume {resume_id} not found"))),
        Some(owner) if owner != actor.0 => Err(AppError::Forbidden),
        Some(_) => Ok(()),
    }
}
