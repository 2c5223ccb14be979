//! Axum route handlers for resumes and their exports.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::preview::render_draft_to_md;
use crate::draft::validation::{validate_draft, DraftValidationReport};
use crate::draft::ResumeDraft;
use crate::errors::AppError;
use crate::models::resume::{ResumeExportRow, ResumeRow};
use crate::resumes::export::{delete_export, list_exports, record_export, ExportFormat};
use crate::resumes::repository::{authorize_resume, create_resume};
use crate::state::AppState;
use crate::sync::{RequestIdentity, SectionKey};

/// The open session's draft when there is one, otherwise the stored copy.
async fn current_draft(state: &AppState, resume_id: Uuid) -> Result<ResumeDraft, AppError> {
    if let Some(session) = state.sessions.get(resume_id) {
        return Ok(session.snapshot());
    }
    match state.store.get(&SectionKey::full_document(resume_id)).await? {
        Some(record) => serde_json::from_value(record.content)
            .map_err(|e| AppError::Validation(format!("Stored resume is malformed: {e}"))),
        None => Ok(ResumeDraft::default()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateResumeRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub resume_id: Uuid,
    pub markdown: String,
    pub validation: DraftValidationReport,
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    identity: RequestIdentity,
    body: Option<Json<CreateResumeRequest>>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let actor = identity.require()?;
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let row = create_resume(&state.db, actor, req.title.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/resumes/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<Json<PreviewResponse>, AppError> {
    let actor = identity.require()?;
    authorize_resume(&state.db, actor, id).await?;
    let draft = current_draft(&state, id).await?;
    Ok(Json(PreviewResponse {
        resume_id: id,
        markdown: render_draft_to_md(&draft),
        validation: validate_draft(&draft),
    }))
}

/// POST /api/v1/resumes/:id/exports
///
/// Saves the open session first so the recorded snapshot is what the user
/// sees; without a session the stored document is exported.
pub async fn handle_record_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
    Json(req): Json<ExportRequest>,
) -> Result<(StatusCode, Json<ResumeExportRow>), AppError> {
    let actor = identity.require()?;
    authorize_resume(&state.db, actor, id).await?;

    if let Some(session) = state.sessions.get(id) {
        session.save_now().await?;
    }
    let draft = current_draft(&state, id).await?;

    let row = record_export(
        &state.db,
        &state.s3,
        &state.config.s3_bucket,
        actor,
        id,
        req.format,
        &draft,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/exports
pub async fn handle_list_exports(
    State(state): State<AppState>,
    identity: RequestIdentity,
) -> Result<Json<Vec<ResumeExportRow>>, AppError> {
    let actor = identity.require()?;
    Ok(Json(list_exports(&state.db, actor).await?))
}

/// DELETE /api/v1/exports/:id
pub async fn handle_delete_export(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<StatusCode, AppError> {
    let actor = identity.require()?;
    delete_export(&state.db, actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
