use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::draft::validation::{validate_draft, DraftValidationReport};
use crate::draft::{DraftSection, EntryId, PersonalDetailsPatch, ResumeDraft, SkillCategory};
use crate::editor::session::EditorSession;
use crate::errors::AppError;
use crate::resumes::repository::authorize_resume;
use crate::state::AppState;
use crate::sync::notify::Notice;
use crate::sync::{RequestIdentity, SaveStatus};

#[derive(Serialize)]
pub struct SessionResponse {
    pub resume_id: Uuid,
    pub draft: ResumeDraft,
    pub save_status: SaveStatus,
    pub notice: Option<Notice>,
    pub failed_saves: usize,
    pub validation: DraftValidationReport,
}

impl SessionResponse {
    fn from_session(session: &EditorSession) -> Self {
        let draft = session.snapshot();
        let validation = validate_draft(&draft);
        Self {
            resume_id: session.resume_id(),
            draft,
            save_status: session.save_status(),
            notice: session.latest_notice(),
            failed_saves: session.failed_saves(),
            validation,
        }
    }
}

#[derive(Serialize)]
pub struct EntryCreatedResponse {
    pub id: EntryId,
    pub session: SessionResponse,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub saved: bool,
    pub save_status: SaveStatus,
}

#[derive(Deserialize)]
pub struct SkillsRequest {
    pub items: Vec<String>,
}

/// Looks up the open session for `resume_id` after checking ownership.
async fn open_session(
    state: &AppState,
    identity: &RequestIdentity,
    resume_id: Uuid,
) -> Result<Arc<EditorSession>, AppError> {
    let actor = identity.require()?;
    authorize_resume(&state.db, actor, resume_id).await?;
    state
        .sessions
        .get(resume_id)
        .ok_or_else(|| AppError::NotFound(format!("No open session for resume {resume_id}")))
}

fn parse_section(raw: &str) -> Result<DraftSection, AppError> {
    raw.parse().map_err(AppError::Validation)
}

/// POST /api/v1/resumes/:id/session
pub async fn handle_open_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let actor = identity.require()?;
    authorize_resume(&state.db, actor, id).await?;

    if let Some(existing) = state.sessions.get(id) {
        return Ok((StatusCode::OK, Json(SessionResponse::from_session(&existing))));
    }

    let session = EditorSession::open(
        id,
        state.store.clone(),
        &identity,
        state.config.autosave_delay,
    )
    .await;
    let session = state.sessions.insert(session);
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::from_session(&session)),
    ))
}

/// GET /api/v1/resumes/:id/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<Json<SessionResponse>, AppError> {
    let session = open_session(&state, &identity, id).await?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// DELETE /api/v1/resumes/:id/session
///
/// Closing drops any edit still waiting for its quiet period. Clients that
/// want it kept call the save endpoint first.
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<StatusCode, AppError> {
    let actor = identity.require()?;
    authorize_resume(&state.db, actor, id).await?;
    state
        .sessions
        .remove(id)
        .ok_or_else(|| AppError::NotFound(format!("No open session for resume {id}")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resumes/:id/session/save
pub async fn handle_save_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<Json<SaveResponse>, AppError> {
    let session = open_session(&state, &identity, id).await?;
    let saved = session.save_now().await?;
    Ok(Json(SaveResponse {
        saved,
        save_status: session.save_status(),
    }))
}

/// PUT /api/v1/resumes/:id/session/draft
pub async fn handle_replace_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
    Json(draft): Json<ResumeDraft>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = open_session(&state, &identity, id).await?;
    session.apply(&identity, |editor| {
        editor.replace(draft);
        Ok(())
    })?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// POST /api/v1/resumes/:id/session/reset
pub async fn handle_reset_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
) -> Result<Json<SessionResponse>, AppError> {
    let session = open_session(&state, &identity, id).await?;
    session.apply(&identity, |editor| {
        editor.reset();
        Ok(())
    })?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// PATCH /api/v1/resumes/:id/session/personal
pub async fn handle_update_personal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    identity: RequestIdentity,
    Json(patch): Json<PersonalDetailsPatch>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = open_session(&state, &identity, id).await?;
    session.apply(&identity, |editor| {
        editor.update_personal_details(patch);
        Ok(())
    })?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// POST /api/v1/resumes/:id/session/sections/:section
pub async fn handle_add_entry(
    State(state): State<AppState>,
    Path((id, section)): Path<(Uuid, String)>,
    identity: RequestIdentity,
    Json(entry): Json<Value>,
) -> Result<(StatusCode, Json<EntryCreatedResponse>), AppError> {
    let section = parse_section(&section)?;
    let session = open_session(&state, &identity, id).await?;
    let entry_id = session.apply(&identity, |editor| editor.add_entry(section, entry))?;
    Ok((
        StatusCode::CREATED,
        Json(EntryCreatedResponse {
            id: entry_id,
            session: SessionResponse::from_session(&session),
        }),
    ))
}

/// PATCH /api/v1/resumes/:id/session/sections/:section/:entry_id
pub async fn handle_update_entry(
    State(state): State<AppState>,
    Path((id, section, entry_id)): Path<(Uuid, String, String)>,
    identity: RequestIdentity,
    Json(patch): Json<Value>,
) -> Result<Json<SessionResponse>, AppError> {
    let section = parse_section(&section)?;
    let session = open_session(&state, &identity, id).await?;
    let entry_id = EntryId(entry_id);
    session.apply(&identity, |editor| {
        editor.update_entry(section, &entry_id, patch)
    })?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// DELETE /api/v1/resumes/:id/session/sections/:section/:entry_id
pub async fn handle_remove_entry(
    State(state): State<AppState>,
    Path((id, section, entry_id)): Path<(Uuid, String, String)>,
    identity: RequestIdentity,
) -> Result<Json<SessionResponse>, AppError> {
    let section = parse_section(&section)?;
    let session = open_session(&state, &identity, id).await?;
    let entry_id = EntryId(entry_id);
    session.apply(&identity, |editor| editor.remove_entry(section, &entry_id))?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// PUT /api/v1/resumes/:id/session/skills/:category
pub async fn handle_set_skills(
    State(state): State<AppState>,
    Path((id, category)): Path<(Uuid, String)>,
    identity: RequestIdentity,
    Json(req): Json<SkillsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let category: SkillCategory = category.parse().map_err(AppError::Validation)?;
    let session = open_session(&state, &identity, id).await?;
    session.apply(&identity, |editor| {
        editor.set_skills(category, req.items);
        Ok(())
    })?;
    Ok(Json(SessionResponse::from_session(&session)))
}
