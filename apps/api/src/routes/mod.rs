pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::editor::handlers as editor;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(resumes::handle_create_resume))
        // Editor sessions
        .route(
            "/api/v1/resumes/:id/session",
            post(editor::handle_open_session)
                .get(editor::handle_get_session)
                .delete(editor::handle_close_session),
        )
        .route(
            "/api/v1/resumes/:id/session/save",
            post(editor::handle_save_session),
        )
        .route(
            "/api/v1/resumes/:id/session/draft",
            put(editor::handle_replace_draft),
        )
        .route(
            "/api/v1/resumes/:id/session/reset",
            post(editor::handle_reset_draft),
        )
        .route(
            "/api/v1/resumes/:id/session/personal",
            patch(editor::handle_update_personal),
        )
        .route(
            "/api/v1/resumes/:id/session/sections/:section",
            post(editor::handle_add_entry),
        )
        .route(
            "/api/v1/resumes/:id/session/sections/:section/:entry_id",
            patch(editor::handle_update_entry).delete(editor::handle_remove_entry),
        )
        .route(
            "/api/v1/resumes/:id/session/skills/:category",
            put(editor::handle_set_skills),
        )
        // Preview and exports
        .route("/api/v1/resumes/:id/preview", get(resumes::handle_preview))
        .route(
            "/api/v1/resumes/:id/exports",
            post(resumes::handle_record_export),
        )
        .route("/api/v1/exports", get(resumes::handle_list_exports))
        .route(
            "/api/v1/exports/:id",
            delete(resumes::handle_delete_export),
        )
        .with_state(state)
}
