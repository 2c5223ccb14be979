use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::editor::SessionRegistry;
use crate::sync::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub config: Config,
    /// Where editor sessions load and autosave drafts. Postgres in production.
    pub store: Arc<dyn DocumentStore>,
    pub sessions: SessionRegistry,
}
