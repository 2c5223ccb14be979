use std::fmt;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Header carrying the authenticated user id, set by the upstream auth proxy.
pub const ACTOR_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub Uuid);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Supplies the current actor, if any. The sole authorization gate the
/// synchronizer knows about.
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> Option<ActorId>;
}

/// Identity resolved from the request headers. A missing or malformed
/// header yields an anonymous identity rather than a rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdentity(pub Option<ActorId>);

impl RequestIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn require(&self) -> Result<ActorId, AppError> {
        self.0.ok_or(AppError::Unauthorized)
    }
}

impl IdentityProvider for RequestIdentity {
    fn current_actor(&self) -> Option<ActorId> {
        self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(ActorId);
        Ok(RequestIdentity(actor))
    }
}
