use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::error;

use crate::auth::{repo_types::User, session};
use crate::auth::session::AuthState;
use crate::error::AppError;
use crate::state::AppState;

async fn session_from_parts(parts: &mut Parts, state: &AppState) -> Result<Session, AppError> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(status, msg)| {
            error!(%status, msg, "session layer missing");
            AppError::Internal(anyhow::anyhow!(msg))
        })
}

/// Resolves the caller's session into an [`AuthState`]; never rejects an anonymous caller.
impl FromRequestParts<AppState> for AuthState {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        session::restore(&session, state.users.as_ref()).await
    }
}

/// Gate for protected routes: the authenticated user, or a redirect to `/login`.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match AuthState::from_request_parts(parts, state).await? {
            AuthState::Authenticated(user) => Ok(AuthUser(user)),
            AuthState::Unauthenticated => Err(AppError::Unauthorized),
        }
    }
}
