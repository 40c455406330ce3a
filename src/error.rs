use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::{oauth::Provider, services::RejectReason};

/// Failures reported by the repositories.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Translate a raw sqlx error, singling out unique violations.
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Database(e),
        }
    }
}

/// Request-level error taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid credentials ({0})")]
    InvalidCredentials(RejectReason),
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("{0} profile has no usable email")]
    MissingEmail(Provider),
    #[error("session refers to an unknown user")]
    UnknownSession,
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("not found")]
    NotFound,
    #[error("oauth: {0}")]
    OAuth(String),
    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // One answer for every credential failure; the reason only reaches the logs.
            AppError::InvalidCredentials(_) => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password").into_response()
            }
            AppError::UserAlreadyExists => {
                (StatusCode::CONFLICT, "User already exists").into_response()
            }
            AppError::MissingEmail(provider) => (
                StatusCode::BAD_REQUEST,
                format!(
                    "Your {} account did not share an email address. Please allow email access and try again.",
                    provider.display_name()
                ),
            )
                .into_response(),
            AppError::Unauthorized | AppError::UnknownSession => {
                Redirect::to("/login").into_response()
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
            AppError::OAuth(detail) => {
                warn!(error = %detail, "oauth flow failed");
                Redirect::to("/login?error=oauth").into_response()
            }
            AppError::Session(e) => {
                error!(error = %e, "session store failure");
                internal()
            }
            AppError::Storage(e) => {
                error!(error = %e, "storage failure");
                internal()
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal failure");
                internal()
            }
        }
    }
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong, please try again",
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_share_one_response() {
        let reasons = [
            RejectReason::NoSuchUser,
            RejectReason::WrongPassword,
            RejectReason::NoLocalPassword,
        ];
        for reason in reasons {
            let res = AppError::InvalidCredentials(reason).into_response();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn unauthorized_redirects_to_login() {
        let res = AppError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/login");

        let res = AppError::UnknownSession.into_response();
        assert_eq!(res.headers()["location"], "/login");
    }

    #[test]
    fn storage_errors_hide_detail() {
        let res = AppError::Storage(StoreError::Database(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn existing_user_is_a_conflict() {
        let res = AppError::UserAlreadyExists.into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
