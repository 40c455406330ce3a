//! Session identity codec.
//!
//! The session only ever stores the user id; the full [`User`] is loaded again on each
//! request so a deleted account stops authenticating immediately.

use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{oauth::PendingAuthorization, repo::UserRepo, repo_types::User};
use crate::error::AppError;

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// Key for the OAuth state parked between redirect and callback.
pub const SESSION_OAUTH_KEY: &str = "oauth_pending";

/// Request-scoped authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(User),
}

/// Reduce a user to what the session keeps.
pub fn serialize_user(user: &User) -> Uuid {
    user.id
}

/// Load the user a session id points at.
pub async fn deserialize_user(users: &dyn UserRepo, id: Uuid) -> Result<User, AppError> {
    users.find_by_id(id).await?.ok_or(AppError::UnknownSession)
}

/// Bind `user` to the session under a fresh session id.
pub async fn establish(session: &Session, user: &User) -> Result<(), AppError> {
    session.cycle_id().await?;
    session
        .insert(SESSION_USER_ID_KEY, serialize_user(user))
        .await?;
    debug!(user_id = %user.id, "session established");
    Ok(())
}

/// Resolve the session into an [`AuthState`]. A stale id clears the session.
pub async fn restore(session: &Session, users: &dyn UserRepo) -> Result<AuthState, AppError> {
    let Some(id) = session.get::<Uuid>(SESSION_USER_ID_KEY).await? else {
        return Ok(AuthState::Unauthenticated);
    };

    match deserialize_user(users, id).await {
        Ok(user) => Ok(AuthState::Authenticated(user)),
        Err(AppError::UnknownSession) => {
            warn!(user_id = %id, "session refers to a missing user; clearing");
            session.flush().await?;
            Ok(AuthState::Unauthenticated)
        }
        Err(e) => Err(e),
    }
}

/// End the session entirely.
pub async fn clear(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    Ok(())
}

pub async fn store_pending(session: &Session, pending: &PendingAuthorization) -> Result<(), AppError> {
    session.insert(SESSION_OAUTH_KEY, pending).await?;
    Ok(())
}

/// Take the pending OAuth state out of the session; it is single use.
pub async fn take_pending(session: &Session) -> Result<Option<PendingAuthorization>, AppError> {
    Ok(session.remove::<PendingAuthorization>(SESSION_OAUTH_KEY).await?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;
    use crate::auth::{
        oauth::Provider,
        repo::MemoryUserRepo,
        repo_types::NewUser,
    };

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn alice(repo: &MemoryUserRepo) -> User {
        repo.create(NewUser {
            full_name: "Alice",
            email: "alice@x.com",
            password_hash: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn serialize_then_deserialize_returns_same_user() {
        let repo = MemoryUserRepo::default();
        let user = alice(&repo).await;
        let back = deserialize_user(&repo, serialize_user(&user)).await.unwrap();
        assert_eq!(back, user);
    }

    #[tokio::test]
    async fn unknown_id_is_unknown_session() {
        let repo = MemoryUserRepo::default();
        let err = deserialize_user(&repo, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::UnknownSession));
    }

    #[tokio::test]
    async fn empty_session_is_unauthenticated() {
        let repo = MemoryUserRepo::default();
        let state = restore(&new_session(), &repo).await.unwrap();
        assert_eq!(state, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn established_session_restores_user() {
        let repo = MemoryUserRepo::default();
        let user = alice(&repo).await;
        let session = new_session();

        establish(&session, &user).await.unwrap();
        let state = restore(&session, &repo).await.unwrap();
        assert_eq!(state, AuthState::Authenticated(user));
    }

    #[tokio::test]
    async fn stale_user_id_clears_session() {
        let repo = MemoryUserRepo::default();
        let session = new_session();
        session
            .insert(SESSION_USER_ID_KEY, Uuid::new_v4())
            .await
            .unwrap();

        let state = restore(&session, &repo).await.unwrap();
        assert_eq!(state, AuthState::Unauthenticated);
        assert!(session
            .get::<Uuid>(SESSION_USER_ID_KEY)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn pending_authorization_is_single_use() {
        let session = new_session();
        let pending = PendingAuthorization {
            provider: Provider::Google,
            csrf_state: "state".into(),
            pkce_verifier: "verifier".into(),
        };
        store_pending(&session, &pending).await.unwrap();

        let taken = take_pending(&session).await.unwrap().expect("pending present");
        assert_eq!(taken.csrf_state, "state");
        assert!(take_pending(&session).await.unwrap().is_none());
    }
}
