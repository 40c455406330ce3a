use crate::auth::oauth::OAuthClients;
use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::todos::repo::{PgTodoRepo, TodoRepo};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared, read-only handles passed to every handler. Nothing here is per-user.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub todos: Arc<dyn TodoRepo>,
    pub config: Arc<AppConfig>,
    pub oauth: Arc<OAuthClients>,
}

impl AppState {
    pub fn init(db: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let oauth = Arc::new(OAuthClients::from_config(&config)?);
        Ok(Self::from_parts(
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgTodoRepo::new(db)),
            config,
            oauth,
        ))
    }

    pub fn from_parts(
        users: Arc<dyn UserRepo>,
        todos: Arc<dyn TodoRepo>,
        config: Arc<AppConfig>,
        oauth: Arc<OAuthClients>,
    ) -> Self {
        Self {
            users,
            todos,
            config,
            oauth,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::auth::repo::MemoryUserRepo;
        use crate::todos::repo::MemoryTodoRepo;

        Self::from_parts(
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryTodoRepo::default()),
            Arc::new(AppConfig::for_tests()),
            Arc::new(OAuthClients::default()),
        )
    }
}
