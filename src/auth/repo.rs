use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::error::StoreError;

/// Access to the `users` table.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Find a user by (normalised) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Find a user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Insert a user; `StoreError::Conflict` when the email is taken.
    async fn create(&self, user: NewUser<'_>) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: NewUser<'_>) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, full_name, email, password_hash, created_at
            "#,
        )
        .bind(user.full_name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::from_sqlx)
    }
}

#[cfg(test)]
pub use memory::{MemoryUserRepo, RacingUserRepo};


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_repo_enforces_unique_email() {
        let repo = MemoryUserRepo::default();
        let new = NewUser {
            full_name: "Alice",
            email: "alice@x.com",
            password_hash: None,
        };
        repo.create(new.clone()).await.expect("first insert");
        let err = repo.create(new).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
        assert_eq!(repo.count_by_email("alice@x.com").await, 1);
    }
}
