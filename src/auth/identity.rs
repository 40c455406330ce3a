use tracing::{debug, info};

use crate::auth::{
    oauth::{ExternalProfile, Provider},
    repo::UserRepo,
    repo_types::{NewUser, User},
    services::{is_valid_email, normalize_email},
};
use crate::error::{AppError, StoreError};

impl ExternalProfile {
    /// First usable address in provider order.
    pub fn primary_email(&self) -> Option<String> {
        self.emails
            .iter()
            .map(|e| normalize_email(e))
            .find(|e| is_valid_email(e))
    }
}

/// Find or create the local user an external profile belongs to.
///
/// Matching is by email only. An existing row is returned untouched, whichever path
/// created it; a new row gets the profile name and no local password.
pub async fn resolve_external_identity(
    users: &dyn UserRepo,
    provider: Provider,
    profile: &ExternalProfile,
) -> Result<User, AppError> {
    let email = profile
        .primary_email()
        .ok_or(AppError::MissingEmail(provider))?;

    if let Some(user) = users.find_by_email(&email).await? {
        debug!(
            %provider,
            user_id = %user.id,
            local_password = user.has_local_password(),
            "external identity matched existing user"
        );
        return Ok(user);
    }

    let full_name = match profile.display_name.trim() {
        "" => email.as_str(),
        name => name,
    };
    let created = users
        .create(NewUser {
            full_name,
            email: &email,
            password_hash: None,
        })
        .await;

    match created {
        Ok(user) => {
            info!(%provider, user_id = %user.id, email = %user.email, "user created from external profile");
            Ok(user)
        }
        // Someone else inserted the same email between our lookup and insert.
        Err(StoreError::Conflict) => users
            .find_by_email(&email)
            .await?
            .ok_or(AppError::Storage(StoreError::Conflict)),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        repo::{MemoryUserRepo, RacingUserRepo},
        services::register_local,
    };

    fn bob() -> ExternalProfile {
        ExternalProfile {
            display_name: "Bob".into(),
            emails: vec!["bob@x.com".into()],
        }
    }

    #[tokio::test]
    async fn repeated_logins_resolve_to_one_user() {
        let repo = MemoryUserRepo::default();
        let first = resolve_external_identity(&repo, Provider::Google, &bob())
            .await
            .unwrap();
        let second = resolve_external_identity(&repo, Provider::Google, &bob())
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.count_by_email("bob@x.com").await, 1);
        assert_eq!(first.full_name, "Bob");
        assert!(!first.has_local_password());
    }

    #[tokio::test]
    async fn providers_converge_on_the_same_email() {
        let repo = MemoryUserRepo::default();
        let google = resolve_external_identity(&repo, Provider::Google, &bob())
            .await
            .unwrap();
        let github = resolve_external_identity(
            &repo,
            Provider::Github,
            &ExternalProfile {
                display_name: "bobby".into(),
                emails: vec!["Bob@X.com".into()],
            },
        )
        .await
        .unwrap();

        assert_eq!(google.id, github.id);
        assert_eq!(github.full_name, "Bob");
    }

    #[tokio::test]
    async fn existing_local_account_is_not_overwritten() {
        let repo = MemoryUserRepo::default();
        let local = register_local(&repo, "Robert", "bob@x.com", "pw123")
            .await
            .unwrap();

        let resolved = resolve_external_identity(&repo, Provider::Github, &bob())
            .await
            .unwrap();
        assert_eq!(resolved, local);
        assert!(resolved.has_local_password());
    }

    #[tokio::test]
    async fn profile_without_email_is_rejected_per_provider() {
        let repo = MemoryUserRepo::default();
        let profile = ExternalProfile {
            display_name: "Nobody".into(),
            emails: vec!["".into(), "not-an-email".into()],
        };

        let err = resolve_external_identity(&repo, Provider::Google, &profile)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingEmail(Provider::Google)));

        let err = resolve_external_identity(&repo, Provider::Github, &profile)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingEmail(Provider::Github)));
    }

    #[tokio::test]
    async fn blank_display_name_falls_back_to_email() {
        let repo = MemoryUserRepo::default();
        let user = resolve_external_identity(
            &repo,
            Provider::Google,
            &ExternalProfile {
                display_name: "  ".into(),
                emails: vec!["carol@x.com".into()],
            },
        )
        .await
        .unwrap();
        assert_eq!(user.full_name, "carol@x.com");
    }

    #[tokio::test]
    async fn insert_race_resolves_to_the_existing_user() {
        let inner = MemoryUserRepo::default();
        let existing = register_local(&inner, "Robert", "bob@x.com", "pw123")
            .await
            .unwrap();
        let repo = RacingUserRepo::new(inner);

        let resolved = resolve_external_identity(&repo, Provider::Google, &bob())
            .await
            .unwrap();
        assert_eq!(resolved.id, existing.id);
        assert_eq!(repo.inner.count_by_email("bob@x.com").await, 1);
    }
}
