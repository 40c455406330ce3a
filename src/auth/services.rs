use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::auth::{
    password::{hash_password, verify_password},
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::error::{AppError, StoreError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Argon2id hash of no real password. Unknown and password-less accounts are checked
/// against it so every rejection pays for one hash verification.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGFza2xpc3QtZHVtbXktcw$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Canonical form used as the lookup key on every auth path.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Why a credential check did not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoSuchUser,
    WrongPassword,
    /// The account was created through an OAuth provider and never set a password.
    NoLocalPassword,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectReason::NoSuchUser => "unknown email",
            RejectReason::WrongPassword => "invalid password",
            RejectReason::NoLocalPassword => "no local password",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Verified(User),
    Rejected(RejectReason),
}

/// Check an email/password pair against the stored hash.
///
/// Mismatches come back as `Rejected`; only storage failures are errors.
pub async fn verify_credentials(
    users: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<Verification, StoreError> {
    let email = normalize_email(email);
    let Some(user) = users.find_by_email(&email).await? else {
        let _ = verify_password(password, DUMMY_HASH);
        return Ok(Verification::Rejected(RejectReason::NoSuchUser));
    };

    let Some(hash) = user.password_hash.as_deref() else {
        let _ = verify_password(password, DUMMY_HASH);
        return Ok(Verification::Rejected(RejectReason::NoLocalPassword));
    };

    match verify_password(password, hash) {
        Ok(true) => Ok(Verification::Verified(user)),
        Ok(false) => Ok(Verification::Rejected(RejectReason::WrongPassword)),
        Err(e) => {
            error!(error = %e, user_id = %user.id, "stored password hash is unreadable");
            Ok(Verification::Rejected(RejectReason::WrongPassword))
        }
    }
}

/// Local login: a verified user or `InvalidCredentials`.
pub async fn login_local(
    users: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    match verify_credentials(users, email, password).await? {
        Verification::Verified(user) => {
            info!(user_id = %user.id, "user logged in");
            Ok(user)
        }
        Verification::Rejected(reason) => {
            warn!(email = %normalize_email(email), %reason, "login rejected");
            Err(AppError::InvalidCredentials(reason))
        }
    }
}

/// Create a local account. The existence check only gives a friendlier answer;
/// the unique index on `users.email` decides races.
pub async fn register_local(
    users: &dyn UserRepo,
    full_name: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let full_name = full_name.trim();
    let email = normalize_email(email);

    if full_name.is_empty() {
        return Err(AppError::InvalidInput("Name is required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::InvalidInput("Invalid email"));
    }
    if password.is_empty() {
        return Err(AppError::InvalidInput("Password is required"));
    }

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::UserAlreadyExists);
    }

    let hash = hash_password(password)?;

    let user = users
        .create(NewUser {
            full_name,
            email: &email,
            password_hash: Some(&hash),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => {
                debug!(email = %email, "concurrent registration lost the race");
                AppError::UserAlreadyExists
            }
            other => AppError::Storage(other),
        })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}
