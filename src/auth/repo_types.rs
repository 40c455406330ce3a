use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,                       // generated by the database
    pub full_name: String,
    pub email: String,                  // unique, lowercased
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,  // Argon2 PHC string; NULL for OAuth-only accounts
    pub created_at: OffsetDateTime,
}

impl User {
    /// Whether the account can sign in with a local password.
    pub fn has_local_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Values for a user row that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_leaves_in_json() {
        let user = User {
            id: Uuid::new_v4(),
            full_name: "Alice".into(),
            email: "alice@x.com".into(),
            password_hash: Some("$argon2id$secret".into()),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "alice@x.com");
    }
}
