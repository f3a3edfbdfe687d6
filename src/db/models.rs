use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// The caller-facing projection of a [`User`]. This is an explicit mapping
/// with a fixed shape; the password hash never crosses this boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// One row per user: the single active refresh token. Upserting for the same
/// user id overwrites the previous row, which is what rotation relies on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshSession {
    pub user_id: Uuid,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of every identity-establishing operation: a fresh token pair plus
/// the public view of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGrant {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_user_drops_password_hash() {
        let user = User::new("a@x.com".to_string(), "$2b$12$secret".to_string());
        let view = PublicUser::from(&user);

        assert_eq!(view.id, user.id);
        assert_eq!(view.email, user.email);
        assert_eq!(view.created_at, user.created_at);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("secret"));
    }
}
