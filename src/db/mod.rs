//! Storage boundary of the authentication core.
//!
//! The core talks to persistence through two narrow traits: [`UserDirectory`]
//! for identity records and [`RefreshStore`] for the active refresh token per
//! user. Postgres-backed and in-memory implementations are provided.

pub mod memory;
pub mod models;
pub mod postgres;

use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use memory::{MemoryRefreshStore, MemoryUserDirectory};
pub use models::{AuthGrant, PublicUser, RefreshSession, TokenPair, User};
pub use postgres::{PgRefreshStore, PgUserDirectory};

/// Persistent user identity records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Creates a user. Email uniqueness is enforced here: a duplicate email
    /// fails with [`AuthError::DuplicateUser`](crate::error::AuthError), even
    /// when a concurrent registration won the race after the caller's
    /// existence check.
    async fn create(&self, email: &str, password_hash: &str) -> Result<User>;

    async fn list_all(&self) -> Result<Vec<User>>;
}

/// Persistence for refresh tokens, at most one per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshStore: Send + Sync {
    /// Stores `token` as the single active refresh token for `user_id`,
    /// replacing any prior one. Must be last-writer-wins and atomic per
    /// user id.
    async fn upsert(&self, user_id: Uuid, token: &str) -> Result<()>;

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshSession>>;

    /// Removes the session with this exact token value, returning the removed
    /// row. Missing rows yield `None`, not an error.
    async fn delete_by_token(&self, token: &str) -> Result<Option<RefreshSession>>;
}
