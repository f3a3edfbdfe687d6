//! In-memory store implementations, used by the test suites and suitable for
//! embedding where no database is wired up.

use crate::db::models::{RefreshSession, User};
use crate::db::{RefreshStore, UserDirectory};
use crate::error::{AppError, AuthError};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users.write().await;

        // Uniqueness check under the write lock mirrors the database's
        // unique constraint.
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::AuthError(AuthError::DuplicateUser(
                email.to_string(),
            )));
        }

        let user = User::new(email.to_string(), password_hash.to_string());
        users.push(user.clone());
        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.clone())
    }
}

#[derive(Default)]
pub struct MemoryRefreshStore {
    sessions: Arc<RwLock<HashMap<Uuid, RefreshSession>>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshStore for MemoryRefreshStore {
    async fn upsert(&self, user_id: Uuid, token: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            user_id,
            RefreshSession {
                user_id,
                token: token.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().find(|s| s.token == token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> Result<Option<RefreshSession>> {
        let mut sessions = self.sessions.write().await;
        let user_id = sessions
            .values()
            .find(|s| s.token == token)
            .map(|s| s.user_id);

        Ok(user_id.and_then(|id| sessions.remove(&id)))
    }
}
