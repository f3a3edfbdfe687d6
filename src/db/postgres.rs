use crate::config::DatabaseConfig;
use crate::db::models::{RefreshSession, User};
use crate::db::{RefreshStore, UserDirectory};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Opens a connection pool from settings.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
        .map_err(|e| AppError::DatabaseError(DatabaseError::ConnectionError(e.to_string())))
}

/// Applies the bundled migrations (users + refresh_sessions tables).
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(DatabaseError::QueryError(e.to_string())))?;
    Ok(())
}

pub struct PgUserDirectory {
    pool: Arc<PgPool>,
}

impl PgUserDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<User> {
        let user = User::new(email.to_string(), password_hash.to_string());

        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| match e {
            // Unique-constraint backstop for registrations racing past the
            // existence check; surfaced as the same error the check produces.
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::AuthError(AuthError::DuplicateUser(email.to_string()))
            }
            other => other.into(),
        })?;

        Ok(created)
    }

    async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(users)
    }
}

pub struct PgRefreshStore {
    pool: Arc<PgPool>,
}

impl PgRefreshStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshStore for PgRefreshStore {
    async fn upsert(&self, user_id: Uuid, token: &str) -> Result<()> {
        // Single statement, so the per-user overwrite is atomic and
        // last-writer-wins under concurrent logins/refreshes.
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (user_id, token, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET token = EXCLUDED.token, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(Utc::now())
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshSession>> {
        let session = sqlx::query_as::<_, RefreshSession>(
            "SELECT user_id, token, created_at FROM refresh_sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(session)
    }

    async fn delete_by_token(&self, token: &str) -> Result<Option<RefreshSession>> {
        let removed = sqlx::query_as::<_, RefreshSession>(
            r#"
            DELETE FROM refresh_sessions WHERE token = $1
            RETURNING user_id, token, created_at
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(removed)
    }
}
