pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use sqlx::PgPool;
use std::sync::Arc;

pub use error::{AppError, AuthError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, Claims, PasswordHasher, TokenKind, TokenService};
pub use db::{AuthGrant, PublicUser, RefreshSession, TokenPair, User};

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: Arc<PgPool>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Connects the Postgres pool and wires an [`AuthService`] over it.
    pub async fn new(config: Settings) -> Result<Self> {
        let db_pool = Arc::new(db::postgres::connect(&config.database).await?);

        let auth = AuthService::new(
            Arc::new(db::PgUserDirectory::new(db_pool.clone())),
            Arc::new(db::PgRefreshStore::new(db_pool.clone())),
            PasswordHasher::new(),
            TokenService::new(&config.auth),
        );

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            auth: Arc::new(auth),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Close database connections
        self.db_pool.close().await;

        Ok(())
    }
}
