use crate::auth::password::PasswordHasher;
use crate::auth::token::{TokenKind, TokenService};
use crate::db::models::{AuthGrant, PublicUser, RefreshSession, User};
use crate::db::{RefreshStore, UserDirectory};
use crate::error::AuthError;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Orchestrates the user directory, password hasher, token signer, and
/// refresh store into the four identity-establishing operations plus the
/// directory listing.
///
/// The service itself holds no per-call state; one instance is shared by all
/// callers, and collaborators are injected so tests can substitute fakes.
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    refresh_store: Arc<dyn RefreshStore>,
    hasher: PasswordHasher,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        refresh_store: Arc<dyn RefreshStore>,
        hasher: PasswordHasher,
        tokens: TokenService,
    ) -> Self {
        Self {
            directory,
            refresh_store,
            hasher,
            tokens,
        }
    }

    /// Creates an account and signs the new user in.
    ///
    /// Fails with [`AuthError::DuplicateUser`] if the email is taken. The
    /// directory's unique constraint backstops the existence check here, so a
    /// registration racing past it still surfaces the same error.
    pub async fn registration(&self, email: &str, password: &str) -> Result<AuthGrant> {
        if self.directory.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateUser(email.to_string()).into());
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self.directory.create(email, &password_hash).await?;

        info!(user_id = %user.id, "registered new user");
        self.issue_grant(&user).await
    }

    /// Verifies credentials and signs the user in, superseding any refresh
    /// token the user already had.
    ///
    /// Unknown email and wrong password collapse into one
    /// [`AuthError::InvalidCredentials`] so callers cannot probe which
    /// accounts exist.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        let user = match self.directory.find_by_email(email).await? {
            Some(user) => user,
            None => {
                debug!("login rejected: no account for submitted email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        info!(user_id = %user.id, "login succeeded");
        self.issue_grant(&user).await
    }

    /// Removes the refresh session matching the given token value. A token
    /// with no session is a no-op, so repeated logouts are harmless.
    ///
    /// The paired access token is stateless and stays valid until its own
    /// expiry; this design cannot revoke it early.
    pub async fn logout(&self, refresh_token: &str) -> Result<Option<RefreshSession>> {
        let removed = self.refresh_store.delete_by_token(refresh_token).await?;
        if let Some(session) = &removed {
            info!(user_id = %session.user_id, "logout removed refresh session");
        }
        Ok(removed)
    }

    /// Rotates a refresh token: validates it, confirms it is still the live
    /// session for its user, and issues a new pair that replaces it.
    ///
    /// Both checks are required. A token with a valid signature that was
    /// already superseded or logged out has no session row and fails
    /// [`AuthError::Unauthorized`], which is what makes rotation revoke old
    /// tokens before their stated expiry.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthGrant> {
        if refresh_token.is_empty() {
            return Err(AuthError::Unauthorized.into());
        }

        let claims = self
            .tokens
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                debug!("refresh rejected: {e}");
                AuthError::Unauthorized
            })?;

        if self
            .refresh_store
            .find_by_token(refresh_token)
            .await?
            .is_none()
        {
            debug!(user_id = %claims.sub, "refresh rejected: token superseded or revoked");
            return Err(AuthError::Unauthorized.into());
        }

        // Re-fetch rather than trusting the claims; the account may have
        // been removed since the token was minted.
        let user = self
            .directory
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        info!(user_id = %user.id, "refresh token rotated");
        self.issue_grant(&user).await
    }

    /// Full directory snapshot, no filtering or pagination. Administrative
    /// surface only.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.directory.list_all().await
    }

    /// Mints a token pair for the user and stores its refresh token as the
    /// single live session, overwriting whatever was there.
    async fn issue_grant(&self, user: &User) -> Result<AuthGrant> {
        let view = PublicUser::from(user);
        let tokens = self.tokens.mint_pair(&view)?;
        self.refresh_store
            .upsert(user.id, &tokens.refresh_token)
            .await?;

        Ok(AuthGrant { tokens, user: view })
    }
}
