use crate::config::AuthConfig;
use crate::db::models::{PublicUser, TokenPair};
use crate::error::AuthError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two token roles. Each kind signs with its own secret, so an access
/// token can never be replayed as a refresh token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity carried inside every token: enough to reconstruct the user
/// without a directory lookup. The `jti` makes every minted token a distinct
/// string even when timestamps collide at second resolution; rotation relies
/// on the new refresh token never equaling the one it replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Stateless minting and verification of signed tokens.
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl: Duration::minutes(config.access_expiry_minutes),
            refresh_ttl: Duration::days(config.refresh_expiry_days),
        }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.access_secret.as_bytes(),
            TokenKind::Refresh => self.refresh_secret.as_bytes(),
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Mints a signed token of the given kind for a user.
    pub fn mint(&self, user: &PublicUser, kind: TokenKind) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl(kind)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .map_err(|_| AuthError::TokenInvalid)
    }

    /// Mints the access/refresh pair issued by every identity-establishing
    /// operation.
    pub fn mint_pair(&self, user: &PublicUser) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.mint(user, TokenKind::Access)?,
            refresh_token: self.mint(user, TokenKind::Refresh)?,
        })
    }

    /// Checks signature integrity and expiry, returning the embedded claims.
    /// An elapsed token fails with [`AuthError::TokenExpired`]; a tampered,
    /// malformed, or wrong-kind token fails with [`AuthError::TokenInvalid`].
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; no clock-skew allowance.
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret(kind)),
            &validation,
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_secret: "access_secret_for_tests".to_string(),
            refresh_secret: "refresh_secret_for_tests".to_string(),
            access_expiry_minutes: 30,
            refresh_expiry_days: 30,
        }
    }

    fn test_user() -> PublicUser {
        PublicUser {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mint_and_verify_roundtrip() {
        let service = TokenService::new(&test_config());
        let user = test_user();

        let token = service.mint(&user, TokenKind::Access).unwrap();
        let claims = service.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_back_to_back_mints_are_distinct_tokens() {
        let service = TokenService::new(&test_config());
        let user = test_user();

        // Minted within the same second, so iat/exp collide; the tokens
        // must still differ or an upsert would re-store the old value and
        // the superseded token would stay live.
        let first = service.mint(&user, TokenKind::Refresh).unwrap();
        let second = service.mint(&user, TokenKind::Refresh).unwrap();
        assert_ne!(first, second);

        let a = service.verify(&first, TokenKind::Refresh).unwrap();
        let b = service.verify(&second, TokenKind::Refresh).unwrap();
        assert_ne!(a.jti, b.jti);
        assert_eq!(a.sub, b.sub);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let service = TokenService::new(&test_config());
        let user = test_user();

        let access = service.mint(&user, TokenKind::Access).unwrap();
        let refresh = service.mint(&user, TokenKind::Refresh).unwrap();

        assert_eq!(
            service.verify(&access, TokenKind::Refresh).unwrap_err(),
            AuthError::TokenInvalid
        );
        assert_eq!(
            service.verify(&refresh, TokenKind::Access).unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[test]
    fn test_expired_token_fails_distinctly() {
        let mut config = test_config();
        config.access_expiry_minutes = -1;
        let service = TokenService::new(&config);

        let token = service.mint(&test_user(), TokenKind::Access).unwrap();
        assert_eq!(
            service.verify(&token, TokenKind::Access).unwrap_err(),
            AuthError::TokenExpired
        );
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = TokenService::new(&test_config());
        let token = service.mint(&test_user(), TokenKind::Access).unwrap();

        // Flip a character in the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'a' { 'b' } else { 'a' });

        assert_eq!(
            service.verify(&tampered, TokenKind::Access).unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = TokenService::new(&test_config());
        assert_eq!(
            service.verify("not.a.jwt", TokenKind::Access).unwrap_err(),
            AuthError::TokenInvalid
        );
    }

    #[test]
    fn test_pair_carries_both_kinds() {
        let service = TokenService::new(&test_config());
        let user = test_user();

        let pair = service.mint_pair(&user).unwrap();
        assert!(service.verify(&pair.access_token, TokenKind::Access).is_ok());
        assert!(service.verify(&pair.refresh_token, TokenKind::Refresh).is_ok());
    }
}
