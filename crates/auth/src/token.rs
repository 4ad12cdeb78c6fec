//! Token service with independent access and refresh signing keys.

use chrono::{Duration, Utc};
use common::UserId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Caller role carried in token claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

/// Which flow a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub sub: UserId,
    pub role: Role,
    #[serde(rename = "use")]
    pub token_use: TokenUse,
    pub iat: i64,
    pub exp: i64,
}

/// An access/refresh token pair issued together.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signing configuration, injected at process start.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Creates a config with the standard expiries (30 min / 365 days).
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::minutes(30),
            refresh_ttl: Duration::days(365),
        }
    }
}

/// Issues and validates HS256-signed bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Creates a service from explicit configuration.
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    fn claims(&self, user: UserId, role: Role, token_use: TokenUse, ttl: Duration) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user,
            role,
            token_use,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Issues a new access token.
    pub fn issue_access(&self, user: UserId, role: Role) -> Result<String, AuthError> {
        let claims = self.claims(user, role, TokenUse::Access, self.access_ttl);
        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    /// Issues a new refresh token.
    pub fn issue_refresh(&self, user: UserId, role: Role) -> Result<String, AuthError> {
        let claims = self.claims(user, role, TokenUse::Refresh, self.refresh_ttl);
        Ok(encode(&Header::default(), &claims, &self.refresh_encoding)?)
    }

    /// Issues an access/refresh pair for a freshly authenticated user.
    pub fn issue_pair(&self, user: UserId, role: Role) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue_access(user, role)?,
            refresh_token: self.issue_refresh(user, role)?,
        })
    }

    /// Validates an access token and returns its claims.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &self.access_decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.token_use != TokenUse::Access {
            return Err(AuthError::WrongTokenUse);
        }
        Ok(data.claims)
    }

    /// Validates a refresh token and returns its claims.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(
            token,
            &self.refresh_decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.token_use != TokenUse::Refresh {
            return Err(AuthError::WrongTokenUse);
        }
        Ok(data.claims)
    }

    /// Exchanges a valid refresh token for a fresh access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verify_refresh(refresh_token)?;
        self.issue_access(claims.sub, claims.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&TokenConfig::new("access-secret", "refresh-secret"))
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = service();
        let user = UserId::new();

        let token = service.issue_access(user, Role::Customer).unwrap();
        let claims = service.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.token_use, TokenUse::Access);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let service = service();
        let token = service.issue_refresh(UserId::new(), Role::Customer).unwrap();

        // Signed with a different secret, so signature validation fails
        // before the token-use check even runs.
        assert!(service.verify_access(&token).is_err());
    }

    #[test]
    fn test_refresh_exchange_yields_valid_access_token() {
        let service = service();
        let user = UserId::new();
        let pair = service.issue_pair(user, Role::Admin).unwrap();

        let access = service.refresh(&pair.refresh_token).unwrap();
        let claims = service.verify_access(&access).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_access_token_rejected_for_refresh() {
        let service = service();
        let pair = service.issue_pair(UserId::new(), Role::Customer).unwrap();

        assert!(service.refresh(&pair.access_token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = TokenConfig {
            access_secret: "s1".to_string(),
            refresh_secret: "s2".to_string(),
            access_ttl: Duration::seconds(-120),
            refresh_ttl: Duration::days(1),
        };
        let service = TokenService::new(&config);

        let token = service.issue_access(UserId::new(), Role::Customer).unwrap();
        assert!(matches!(
            service.verify_access(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service = service();
        let other = TokenService::new(&TokenConfig::new("other", "other"));

        let token = other.issue_access(UserId::new(), Role::Admin).unwrap();
        assert!(service.verify_access(&token).is_err());
    }
}
