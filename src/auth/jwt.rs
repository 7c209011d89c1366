//! JWT issue and validation.

use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: TokenKind,
}

/// Refresh + access tokens handed out on registration.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Refresh token.
    pub token: String,
    pub access: String,
}

/// Issues and verifies signed bearer tokens for a user identity.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: Uuid, kind: TokenKind) -> AppResult<String>;

    /// Checks signature, expiry and that the token is of `kind`; returns the subject.
    fn verify(&self, token: &str, kind: TokenKind) -> AppResult<Uuid>;

    fn issue_pair(&self, user_id: Uuid) -> AppResult<TokenPair> {
        Ok(TokenPair {
            token: self.issue(user_id, TokenKind::Refresh)?,
            access: self.issue(user_id, TokenKind::Access)?,
        })
    }
}

/// HS256 tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtSecret {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtSecret {
    pub fn new(secret: String, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            secret,
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    fn encode_claims(&self, claims: &Claims) -> AppResult<String> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Jwt(e.to_string()))
    }
}

impl TokenIssuer for JwtSecret {
    fn issue(&self, user_id: Uuid, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.ttl(kind)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            token_type: kind,
        };
        self.encode_claims(&claims)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> AppResult<Uuid> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        validation.leeway = 0;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::Jwt(e.to_string()))?;
        if data.claims.token_type != kind {
            return Err(AppError::Jwt("wrong token type".to_string()));
        }
        let id = Uuid::parse_str(&data.claims.sub).map_err(|e| AppError::Jwt(e.to_string()))?;
        Ok(id)
    }
}
