//! Bearer-token extractors for authenticated and admin callers.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

use crate::auth::{TokenKind, MSG_TOKEN_EXPIRED};
use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::User;

pub const MSG_NO_CREDENTIALS: &str = "Authentication credentials were not provided.";

/// Extractor: the active user named by a valid access token (Bearer).
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Auth(MSG_NO_CREDENTIALS.to_string()))?;

        let user_id = state
            .tokens()
            .verify(bearer.token(), TokenKind::Access)
            .map_err(|e| {
                debug!(error = %e, "rejected bearer token");
                AppError::Auth(MSG_TOKEN_EXPIRED.to_string())
            })?;

        match state.users().get(user_id).await? {
            Some(user) if user.is_active => Ok(AuthUser(user)),
            _ => Err(AppError::Auth(MSG_TOKEN_EXPIRED.to_string())),
        }
    }
}

/// Extractor: an authenticated caller with `is_staff` set.
///
/// Put it before any body extractor so non-admins are refused before the
/// payload is looked at.
#[derive(Clone, Debug)]
pub struct AdminUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_staff {
            debug!(user_id = %user.id, "non-admin refused");
            return Err(AppError::Permission);
        }
        Ok(AdminUser(user))
    }
}
