//! Auth HTTP handlers: register, login, token refresh.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::jwt::{TokenKind, TokenPair};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::handlers::http::AppState;
use crate::models::{NewUser, User};
use crate::services::credentials::{self, RegistrationInput, MSG_BLANK, MSG_REQUIRED};

pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MSG_INVALID_TOKEN: &str = "Invalid token";
pub const MSG_TOKEN_EXPIRED: &str = "Token is invalid or expired";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

pub fn welcome_message(username: &str) -> String {
    format!("Welcome to Matilda, your faithful companion, {}!", username)
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RegistrationInput>, AppError>,
) -> Result<(StatusCode, Json<TokenPair>), AppError> {
    let valid = credentials::validate_registration(state.users(), &body).await?;
    let password_hash = state.hasher().hash(&valid.password)?;

    let user = state
        .users()
        .insert(NewUser {
            username: valid.username,
            email: valid.email,
            password_hash,
            is_staff: false,
            is_active: true,
        })
        .await?;
    let pair = state.tokens().issue_pair(user.id)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(pair)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<LoginResponse>, AppError> {
    let mut errors = FieldErrors::new();
    // Registration stores usernames trimmed.
    let username = required(&mut errors, "username", body.username.as_deref(), true);
    let password = required(&mut errors, "password", body.password.as_deref(), false);
    errors.into_result()?;
    let (Some(username), Some(password)) = (username, password) else {
        return Err(AppError::Credentials(MSG_INVALID_CREDENTIALS.to_string()));
    };

    let user = authenticate(&state, username, password)
        .await?
        .ok_or_else(|| AppError::Credentials(MSG_INVALID_CREDENTIALS.to_string()))?;

    if let Some(token) = body.token.as_deref().filter(|t| !t.is_empty()) {
        match state.tokens().verify(token, TokenKind::Access) {
            Ok(subject) if subject == user.id => {}
            Ok(subject) => {
                debug!(user_id = %user.id, token_subject = %subject, "login token belongs to another user");
                return Err(AppError::Credentials(MSG_INVALID_TOKEN.to_string()));
            }
            Err(e) => {
                debug!(user_id = %user.id, error = %e, "login token rejected");
                return Err(AppError::Credentials(MSG_INVALID_TOKEN.to_string()));
            }
        }
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: welcome_message(&user.username),
    }))
}

/// POST /auth/token/refresh
pub async fn refresh(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<RefreshRequest>, AppError>,
) -> Result<Json<RefreshResponse>, AppError> {
    let user_id = state
        .tokens()
        .verify(&body.refresh, TokenKind::Refresh)
        .map_err(|e| {
            debug!(error = %e, "refresh token rejected");
            AppError::Auth(MSG_TOKEN_EXPIRED.to_string())
        })?;

    match state.users().get(user_id).await? {
        Some(user) if user.is_active => {}
        _ => return Err(AppError::Auth(MSG_TOKEN_EXPIRED.to_string())),
    }

    let access = state.tokens().issue(user_id, TokenKind::Access)?;
    Ok(Json(RefreshResponse { access }))
}

/// Resolve `(username, password)` to an active user.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = state.users().find_by_username(username).await? else {
        debug!(username = %username, "login for unknown username");
        state.hasher().verify_dummy(password)?;
        return Ok(None);
    };
    if !state.hasher().verify(password, &user.password_hash)? {
        debug!(user_id = %user.id, "login with wrong password");
        return Ok(None);
    }
    if !user.is_active {
        debug!(user_id = %user.id, "login for inactive user");
        return Ok(None);
    }
    Ok(Some(user))
}

fn required<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
    trim: bool,
) -> Option<&'a str> {
    match value.map(|v| if trim { v.trim() } else { v }) {
        None => {
            errors.add(field, MSG_REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, MSG_BLANK);
            None
        }
        Some(value) => Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtSecret, PasswordHasher};
    use crate::db::MemoryUserStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Plaintext-prefix hasher that counts how often it is asked to work.
    #[derive(Default)]
    struct CountingHasher {
        calls: AtomicUsize,
    }

    impl CountingHasher {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("counted${}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(hash == format!("counted${}", password))
        }
    }

    async fn state_with_bob() -> (AppState, Arc<CountingHasher>) {
        let hasher = Arc::new(CountingHasher::default());
        let state = AppState::new(
            Arc::new(MemoryUserStore::new()),
            hasher.clone(),
            Arc::new(JwtSecret::new("unit-test-secret-of-32-characters!".to_string(), 300, 600)),
        );
        state
            .users()
            .insert(NewUser {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                password_hash: "counted$Tr1cky-Gr4sshopper".to_string(),
                is_staff: false,
                is_active: true,
            })
            .await
            .unwrap();
        (state, hasher)
    }

    #[tokio::test]
    async fn unknown_username_still_runs_the_hasher() {
        let (state, hasher) = state_with_bob().await;
        assert!(authenticate(&state, "nobody", "Tr1cky-Gr4sshopper")
            .await
            .unwrap()
            .is_none());
        assert_eq!(hasher.calls(), 1);
    }

    #[tokio::test]
    async fn known_username_verifies_once() {
        let (state, hasher) = state_with_bob().await;
        assert!(authenticate(&state, "bob", "wrong-password").await.unwrap().is_none());
        assert_eq!(hasher.calls(), 1);
        let user = authenticate(&state, "bob", "Tr1cky-Gr4sshopper").await.unwrap();
        assert_eq!(user.map(|u| u.username).as_deref(), Some("bob"));
        assert_eq!(hasher.calls(), 2);
    }

    #[test]
    fn required_trims_only_when_asked() {
        let mut errors = FieldErrors::new();
        assert_eq!(required(&mut errors, "username", Some(" bob "), true), Some("bob"));
        assert_eq!(required(&mut errors, "password", Some(" pw "), false), Some(" pw "));
        assert_eq!(required(&mut errors, "username", Some("   "), true), None);
        assert_eq!(errors.get("username"), Some(&[MSG_BLANK.to_string()][..]));
    }
}
