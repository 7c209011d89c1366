//! Admin user management over HTTP. Every handler takes `AdminUser` first.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::AdminUser;
use crate::models::{NewUser, User, UserChanges, UserResponse};
use crate::services::credentials::{self, RegistrationInput};

/// Body for admin create/update: registration fields plus account flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminUserRequest {
    #[serde(flatten)]
    pub credentials: RegistrationInput,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let rows = state.users().list().await?;
    Ok(Json(rows.into_iter().map(UserResponse::from).collect()))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Json(body), _): WithRejection<Json<AdminUserRequest>, AppError>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let valid = credentials::validate_registration(state.users(), &body.credentials).await?;
    let password_hash = state.hasher().hash(&valid.password)?;
    let user = state
        .users()
        .insert(NewUser {
            username: valid.username,
            email: valid.email,
            password_hash,
            is_staff: body.is_staff.unwrap_or(false),
            is_active: body.is_active.unwrap_or(true),
        })
        .await?;

    info!(admin_id = %admin.id, user_id = %user.id, "admin created user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /admin/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = load(&state, &id).await?;
    Ok(Json(user.into()))
}

/// PUT /admin/users/:id: every credential field must be supplied.
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<AdminUserRequest>, AppError>,
) -> Result<Json<UserResponse>, AppError> {
    apply_update(&state, &admin, &id, body, false).await.map(Json)
}

/// PATCH /admin/users/:id: only supplied fields change.
pub async fn partial_update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<AdminUserRequest>, AppError>,
) -> Result<Json<UserResponse>, AppError> {
    apply_update(&state, &admin, &id, body, true).await.map(Json)
}

/// DELETE /admin/users/:id
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    if !state.users().delete(id).await? {
        return Err(AppError::NotFound);
    }
    info!(admin_id = %admin.id, user_id = %id, "admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_update(
    state: &AppState,
    admin: &User,
    id: &str,
    body: AdminUserRequest,
    partial: bool,
) -> Result<UserResponse, AppError> {
    let current = load(state, id).await?;
    let valid = credentials::validate_update(state.users(), &current, &body.credentials, partial).await?;

    let password_hash = match valid.password {
        Some(password) => Some(state.hasher().hash(&password)?),
        None => None,
    };
    let changes = UserChanges {
        username: valid.username,
        email: valid.email,
        password_hash,
        is_staff: body.is_staff,
        is_active: body.is_active,
    };

    let user = state
        .users()
        .update(current.id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(admin_id = %admin.id, user_id = %user.id, partial, "admin updated user");
    Ok(user.into())
}

async fn load(state: &AppState, id: &str) -> Result<User, AppError> {
    let id = parse_id(id)?;
    state.users().get(id).await?.ok_or(AppError::NotFound)
}

/// Malformed ids name no user, so they are a 404 like unknown ones.
fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::NotFound)
}
