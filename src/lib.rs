//! User accounts API: registration, login and admin user management.
//!
//! Handlers get their collaborators (user store, password hasher, token
//! issuer) from [`AppState`], so any of them can be swapped out.

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::http::AppState;

use axum::routing::{get, post};
use handlers::http;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::models::NewUser;

/// Build the API router (health, auth, admin). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let auth_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh));

    let admin_routes = axum::Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/:id",
            get(admin::get_user)
                .put(admin::update_user)
                .patch(admin::partial_update_user)
                .delete(admin::delete_user),
        );

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the configured staff account unless its username is already taken.
///
/// Returns whether a user was created.
pub async fn ensure_admin(state: &AppState, admin: &BootstrapAdmin) -> AppResult<bool> {
    if state.users().find_by_username(&admin.username).await?.is_some() {
        return Ok(false);
    }
    let input = services::RegistrationInput {
        username: Some(admin.username.clone()),
        email: Some(admin.email.clone()),
        password: Some(admin.password.clone()),
        password_confirmation: Some(admin.password.clone()),
    };
    let valid = services::validate_registration(state.users(), &input).await?;
    let password_hash = state.hasher().hash(&valid.password)?;
    let user = state
        .users()
        .insert(NewUser {
            username: valid.username,
            email: valid.email,
            password_hash,
            is_staff: true,
            is_active: true,
        })
        .await?;
    info!(user_id = %user.id, username = %user.username, "bootstrap admin created");
    Ok(true)
}
