//! Shared application state and the health probe.

use std::sync::Arc;

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::db::UserStore;

/// Shared application state: the injected collaborators every handler uses.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }
    pub fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }
    pub fn tokens(&self) -> &dyn TokenIssuer {
        self.tokens.as_ref()
    }
}

/// GET /health (liveness probe).
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "matilda" })),
    )
}
