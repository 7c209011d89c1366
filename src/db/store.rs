//! The user store seam: handlers only ever see `dyn UserStore`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewUser, User, UserChanges};

/// Persistent user records with store-enforced username and email uniqueness.
///
/// `insert` and `update` report a uniqueness conflict as
/// `AppError::Validation` on the offending field, so a request that loses a
/// registration race sees the same error as one caught by the validator.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> AppResult<User>;

    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Whether another user (not `except`) already holds `username`.
    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> AppResult<bool>;

    /// Whether another user (not `except`) already holds `email`.
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool>;

    /// All users, oldest first.
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Returns `None` when no user has `id`.
    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>>;

    /// Returns `false` when no user has `id`.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}
