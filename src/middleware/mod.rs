//! Request extractors for bearer authentication.

pub mod auth;

pub use auth::{AdminUser, AuthUser};
