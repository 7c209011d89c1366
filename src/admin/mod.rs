//! Admin-only CRUD over user records.

mod handlers;

pub use handlers::{
    create_user, delete_user, get_user, list_users, partial_update_user, update_user,
    AdminUserRequest,
};
