//! Authentication: register, login, password hashing, JWT.

pub mod handlers;
mod jwt;
mod password;

pub use handlers::{
    login, refresh, register, MSG_INVALID_CREDENTIALS, MSG_INVALID_TOKEN, MSG_TOKEN_EXPIRED,
};
pub use jwt::{Claims, JwtSecret, TokenIssuer, TokenKind, TokenPair};
pub use password::{Argon2Hasher, PasswordHasher};
