//! Business rules: credential validation and password strength.

pub mod credentials;
pub mod password_policy;

pub use credentials::{validate_registration, validate_update, RegistrationInput};
