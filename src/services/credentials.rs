//! Credential validation for registration and admin user writes.
//!
//! Field checks run for every field and all failures are reported together.
//! The password confirmation is compared only once every field is valid.

use serde::Deserialize;
use uuid::Uuid;
use validator::ValidateEmail;

use crate::db::UserStore;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{User, MSG_EMAIL_TAKEN, MSG_USERNAME_TAKEN};
use crate::services::password_policy;

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;

pub const MSG_REQUIRED: &str = "This field is required.";
pub const MSG_BLANK: &str = "This field may not be blank.";
pub const MSG_INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const MSG_INVALID_EMAIL: &str = "Enter a valid email address.";
pub const MSG_PASSWORD_MISMATCH: &str = "Passwords don't match.";

/// Raw registration payload. Every field is optional here so that a missing
/// field is reported as a field error rather than a body rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "password2")]
    pub password_confirmation: Option<String>,
}

/// Registration attributes that passed validation. `password` is still plaintext.
#[derive(Debug, Clone)]
pub struct ValidatedUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validated subset of an update; `None` fields were not supplied.
#[derive(Debug, Clone, Default)]
pub struct ValidatedChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Validate a new account: all four fields are required.
pub async fn validate_registration(
    users: &dyn UserStore,
    input: &RegistrationInput,
) -> AppResult<ValidatedUser> {
    let changes = validate_fields(users, input, None, false).await?;
    match (changes.username, changes.email, changes.password) {
        (Some(username), Some(email), Some(password)) => Ok(ValidatedUser {
            username,
            email,
            password,
        }),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "full validation returned incomplete attributes"
        ))),
    }
}

/// Validate changes to `current`. With `partial`, absent fields are left alone;
/// otherwise they are required as on registration.
pub async fn validate_update(
    users: &dyn UserStore,
    current: &User,
    input: &RegistrationInput,
    partial: bool,
) -> AppResult<ValidatedChanges> {
    validate_fields(users, input, Some(current), partial).await
}

async fn validate_fields(
    users: &dyn UserStore,
    input: &RegistrationInput,
    current: Option<&User>,
    partial: bool,
) -> AppResult<ValidatedChanges> {
    let mut errors = FieldErrors::new();
    let except = current.map(|u| u.id);

    let username = present(&mut errors, "username", input.username.as_deref(), partial, true);
    if let Some(username) = username {
        if username.chars().count() > USERNAME_MAX_LEN {
            errors.add("username", max_len_message(USERNAME_MAX_LEN));
        } else if !is_valid_username(username) {
            errors.add("username", MSG_INVALID_USERNAME);
        } else if users.username_taken(username, except).await? {
            errors.add("username", MSG_USERNAME_TAKEN);
        }
    }
    let username_ok = !errors.has("username");

    let email = present(&mut errors, "email", input.email.as_deref(), partial, true);
    if let Some(email) = email {
        if email.chars().count() > EMAIL_MAX_LEN {
            errors.add("email", max_len_message(EMAIL_MAX_LEN));
        } else if !email.validate_email() {
            errors.add("email", MSG_INVALID_EMAIL);
        } else if users.email_taken(email, except).await? {
            errors.add("email", MSG_EMAIL_TAKEN);
        }
    }
    let email_ok = !errors.has("email");

    let password = present(&mut errors, "password", input.password.as_deref(), partial, false);
    if let Some(password) = password {
        // Only values that passed their own checks are compared.
        let username_attr = if username_ok {
            username.or(current.map(|u| u.username.as_str()))
        } else {
            None
        };
        let email_attr = if email_ok {
            email.or(current.map(|u| u.email.as_str()))
        } else {
            None
        };
        let mut attributes = Vec::with_capacity(2);
        if let Some(value) = username_attr {
            attributes.push(("username", value));
        }
        if let Some(value) = email_attr {
            attributes.push(("email", value));
        }
        for problem in password_policy::check(password, &attributes) {
            errors.add("password", problem);
        }
    }

    // A new password always needs its confirmation, even in a partial update.
    let confirmation = present(
        &mut errors,
        "password_confirmation",
        input.password_confirmation.as_deref(),
        partial && password.is_none(),
        false,
    );

    errors.into_result()?;

    if let Some(password) = password {
        if confirmation != Some(password) {
            return Err(AppError::Validation(FieldErrors::single(
                "password",
                MSG_PASSWORD_MISMATCH,
            )));
        }
    }

    Ok(ValidatedChanges {
        username: username.map(str::to_string),
        email: email.map(str::to_string),
        password: password.map(str::to_string),
    })
}

/// The usable value of a field, recording "required"/"blank" errors.
fn present<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
    optional: bool,
    trim: bool,
) -> Option<&'a str> {
    match value {
        None => {
            if !optional {
                errors.add(field, MSG_REQUIRED);
            }
            None
        }
        Some(raw) => {
            let value = if trim { raw.trim() } else { raw };
            if value.is_empty() {
                errors.add(field, MSG_BLANK);
                None
            } else {
                Some(value)
            }
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn max_len_message(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}
