//! Postgres-backed `UserStore`.

use async_trait::async_trait;
use uuid::Uuid;

use super::pool::{DbPool, EMAIL_CONSTRAINT, USERNAME_CONSTRAINT};
use super::store::UserStore;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{NewUser, User, UserChanges, MSG_EMAIL_TAKEN, MSG_USERNAME_TAKEN};

const USER_COLUMNS: &str = "id, username, email, password_hash, is_staff, is_active, date_joined";

#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Translate a unique-constraint violation into a field error.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => {
                    return AppError::Validation(FieldErrors::single("username", MSG_USERNAME_TAKEN))
                }
                Some(EMAIL_CONSTRAINT) => {
                    return AppError::Validation(FieldErrors::single("email", MSG_EMAIL_TAKEN))
                }
                _ => {}
            }
        }
    }
    AppError::Db(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, is_staff, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.is_staff)
            .bind(user.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY date_joined ASC, id ASC");
        let rows = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                is_staff = COALESCE($5, is_staff),
                is_active = COALESCE($6, is_active)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.is_staff)
            .bind(changes.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let r = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected() > 0)
    }
}
