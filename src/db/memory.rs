//! In-process `UserStore`, used where Postgres is not available (tests).

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::UserStore;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{NewUser, User, UserChanges, MSG_EMAIL_TAKEN, MSG_USERNAME_TAKEN};

/// Users kept in insertion order behind one lock; uniqueness is checked and
/// the write applied while holding it.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Vec<User>>> {
        self.users
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("user store lock poisoned")))
    }
}

fn conflicts(users: &[User], username: &str, email: &str, except: Option<Uuid>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let others = || users.iter().filter(|u| Some(u.id) != except);
    if others().any(|u| u.username == username) {
        errors.add("username", MSG_USERNAME_TAKEN);
    }
    if others().any(|u| u.email == email) {
        errors.add("email", MSG_EMAIL_TAKEN);
    }
    errors
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.lock()?;
        conflicts(&users, &user.username, &user.email, None).into_result()?;
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            is_active: user.is_active,
            date_joined: Utc::now(),
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.lock()?.iter().find(|u| u.username == username).cloned())
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .lock()?
            .iter()
            .any(|u| u.username == username && Some(u.id) != except))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .lock()?
            .iter()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        Ok(self.lock()?.clone())
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let mut users = self.lock()?;
        let Some(index) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let mut updated = users[index].clone();
        changes.apply(&mut updated);
        conflicts(&users, &updated.username, &updated.email, Some(id)).into_result()?;
        users[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut users = self.lock()?;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            is_staff: false,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicates() {
        let store = MemoryUserStore::new();
        store.insert(new_user("alice", "alice@example.com")).await.unwrap();

        let err = store
            .insert(new_user("alice", "other@example.com"))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(errors) => {
                assert!(errors.has("username"));
                assert!(!errors.has("email"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = store
            .insert(new_user("bob", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.has("email")));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn taken_checks_honor_except() {
        let store = MemoryUserStore::new();
        let alice = store.insert(new_user("alice", "alice@example.com")).await.unwrap();
        assert!(store.username_taken("alice", None).await.unwrap());
        assert!(!store.username_taken("alice", Some(alice.id)).await.unwrap());
        assert!(store.email_taken("alice@example.com", None).await.unwrap());
        assert!(!store.email_taken("bob@example.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let store = MemoryUserStore::new();
        let alice = store.insert(new_user("alice", "alice@example.com")).await.unwrap();
        store.insert(new_user("bob", "bob@example.com")).await.unwrap();

        let changes = UserChanges {
            email: Some("bob@example.com".to_string()),
            ..Default::default()
        };
        assert!(store.update(alice.id, changes).await.is_err());

        let changes = UserChanges {
            username: Some("alice2".to_string()),
            is_staff: Some(true),
            ..Default::default()
        };
        let updated = store.update(alice.id, changes).await.unwrap().unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.email, "alice@example.com");
        assert!(updated.is_staff);

        assert!(store.update(Uuid::new_v4(), UserChanges::default()).await.unwrap().is_none());
        assert!(store.delete(alice.id).await.unwrap());
        assert!(!store.delete(alice.id).await.unwrap());
        assert!(store.get(alice.id).await.unwrap().is_none());
    }
}
