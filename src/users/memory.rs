//! In-memory [`UserStore`] for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{NewUser, StoreError, UniqueField, User, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    create_calls: AtomicUsize,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `create` was invoked, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// All rows, including soft-deleted ones.
    pub fn rows(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    /// Marks the live user with this email as deleted. Returns false if none.
    pub fn soft_delete(&self, email: &str) -> bool {
        let mut users = self.users.lock().unwrap();
        match users
            .iter_mut()
            .find(|u| u.email == email && u.deleted_at.is_none())
        {
            Some(user) => {
                let now = OffsetDateTime::now_utc();
                user.deleted_at = Some(now);
                user.updated_at = now;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        let live = users.iter().filter(|u| u.deleted_at.is_none());
        for existing in live {
            if existing.email == new_user.email {
                return Err(StoreError::ConstraintViolation(UniqueField::Email));
            }
            if new_user.phone_number.is_some() && existing.phone_number == new_user.phone_number {
                return Err(StoreError::ConstraintViolation(UniqueField::PhoneNumber));
            }
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            date_of_birth: new_user.date_of_birth,
            email: new_user.email,
            password_hash: new_user.password_hash,
            phone_number: new_user.phone_number,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .any(|u| u.email == email && u.deleted_at.is_none()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, phone: Option<&str>) -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_birth: None,
            email: email.into(),
            password_hash: "hash".into(),
            phone_number: phone.map(Into::into),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com", None)).await.unwrap();
        let err = store.create(new_user("a@x.com", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(UniqueField::Email)));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_phone_but_allows_many_without_phone() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com", Some("+15550001"))).await.unwrap();
        store.create(new_user("b@x.com", None)).await.unwrap();
        store.create(new_user("c@x.com", None)).await.unwrap();
        let err = store
            .create(new_user("d@x.com", Some("+15550001")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation(UniqueField::PhoneNumber)
        ));
    }

    #[tokio::test]
    async fn soft_deleted_users_are_invisible() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@x.com", Some("+15550001"))).await.unwrap();
        assert!(store.soft_delete("a@x.com"));

        assert!(!store.exists_by_email("a@x.com").await.unwrap());
        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());

        // Email and phone are free again; the old row is kept.
        store.create(new_user("a@x.com", Some("+15550001"))).await.unwrap();
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.create(new_user("A@x.com", None)).await.unwrap();
        assert!(store.exists_by_email("A@x.com").await.unwrap());
        assert!(!store.exists_by_email("a@x.com").await.unwrap());
    }
}
