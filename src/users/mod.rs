//! Persistence of user records.
//!
//! The [`UserStore`] trait is the only thing the auth service depends on, so a
//! PostgreSQL store and the in-memory test store are interchangeable.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
pub mod memory;
pub mod repo;
mod repo_types;

pub use repo::PgUserStore;
pub use repo_types::{NewUser, UniqueField, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A live user already owns this email or phone number.
    #[error("unique constraint violated on {0}")]
    ConstraintViolation(UniqueField),
    #[error("storage failure: {0}")]
    StorageFailure(#[from] sqlx::Error),
}

/// Storage and lookup of users. Soft-deleted users are invisible to every
/// operation here.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Must reject duplicates atomically, independent of any
    /// earlier `exists_by_email` call.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;
}
