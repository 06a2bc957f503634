//! Failures of the signup and login workflows.

use thiserror::Error;

use crate::users::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user with this email already exists")]
    UserAlreadyExists,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,
    #[error("failed to generate token")]
    TokenGeneration(#[source] jsonwebtoken::errors::Error),
    /// Hashing or verification could not run, e.g. a corrupt stored hash.
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// True for the two login failures that must look identical to clients.
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, AuthError::UserNotFound | AuthError::InvalidPassword)
    }
}
