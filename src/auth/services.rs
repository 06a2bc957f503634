//! Signup and login workflows.
//!
//! The service owns the business rules and the cryptographic policy; storage
//! is reached only through [`UserStore`]. It keeps no mutable state, so one
//! instance is shared by every request.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use crate::auth::errors::AuthError;
use crate::auth::jwt::{JwtKeys, SessionToken};
use crate::auth::password::{verify_password, PasswordHasher};
use crate::users::{NewUser, StoreError, User, UserStore};

/// Input for [`AuthService::sign_up`]. Holds the plaintext password only until
/// it is hashed.
#[derive(Debug, Clone)]
pub struct SignUpParams {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<OffsetDateTime>,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip_all, fields(email = %params.email))]
    pub async fn sign_up(&self, params: SignUpParams) -> Result<User, AuthError> {
        debug!("starting user signup");

        let exists = self.store.exists_by_email(&params.email).await.map_err(|e| {
            error!(error = %e, "failed to check if user exists");
            e
        })?;
        if exists {
            warn!("email already registered");
            return Err(AuthError::UserAlreadyExists);
        }

        let SignUpParams {
            first_name,
            last_name,
            date_of_birth,
            email,
            password,
            phone_number,
        } = params;

        let password_hash = self.hash(password).await?;

        let new_user = NewUser {
            first_name,
            last_name,
            date_of_birth,
            email,
            password_hash,
            phone_number,
        };

        match self.store.create(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, "user signup completed");
                Ok(user)
            }
            // Lost a race with a concurrent signup; the unique index decided.
            Err(StoreError::ConstraintViolation(field)) => {
                warn!(%field, "insert rejected by unique constraint");
                Err(AuthError::UserAlreadyExists)
            }
            Err(e) => {
                error!(error = %e, "failed to create user");
                Err(e.into())
            }
        }
    }

    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, AuthError> {
        debug!("starting user login");

        let user = self
            .store
            .find_by_email(email)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to get user by email");
                e
            })?
            .ok_or_else(|| {
                debug!("user not found");
                AuthError::UserNotFound
            })?;

        if !self.verify(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "invalid password");
            return Err(AuthError::InvalidPassword);
        }

        let session = self.keys.sign(user.id).map_err(|e| {
            error!(error = %e, user_id = %user.id, "failed to sign token");
            AuthError::TokenGeneration(e)
        })?;

        info!(user_id = %user.id, "user authenticated");
        Ok(session)
    }

    /// Argon2 is intentionally slow, so it runs on the blocking pool.
    async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn test_service(store: Arc<dyn UserStore>) -> AuthService {
    use crate::auth::{jwt::test_keys, password::test_hasher};
    AuthService::new(store, test_hasher(), test_keys())
}
