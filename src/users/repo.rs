use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};

use super::{NewUser, StoreError, UniqueField, User, UserStore};

const EMAIL_INDEX: &str = "users_email_active_key";
const PHONE_INDEX: &str = "users_phone_number_active_key";

/// PostgreSQL-backed user store. Uniqueness is enforced by the partial unique
/// indexes created in `migrations/`, so concurrent inserts cannot both win.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Maps a unique-index name reported by Postgres to the field it guards.
fn unique_field(constraint: Option<&str>) -> Option<UniqueField> {
    match constraint? {
        EMAIL_INDEX => Some(UniqueField::Email),
        PHONE_INDEX => Some(UniqueField::PhoneNumber),
        _ => None,
    }
}

fn classify_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = unique_field(db_err.constraint()) {
                return StoreError::ConstraintViolation(field);
            }
        }
    }
    StoreError::StorageFailure(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        debug!(email = %new_user.email, "inserting user");
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, date_of_birth, email, password_hash, phone_number)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, last_name, date_of_birth, email, password_hash,
                      phone_number, created_at, updated_at, deleted_at
            "#,
        )
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.date_of_birth)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.phone_number.as_deref())
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            let err = classify_insert_error(e);
            if matches!(err, StoreError::StorageFailure(_)) {
                error!(error = %err, email = %new_user.email, "insert user failed");
            }
            err
        })?;

        debug!(user_id = %user.id, "user inserted");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, date_of_birth, email, password_hash,
                   phone_number, created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        debug!(email, found = user.is_some(), "user lookup by email");
        Ok(user)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)"#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await?;
        debug!(email, exists, "user existence check");
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_field_maps_known_indexes() {
        assert_eq!(unique_field(Some(EMAIL_INDEX)), Some(UniqueField::Email));
        assert_eq!(unique_field(Some(PHONE_INDEX)), Some(UniqueField::PhoneNumber));
    }

    #[test]
    fn unique_field_ignores_unrelated_constraints() {
        assert_eq!(unique_field(Some("users_pkey")), None);
        assert_eq!(unique_field(None), None);
    }

    #[test]
    fn non_database_errors_are_storage_failures() {
        let err = classify_insert_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::StorageFailure(_)));
    }
}
