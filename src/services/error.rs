use crate::validation::FieldErrors;
use thiserror::Error;
use uuid::Uuid;

/// Outcome of a failed record operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One or more fields broke a rule before anything was written.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: Uuid },
    /// A unique constraint rejected the write after the pre-check passed.
    #[error("conflict at commit: {0}")]
    Conflict(FieldErrors),
    #[error(transparent)]
    Unexpected(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    /// Field errors carried by a validation failure or a lost uniqueness race.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) | Self::Conflict(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Return true if SQLx error indicates a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Translate a write failure, attributing a unique violation to `field`.
pub fn conflict_or_unexpected(err: sqlx::Error, field: &str, message: &str) -> ServiceError {
    if is_unique_violation(&err) {
        tracing::warn!("unique constraint lost at commit on `{}`: {}", field, err);
        ServiceError::Conflict(FieldErrors::single(field, message))
    } else {
        ServiceError::Unexpected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn insert_course(pool: &sqlx::SqlitePool, code: &str) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO courses (id, name, course_code) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4())
            .bind("Algorithms")
            .bind(code)
            .execute(pool)
            .await
            .map(|_| ())
    }

    #[tokio::test]
    async fn duplicate_insert_becomes_a_field_conflict() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        insert_course(&pool, "CS101").await.unwrap();

        let err = insert_course(&pool, "CS101").await.unwrap_err();
        assert!(is_unique_violation(&err));

        match conflict_or_unexpected(err, "course_code", "taken") {
            ServiceError::Conflict(errors) => {
                assert_eq!(errors, FieldErrors::single("course_code", "taken"));
            }
            other => panic!("expected a conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_write_failures_stay_unexpected() {
        let pool = crate::db::connect_in_memory().await.unwrap();
        let err = sqlx::query("INSERT INTO courses (id, name) VALUES (?, ?)")
            .bind(Uuid::new_v4())
            .bind("No code")
            .execute(&pool)
            .await
            .unwrap_err();

        assert!(!is_unique_violation(&err));
        assert!(matches!(
            conflict_or_unexpected(err, "course_code", "taken"),
            ServiceError::Unexpected(_)
        ));
    }
}
