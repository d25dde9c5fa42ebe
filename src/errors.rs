use crate::{
    services::{auth_service::AuthError, error::ServiceError},
    validation::FieldErrors,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{collections::BTreeMap, fmt};

pub type AppResult<T> = Result<T, AppError>;

const UNEXPECTED: &str = "An unexpected error occurred.";

/// An HTTP-facing error: status, message, and for rejected submissions the
/// per-field violations plus the values the caller sent.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub errors: FieldErrors,
    pub submitted: Option<BTreeMap<String, Vec<String>>>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            errors: FieldErrors::new(),
            submitted: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    /// 422 carrying every violated field.
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            errors,
            ..Self::new(StatusCode::UNPROCESSABLE_ENTITY, "Please correct the errors below.")
        }
    }

    /// Attach the submitted form values so the caller can re-display them.
    pub fn with_submitted(mut self, submitted: BTreeMap<String, Vec<String>>) -> Self {
        self.submitted = Some(submitted);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "status": self.status.as_u16()
        });
        if !self.errors.is_empty() {
            body["errors"] = json!(self.errors);
        }
        if let Some(submitted) = self.submitted {
            body["submitted"] = json!(submitted);
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) | ServiceError::Conflict(errors) => {
                AppError::validation(errors)
            }
            ServiceError::NotFound { entity, .. } => {
                let mut entity = entity.to_string();
                if let Some(first) = entity.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                AppError::not_found(format!("{entity} not found."))
            }
            ServiceError::Unexpected(err) => {
                tracing::error!("record operation failed: {}", err);
                AppError::internal(UNEXPECTED)
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => AppError::validation(errors),
            AuthError::InvalidCredentials => {
                AppError::unauthorized("Invalid username or password.")
            }
            other => {
                tracing::error!("auth operation failed: {}", other);
                AppError::internal(UNEXPECTED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn conflicts_render_like_validation_failures() {
        let conflict: AppError =
            ServiceError::Conflict(FieldErrors::single("email", "taken")).into();
        let invalid: AppError =
            ServiceError::Validation(FieldErrors::single("email", "taken")).into();
        assert_eq!(conflict.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(conflict.status, invalid.status);
        assert_eq!(conflict.errors, invalid.errors);
    }

    #[test]
    fn not_found_names_the_entity() {
        let err: AppError = ServiceError::not_found("course", Uuid::nil()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Course not found.");
    }

    #[test]
    fn unexpected_failures_hide_detail() {
        let err: AppError = ServiceError::Unexpected(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, UNEXPECTED);
    }
}
