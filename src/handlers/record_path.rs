//! Path parameters with rejections rendered like every other failure.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// `Path<T>` whose rejection is an [`AppError`] JSON body.
#[derive(Debug, Clone, Copy)]
pub struct RecordPath<T>(pub T);

impl<S, T> FromRequestParts<S> for RecordPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;
        Ok(Self(value))
    }
}
