//! HTTP handlers for students.

use super::{Listing, SearchQuery, form::FormData, record_path::RecordPath, session::CurrentUser};
use crate::{
    errors::AppResult,
    models::student::{StudentDetail, StudentInput},
    services::record_service::RecordService,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// `GET /students?q=`: search by first name, last name or email.
pub async fn list_students(
    _user: CurrentUser,
    State(records): State<RecordService>,
    Query(search): Query<SearchQuery>,
) -> AppResult<Json<Listing<StudentDetail>>> {
    let students = records.list_students(search.q.as_deref()).await?;
    Ok(Json(Listing::new(search.q, students)))
}

pub async fn get_student(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
) -> AppResult<Json<StudentDetail>> {
    Ok(Json(records.get_student(id).await?))
}

pub async fn add_student(
    _user: CurrentUser,
    State(records): State<RecordService>,
    form: FormData,
) -> AppResult<(StatusCode, Json<StudentDetail>)> {
    let input = StudentInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let student = records
        .create_student(input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn edit_student(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
    form: FormData,
) -> AppResult<Json<StudentDetail>> {
    let input = StudentInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let student = records
        .update_student(id, input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok(Json(student))
}

/// Cascades to the student's enrollments and metadata links.
pub async fn delete_student(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
) -> AppResult<StatusCode> {
    records.delete_student(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
