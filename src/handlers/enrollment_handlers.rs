//! HTTP handlers for a student's enrollments.
//!
//! Every route is nested under `/students/{id}`; an enrollment reached
//! through another student's path is reported as not found.

use super::{Listing, SearchQuery, form::FormData, record_path::RecordPath, session::CurrentUser};
use crate::{
    errors::AppResult,
    models::enrollment::{EnrollmentDetail, EnrollmentInput},
    services::record_service::RecordService,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use uuid::Uuid;

pub async fn list_enrollments(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(student_id): RecordPath<Uuid>,
    Query(search): Query<SearchQuery>,
) -> AppResult<Json<Listing<EnrollmentDetail>>> {
    let enrollments = records
        .list_enrollments(student_id, search.q.as_deref())
        .await?;
    Ok(Json(Listing::new(search.q, enrollments)))
}

pub async fn get_enrollment(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath((student_id, id)): RecordPath<(Uuid, Uuid)>,
) -> AppResult<Json<EnrollmentDetail>> {
    Ok(Json(records.get_enrollment(student_id, id).await?))
}

pub async fn add_enrollment(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(student_id): RecordPath<Uuid>,
    form: FormData,
) -> AppResult<(StatusCode, Json<EnrollmentDetail>)> {
    let input = EnrollmentInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let enrollment = records
        .create_enrollment(student_id, input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn edit_enrollment(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath((student_id, id)): RecordPath<(Uuid, Uuid)>,
    form: FormData,
) -> AppResult<Json<EnrollmentDetail>> {
    let input = EnrollmentInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let enrollment = records
        .update_enrollment(student_id, id, input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok(Json(enrollment))
}

pub async fn delete_enrollment(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath((student_id, id)): RecordPath<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    records.delete_enrollment(student_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
