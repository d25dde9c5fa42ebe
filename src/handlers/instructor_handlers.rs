use super::{Listing, SearchQuery, form::FormData, record_path::RecordPath, session::CurrentUser};
use crate::{
    errors::AppResult,
    models::instructor::{InstructorDetail, InstructorInput},
    services::record_service::RecordService,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// `GET /instructors?q=`: matches names, email, or the name of a course
/// the instructor teaches.
pub async fn list_instructors(
    _user: CurrentUser,
    State(records): State<RecordService>,
    Query(search): Query<SearchQuery>,
) -> AppResult<Json<Listing<InstructorDetail>>> {
    let instructors = records.list_instructors(search.q.as_deref()).await?;
    Ok(Json(Listing::new(search.q, instructors)))
}

pub async fn get_instructor(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
) -> AppResult<Json<InstructorDetail>> {
    Ok(Json(records.get_instructor(id).await?))
}

/// The repeated `courses` field carries the full set of taught course ids.
pub async fn add_instructor(
    _user: CurrentUser,
    State(records): State<RecordService>,
    form: FormData,
) -> AppResult<(StatusCode, Json<InstructorDetail>)> {
    let input = InstructorInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let instructor = records
        .create_instructor(input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok((StatusCode::CREATED, Json(instructor)))
}

pub async fn edit_instructor(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
    form: FormData,
) -> AppResult<Json<InstructorDetail>> {
    let input = InstructorInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let instructor = records
        .update_instructor(id, input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok(Json(instructor))
}

pub async fn delete_instructor(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
) -> AppResult<StatusCode> {
    records.delete_instructor(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
