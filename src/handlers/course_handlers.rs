use super::{Listing, SearchQuery, form::FormData, record_path::RecordPath, session::CurrentUser};
use crate::{
    errors::AppResult,
    models::course::{CourseDetail, CourseInput},
    services::record_service::RecordService,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use uuid::Uuid;

/// `GET /courses?q=`: search by name or course code.
pub async fn list_courses(
    _user: CurrentUser,
    State(records): State<RecordService>,
    Query(search): Query<SearchQuery>,
) -> AppResult<Json<Listing<CourseDetail>>> {
    let courses = records.list_courses(search.q.as_deref()).await?;
    Ok(Json(Listing::new(search.q, courses)))
}

pub async fn get_course(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
) -> AppResult<Json<CourseDetail>> {
    Ok(Json(records.get_course(id).await?))
}

pub async fn add_course(
    _user: CurrentUser,
    State(records): State<RecordService>,
    form: FormData,
) -> AppResult<(StatusCode, Json<CourseDetail>)> {
    let input = CourseInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let course = records
        .create_course(input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn edit_course(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
    form: FormData,
) -> AppResult<Json<CourseDetail>> {
    let input = CourseInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let course = records
        .update_course(id, input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok(Json(course))
}

pub async fn delete_course(
    _user: CurrentUser,
    State(records): State<RecordService>,
    RecordPath(id): RecordPath<Uuid>,
) -> AppResult<StatusCode> {
    records.delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
