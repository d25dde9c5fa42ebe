use super::session::CurrentUser;
use crate::{
    errors::AppResult,
    services::record_service::{DashboardCounts, RecordService},
};
use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

/// `GET /`: public landing document pointing at the entry points.
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "login": "/login",
        "register": "/register",
        "dashboard": "/dashboard",
    }))
}

/// `GET /dashboard`: totals for each record type.
pub async fn dashboard(
    _user: CurrentUser,
    State(records): State<RecordService>,
) -> AppResult<Json<DashboardCounts>> {
    Ok(Json(records.dashboard().await?))
}
