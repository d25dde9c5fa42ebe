use crate::services::{auth_service::AuthService, record_service::RecordService};
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub records: RecordService,
    pub auth: AuthService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, password_cost: u32, secure_cookies: bool) -> Self {
        Self {
            records: RecordService::new(db.clone()),
            auth: AuthService::new(db, password_cost),
            secure_cookies,
        }
    }
}

impl FromRef<AppState> for RecordService {
    fn from_ref(state: &AppState) -> Self {
        state.records.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
