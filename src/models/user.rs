//! Accounts allowed to sign in to the administration interface.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Serialize, Clone, FromRow, Debug)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,

    /// bcrypt hash; never serialized.
    #[serde(skip)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct RegisterInput {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Clone, Debug)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    /// Where to send the browser after signing in.
    pub next: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ResetPasswordInput {
    pub old_password: String,
    pub new_password: String,
}
