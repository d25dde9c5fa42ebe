//! AuthService: user accounts and cookie sessions stored in SQLite.
//!
//! Passwords are hashed with bcrypt on the blocking pool. A session is a
//! random token row tied to a user; resetting a password drops every session
//! the user holds.

use super::error::is_unique_violation;
use crate::{
    db,
    models::user::{LoginInput, RegisterInput, ResetPasswordInput, User},
    validation::{FieldErrors, REQUIRED, is_valid_email},
};
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use sqlx::SqlitePool;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

const USERNAME_MAX_LEN: usize = 150;
/// Sessions older than this many days are treated as signed out.
pub const SESSION_LIFETIME_DAYS: i64 = 14;

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Hashing(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Unexpected(#[from] sqlx::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Clone)]
pub struct AuthService {
    pub db: Arc<SqlitePool>,
    password_cost: u32,
}

impl AuthService {
    pub fn new(db: Arc<SqlitePool>, password_cost: u32) -> Self {
        Self { db, password_cost }
    }

    pub async fn register(&self, input: RegisterInput) -> AuthResult<User> {
        let mut errors = FieldErrors::new();
        let username = input.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                format!("Ensure this value has at most {USERNAME_MAX_LEN} characters."),
            );
        } else if !USERNAME_RE.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if self.find_user(&username).await?.is_some() {
            errors.add("username", DUPLICATE_USERNAME);
        }

        let email = input
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        if let Some(email) = &email {
            if !is_valid_email(email) {
                errors.add("email", "Enter a valid email address.");
            }
        }

        if input.password.is_empty() {
            errors.add("password", REQUIRED);
        } else if input.password != input.confirm_password {
            errors.add(
                "confirm_password",
                "Password and confirm password do not match.",
            );
        }
        errors.into_result().map_err(AuthError::Validation)?;

        let user = User {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash: hash_password(input.password, self.password_cost).await?,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&*self.db)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AuthError::Validation(FieldErrors::single("username", DUPLICATE_USERNAME))
            } else {
                AuthError::Unexpected(err)
            }
        })?;

        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Check credentials and open a session. Returns the user and the new
    /// session token.
    pub async fn login(&self, input: &LoginInput) -> AuthResult<(User, String)> {
        let user = self.authenticate(&input.username, &input.password).await?;

        let now = Utc::now();
        let pruned = sqlx::query("DELETE FROM sessions WHERE created_at <= ?")
            .bind(session_cutoff(now))
            .execute(&*self.db)
            .await?
            .rows_affected();
        if pruned > 0 {
            debug!(pruned, "expired sessions removed");
        }

        let token = Uuid::new_v4().simple().to_string();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user.id)
            .bind(now)
            .execute(&*self.db)
            .await?;

        info!(user_id = %user.id, "session opened");
        Ok((user, token))
    }

    /// Resolve a session token to its user. Expired sessions resolve to
    /// nobody.
    pub async fn session_user(&self, token: &str) -> AuthResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.password_hash, u.created_at \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = ? AND s.created_at > ?",
        )
        .bind(token)
        .bind(session_cutoff(Utc::now()))
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }

    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&*self.db)
            .await?;
        Ok(())
    }

    /// Re-authenticate with the old password, store the new one and close
    /// every session of the user.
    pub async fn reset_password(&self, user: &User, input: ResetPasswordInput) -> AuthResult<()> {
        if !verify_password(input.old_password, user.password_hash.clone()).await? {
            return Err(AuthError::Validation(FieldErrors::single(
                "old_password",
                "Invalid old password.",
            )));
        }
        if input.new_password.is_empty() {
            return Err(AuthError::Validation(FieldErrors::single(
                "new_password",
                REQUIRED,
            )));
        }

        let hash = hash_password(input.new_password, self.password_cost).await?;
        let mut tx = db::begin_write(&self.db).await?;
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(&hash)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(user_id = %user.id, "password reset, sessions closed");
        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> AuthResult<User> {
        let user = self
            .find_user(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if verify_password(password.to_string(), user.password_hash.clone()).await? {
            Ok(user)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn find_user(&self, username: &str) -> AuthResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&*self.db)
        .await?;
        Ok(user)
    }
}

fn session_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - TimeDelta::days(SESSION_LIFETIME_DAYS)
}

async fn hash_password(password: String, cost: u32) -> AuthResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// A hash that fails to parse counts as a mismatch.
async fn verify_password(password: String, hash: String) -> AuthResult<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await?;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        let pool = db::connect_in_memory().await.unwrap();
        AuthService::new(Arc::new(pool), 4)
    }

    async fn signed_in(auth: &AuthService) -> (User, String) {
        auth.register(RegisterInput {
            username: "registrar".into(),
            email: None,
            password: "correct-horse".into(),
            confirm_password: "correct-horse".into(),
        })
        .await
        .unwrap();
        auth.login(&LoginInput {
            username: "registrar".into(),
            password: "correct-horse".into(),
            next: None,
        })
        .await
        .unwrap()
    }

    async fn age_sessions(auth: &AuthService, days: i64) {
        sqlx::query("UPDATE sessions SET created_at = ?")
            .bind(Utc::now() - TimeDelta::days(days))
            .execute(&*auth.db)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn sessions_expire_after_their_lifetime() {
        let auth = service().await;
        let (user, token) = signed_in(&auth).await;
        assert_eq!(auth.session_user(&token).await.unwrap().unwrap().id, user.id);

        age_sessions(&auth, SESSION_LIFETIME_DAYS - 1).await;
        assert!(auth.session_user(&token).await.unwrap().is_some());

        age_sessions(&auth, SESSION_LIFETIME_DAYS + 1).await;
        assert!(auth.session_user(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_prunes_expired_sessions() {
        let auth = service().await;
        let (_, stale) = signed_in(&auth).await;
        age_sessions(&auth, SESSION_LIFETIME_DAYS + 1).await;

        let (_, fresh) = auth
            .login(&LoginInput {
                username: "registrar".into(),
                password: "correct-horse".into(),
                next: None,
            })
            .await
            .unwrap();

        let tokens: Vec<String> = sqlx::query_scalar("SELECT token FROM sessions")
            .fetch_all(&*auth.db)
            .await
            .unwrap();
        assert_eq!(tokens, vec![fresh]);
        assert!(!tokens.contains(&stale));
    }
}
