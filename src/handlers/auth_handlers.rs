//! Account registration, sign-in and sign-out.
//!
//! Sign-in, sign-out and password reset answer with `303 See Other` so a
//! browser form lands on the next page. Failures answer like any other
//! rejected submission, minus the password fields.

use super::{
    form::FormData,
    session::{CurrentUser, expired_cookie, safe_next, session_cookie, session_token},
};
use crate::{
    errors::AppResult,
    models::user::{LoginInput, RegisterInput, ResetPasswordInput, User},
    state::AppState,
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    form: FormData,
) -> AppResult<(StatusCode, Json<User>)> {
    let input = RegisterInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    let user = state
        .auth
        .register(input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /login`. `next` may arrive in the form body or the query string.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    form: FormData,
) -> AppResult<Response> {
    let mut input = LoginInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    if input.next.is_none() {
        input.next = query.next;
    }

    let (user, token) = state.auth.login(&input).await.map_err(|err| form.fail(err))?;
    let target = safe_next(input.next.as_deref());
    tracing::debug!(user_id = %user.id, next = target, "redirecting after login");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token, state.secure_cookies))],
        Redirect::to(target),
    )
        .into_response())
}

/// `POST /logout`: closes the session if one is presented. Always succeeds.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).await?;
    }
    Ok(signed_out(state.secure_cookies))
}

/// `POST /reset-password`: every session of the user is closed, including
/// the current one.
pub async fn reset_password(
    State(state): State<AppState>,
    current: CurrentUser,
    form: FormData,
) -> AppResult<Response> {
    let input = ResetPasswordInput::try_from(&form).map_err(|errors| form.reject(errors))?;
    state
        .auth
        .reset_password(&current.user, input)
        .await
        .map_err(|err| form.fail(err))?;
    Ok(signed_out(state.secure_cookies))
}

pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.user)
}

fn signed_out(secure: bool) -> Response {
    (
        [(header::SET_COOKIE, expired_cookie(secure))],
        Redirect::to("/login"),
    )
        .into_response()
}
