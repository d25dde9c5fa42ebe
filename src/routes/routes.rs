//! Defines routes for the records service.
//!
//! ## Structure
//! - **Public**
//!   - `GET  /`, `/healthz`, `/readyz`
//!   - `POST /register`, `/login`, `/logout`
//!
//! - **Signed in**
//!   - `GET  /dashboard`, `/me`, `POST /reset-password`
//!   - `GET  /students`, `/courses`, `/instructors`: list with `?q=`
//!   - `POST /{kind}/add`, `GET /{kind}/{id}`, `POST /{kind}/{id}/edit`,
//!     `POST /{kind}/{id}/delete`
//!   - the same shape for enrollments under `/students/{id}/enrollments`
//!
//! Static segments such as `add` take priority over `{id}`.

use crate::{
    handlers::{
        auth_handlers::{login, logout, me, register, reset_password},
        course_handlers::{add_course, delete_course, edit_course, get_course, list_courses},
        dashboard_handlers::{dashboard, index},
        enrollment_handlers::{
            add_enrollment, delete_enrollment, edit_enrollment, get_enrollment, list_enrollments,
        },
        health_handlers::{healthz, readyz},
        instructor_handlers::{
            add_instructor, delete_instructor, edit_instructor, get_instructor, list_instructors,
        },
        student_handlers::{add_student, delete_student, edit_student, get_student, list_students},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build and return the router for every endpoint.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Accounts
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/reset-password", post(reset_password))
        .route("/me", get(me))
        .route("/dashboard", get(dashboard))
        // Students
        .route("/students", get(list_students))
        .route("/students/add", post(add_student))
        .route("/students/{id}", get(get_student))
        .route("/students/{id}/edit", post(edit_student))
        .route("/students/{id}/delete", post(delete_student))
        // Enrollments of one student
        .route("/students/{id}/enrollments", get(list_enrollments))
        .route("/students/{id}/enrollments/add", post(add_enrollment))
        .route(
            "/students/{id}/enrollments/{enrollment_id}",
            get(get_enrollment),
        )
        .route(
            "/students/{id}/enrollments/{enrollment_id}/edit",
            post(edit_enrollment),
        )
        .route(
            "/students/{id}/enrollments/{enrollment_id}/delete",
            post(delete_enrollment),
        )
        // Courses
        .route("/courses", get(list_courses))
        .route("/courses/add", post(add_course))
        .route("/courses/{id}", get(get_course))
        .route("/courses/{id}/edit", post(edit_course))
        .route("/courses/{id}/delete", post(delete_course))
        // Instructors
        .route("/instructors", get(list_instructors))
        .route("/instructors/add", post(add_instructor))
        .route("/instructors/{id}", get(get_instructor))
        .route("/instructors/{id}/edit", post(edit_instructor))
        .route("/instructors/{id}/delete", post(delete_instructor))
}

/// The complete application: routes, shared state and request tracing.
pub fn app(state: AppState) -> Router {
    routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
