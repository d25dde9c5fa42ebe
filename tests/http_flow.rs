//! End-to-end flows through the router.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use campus_records::{db, routes::routes, state::AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

async fn app() -> Router {
    let pool = db::connect_in_memory().await.unwrap();
    routes::app(AppState::new(Arc::new(pool), 4, false))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    form: Option<&str>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match form {
        Some(form) => {
            builder = builder.header(header::CONTENT_TYPE, FORM);
            Body::from(form.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, json)
}

async fn get(app: &Router, uri: &str, cookie: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, Method::GET, uri, Some(cookie), None).await;
    (status, body)
}

async fn post(app: &Router, uri: &str, cookie: &str, form: &str) -> (StatusCode, Value) {
    let (status, _, body) = send(app, Method::POST, uri, Some(cookie), Some(form)).await;
    (status, body)
}

fn session_pair(headers: &HeaderMap) -> String {
    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

fn location(headers: &HeaderMap) -> &str {
    headers
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
}

async fn register(app: &Router, username: &str, password: &str) {
    let form = format!(
        "username={username}&email={username}%40example.com&password={password}&confirm_password={password}"
    );
    let (status, _, body) = send(app, Method::POST, "/register", None, Some(form.as_str())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

async fn sign_in(app: &Router) -> String {
    register(app, "registrar", "correct-horse").await;
    let (status, headers, _) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some("username=registrar&password=correct-horse"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    session_pair(&headers)
}

fn field_names(body: &Value) -> Vec<&str> {
    body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn public_endpoints_answer_without_a_session() {
    let app = app().await;
    let (status, _, body) = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, body) = send(&app, Method::GET, "/readyz", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["sqlite"]["ok"], true);

    let (status, _, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], "/login");
}

#[tokio::test]
async fn records_require_a_session() {
    let app = app().await;
    for uri in ["/dashboard", "/students", "/courses", "/instructors", "/me"] {
        let (status, _, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["status"], 401);
    }

    let (status, _, _) = send(
        &app,
        Method::GET,
        "/students",
        Some("campus_session=not-a-session"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_cookie_and_follows_local_next() {
    let app = app().await;
    let cookie = sign_in(&app).await;
    assert!(cookie.starts_with("campus_session="));

    let (status, body) = get(&app, "/me", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "registrar");
    assert!(body.get("password_hash").is_none());

    let (_, headers, _) = send(
        &app,
        Method::POST,
        "/login?next=/students",
        None,
        Some("username=registrar&password=correct-horse"),
    )
    .await;
    assert_eq!(location(&headers), "/students");
    assert!(
        headers[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("HttpOnly")
    );

    let (_, headers, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some("username=registrar&password=correct-horse&next=%2F%2Fevil.example"),
    )
    .await;
    assert_eq!(location(&headers), "/dashboard");
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let app = app().await;
    register(&app, "registrar", "correct-horse").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some("username=registrar&password=wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["submitted"]["username"][0], "registrar");
    assert!(body["submitted"].get("password").is_none());
}

#[tokio::test]
async fn register_reports_mismatch_without_echoing_passwords() {
    let app = app().await;
    let (status, _, body) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some("username=registrar&password=one&confirm_password=two"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["confirm_password"]);
    assert_eq!(body["submitted"]["username"][0], "registrar");
    assert!(body["submitted"].get("password").is_none());
    assert!(body["submitted"].get("confirm_password").is_none());

    register(&app, "registrar", "pw").await;
    let (status, _, body) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some("username=registrar&password=pw&confirm_password=pw"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["username"]);
}

#[tokio::test]
async fn student_lifecycle() {
    let app = app().await;
    let cookie = sign_in(&app).await;

    let (status, created) = post(
        &app,
        "/students/add",
        &cookie,
        "first_name=Ada&last_name=Lovelace&email=ada%40example.com&dob=1815-12-10&metadata=color%3Ablue%2C+size%3Alarge",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["dob"], "1815-12-10");
    assert_eq!(created["metadata"].as_array().unwrap().len(), 2);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, read) = get(&app, &format!("/students/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["email"], "ada@example.com");
    assert_eq!(read["metadata"][0]["key"], "color");

    let (status, list) = get(&app, "/students?q=love", &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
    assert_eq!(list["query"], "love");

    let (status, edited) = post(
        &app,
        &format!("/students/{id}/edit"),
        &cookie,
        "first_name=Augusta&last_name=Lovelace&email=ada%40example.com&dob=1815-12-10&metadata=b%3A2",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["first_name"], "Augusta");
    assert_eq!(edited["metadata"].as_array().unwrap().len(), 1);

    let (status, _) = post(&app, &format!("/students/{id}/delete"), &cookie, "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = get(&app, &format!("/students/{id}"), &cookie).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Student not found.");
}

#[tokio::test]
async fn invalid_submission_keeps_the_input() {
    let app = app().await;
    let cookie = sign_in(&app).await;

    let (status, body) = post(
        &app,
        "/students/add",
        &cookie,
        "first_name=Ada&last_name=&email=ada%40example.com&dob=10%2F12%2F1815",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["last_name", "dob"]);
    assert_eq!(body["submitted"]["first_name"][0], "Ada");
    assert_eq!(body["submitted"]["dob"][0], "10/12/1815");

    let (status, body) = post(
        &app,
        "/students/add",
        &cookie,
        "first_name=Ada&last_name=Lovelace&email=not-an-email&dob=1815-12-10",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["email"]);

    let (_, dashboard) = get(&app, "/dashboard", &cookie).await;
    assert_eq!(dashboard["total_students"], 0);
}

#[tokio::test]
async fn courses_instructors_and_enrollments() {
    let app = app().await;
    let cookie = sign_in(&app).await;

    let (status, algo) = post(
        &app,
        "/courses/add",
        &cookie,
        "name=Algorithms&course_code=cs101&description=",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{algo}");
    assert_eq!(algo["course_code"], "CS101");
    assert!(algo["description"].is_null());
    let algo_id = algo["id"].as_str().unwrap().to_string();

    let (_, dbs) = post(&app, "/courses/add", &cookie, "name=Databases&course_code=CS202").await;
    let dbs_id = dbs["id"].as_str().unwrap().to_string();

    let (status, body) = post(&app, "/courses/add", &cookie, "name=Again&course_code=Cs101").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["course_code"]);

    let (status, instructor) = post(
        &app,
        "/instructors/add",
        &cookie,
        &format!(
            "first_name=Edsger&last_name=Dijkstra&email=ewd%40example.com&courses={algo_id}&courses={dbs_id}"
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{instructor}");
    assert_eq!(instructor["courses"].as_array().unwrap().len(), 2);

    let (status, body) = post(
        &app,
        "/instructors/add",
        &cookie,
        "first_name=Barbara&last_name=Liskov&email=bl%40example.com&courses=nope",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["courses"]);

    let (_, student) = post(
        &app,
        "/students/add",
        &cookie,
        "first_name=Ada&last_name=Lovelace&email=ada%40example.com&dob=1815-12-10",
    )
    .await;
    let student_id = student["id"].as_str().unwrap().to_string();
    let enrollments = format!("/students/{student_id}/enrollments");

    let (status, body) = post(
        &app,
        &format!("{enrollments}/add"),
        &cookie,
        &format!("course={algo_id}&score=50.999"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["score"]);

    let (status, enrollment) = post(
        &app,
        &format!("{enrollments}/add"),
        &cookie,
        &format!("course={algo_id}&score=50.25&metadata=term%3Afall"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{enrollment}");
    assert_eq!(enrollment["score"], "50.25");
    assert_eq!(enrollment["course"]["course_code"], "CS101");
    let enrollment_id = enrollment["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        &format!("{enrollments}/add"),
        &cookie,
        &format!("course={algo_id}&score=10"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["course"]);

    let (status, edited) = post(
        &app,
        &format!("{enrollments}/{enrollment_id}/edit"),
        &cookie,
        &format!("course={algo_id}&score="),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(edited["score"].is_null());

    let (status, list) = get(&app, &format!("{enrollments}?q=cs1"), &cookie).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);

    let (_, dashboard) = get(&app, "/dashboard", &cookie).await;
    assert_eq!(dashboard["total_courses"], 2);
    assert_eq!(dashboard["total_instructors"], 1);
    assert_eq!(dashboard["total_enrollments"], 1);

    let (status, _) = post(&app, &format!("/courses/{algo_id}/delete"), &cookie, "").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, dashboard) = get(&app, "/dashboard", &cookie).await;
    assert_eq!(dashboard["total_enrollments"], 0);
    assert_eq!(dashboard["total_instructors"], 1);
}

#[tokio::test]
async fn logout_and_password_reset_close_sessions() {
    let app = app().await;
    let cookie = sign_in(&app).await;

    let (status, headers, _) = send(&app, Method::POST, "/logout", Some(cookie.as_str()), None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");
    let (status, _) = get(&app, "/me", &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, headers, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some("username=registrar&password=correct-horse"),
    )
    .await;
    let cookie = session_pair(&headers);

    let (status, body) = post(
        &app,
        "/reset-password",
        &cookie,
        "old_password=guess&new_password=battery-staple",
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["old_password"]);

    let (status, headers, _) = send(
        &app,
        Method::POST,
        "/reset-password",
        Some(cookie.as_str()),
        Some("old_password=correct-horse&new_password=battery-staple"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location(&headers), "/login");
    let (status, _) = get(&app, "/me", &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some("username=registrar&password=battery-staple"),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn malformed_ids_answer_with_a_json_error() {
    let app = app().await;
    let cookie = sign_in(&app).await;

    for uri in [
        "/students/not-a-uuid",
        "/courses/42",
        "/students/not-a-uuid/enrollments",
    ] {
        let (status, body) = get(&app, uri, &cookie).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    }

    let (status, body) = post(&app, "/instructors/nope/delete", &cookie, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}
