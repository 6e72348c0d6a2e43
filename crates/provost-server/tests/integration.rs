use std::sync::Arc;

use axum::http::StatusCode;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use provost_core::config::QueueConfig;
use provost_core::queue::JobQueue;
use provost_core::store::CourseStore;
use provost_core::types::CourseStatus;
use provost_server::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct TestApp {
    _dir: TempDir,
    store: Arc<CourseStore>,
    state: AppState,
}

fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(CourseStore::open_in_memory().unwrap());
    let queue = Arc::new(
        JobQueue::open(&dir.path().join("queue.redb"), QueueConfig::default()).unwrap(),
    );
    let state = AppState::new(store.clone(), queue);
    TestApp {
        _dir: dir,
        store,
        state,
    }
}

fn router(app: &TestApp) -> axum::Router {
    provost_server::build_router(app.state.clone())
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST request with a JSON body via `oneshot`.
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn delete(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn course_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Operating Systems",
        "term": "Fall 2026",
        "shape": "single_track",
        "space_id": "space-1",
    })
}

fn combined_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Operating Systems",
        "term": "Fall 2026",
        "shape": "combined_track",
        "space_id": "space-1",
        "groups": [
            { "number": 1, "name": "Monday lab" },
            { "number": 2, "name": "Tuesday lab" },
        ],
    })
}

async fn create_course(app: &TestApp, body: serde_json::Value) -> String {
    let (status, json) = post_json(router(app), "/api/courses", body).await;
    assert_eq!(status, StatusCode::OK);
    json["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_course_starts_pending_with_pending_steps() {
    let app = test_app();
    let id = create_course(&app, course_body()).await;

    let (status, json) = get(router(&app), &format!("/api/courses/{id}/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["course_status"], "pending");
    let steps = json["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 5);
    assert!(steps.iter().all(|s| s["status"] == "pending"));
    assert_eq!(steps[0]["step"], "create_space");
}

#[tokio::test]
async fn combined_course_has_ten_steps_and_groups() {
    let app = test_app();
    let id = create_course(&app, combined_body()).await;

    let (status, json) = get(router(&app), &format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["course"]["groups"].as_array().unwrap().len(), 2);

    let (_, status_json) = get(router(&app), &format!("/api/courses/{id}/status")).await;
    assert_eq!(status_json["steps"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn combined_course_without_groups_is_rejected() {
    let app = test_app();
    let mut body = combined_body();
    body["groups"] = serde_json::json!([]);
    let (status, json) = post_json(router(&app), "/api/courses", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("at least one group"));
}

#[tokio::test]
async fn list_courses_returns_created() {
    let app = test_app();
    create_course(&app, course_body()).await;
    let (status, json) = get(router(&app), "/api/courses").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_course_is_404() {
    let app = test_app();
    let id = uuid::Uuid::new_v4();
    let (status, _) = get(router(&app), &format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(router(&app), &format!("/api/courses/{id}/status")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(router(&app), &format!("/api/courses/{id}/audit")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Provision / retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn provision_admits_once_then_conflicts() {
    let app = test_app();
    let id = create_course(&app, course_body()).await;

    let (status, json) = post_json(
        router(&app),
        &format!("/api/courses/{id}/provision"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["job_key"], format!("provision-{id}"));

    let (status, _) = post_json(
        router(&app),
        &format!("/api/courses/{id}/provision"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn retry_requires_failed_state() {
    let app = test_app();
    let id = create_course(&app, course_body()).await;

    let (status, json) = post_json(
        router(&app),
        &format!("/api/courses/{id}/retry"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("not in failed state"));
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_pending_course_succeeds() {
    let app = test_app();
    let id = create_course(&app, course_body()).await;

    let (status, _) = delete(router(&app), &format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(router(&app), &format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_in_progress_course_conflicts() {
    let app = test_app();
    let id = create_course(&app, course_body()).await;
    let uuid = uuid::Uuid::parse_str(&id).unwrap();
    app.store
        .set_course_status(uuid, CourseStatus::InProgress)
        .unwrap();

    let (status, _) = delete(router(&app), &format!("/api/courses/{id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn builtin_templates_are_listed() {
    let app = test_app();
    let (status, json) = get(router(&app), "/api/templates").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"default"));
    assert!(ids.contains(&"edp"));
}

#[tokio::test]
async fn template_upsert_and_fetch() {
    let app = test_app();
    let (status, _) = post_json(
        router(&app),
        "/api/templates",
        serde_json::json!({
            "id": "rust-101",
            "label": "Rust 101",
            "content": "# Rust 101\n",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get(router(&app), "/api/templates/rust-101").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["label"], "Rust 101");

    let (status, _) = get(router(&app), "/api/templates/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
