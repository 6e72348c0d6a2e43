use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use provost_core::course::NewCourse;
use provost_core::scheduler::Scheduler;
use provost_core::types::CourseStatus;
use provost_core::ProvostError;

use crate::error::AppError;
use crate::state::AppState;

/// POST /api/courses — create a course with its groups and pending step
/// records.
pub async fn create_course(
    State(app): State<AppState>,
    Json(body): Json<NewCourse>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let course = store.create_course(body)?;
        Ok::<_, ProvostError>(serde_json::json!(course))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/courses — list all courses, newest first.
pub async fn list_courses(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let courses = store.courses()?;
        Ok::<_, ProvostError>(serde_json::json!(courses))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/courses/{id} — course detail with its recorded resources and
/// queue admissions.
pub async fn get_course(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let course = store.course(id)?;
        let resources = store.resources(id)?;
        let executions = store.executions(id)?;
        Ok::<_, ProvostError>(serde_json::json!({
            "course": course,
            "resources": resources,
            "executions": executions,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// DELETE /api/courses/{id} — only while no execution is in flight.
pub async fn delete_course(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let course = store.course(id)?;
        if !matches!(
            course.status,
            CourseStatus::Pending | CourseStatus::Completed | CourseStatus::Failed
        ) {
            return Err(ProvostError::WrongState {
                course: id.to_string(),
                expected: "pending, completed or failed".to_string(),
                current: course.status.to_string(),
            });
        }
        store.delete_course(id)?;
        Ok::<_, ProvostError>(serde_json::json!({ "deleted": id }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/courses/{id}/provision — admit the initial provisioning job.
pub async fn start_provisioning(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let queue = app.queue.clone();
    let result = tokio::task::spawn_blocking(move || {
        let job = Scheduler::new(store, queue).start(id)?;
        Ok::<_, ProvostError>(serde_json::json!({
            "message": format!("course {id} provisioning started"),
            "job_key": job.key,
            "attempt": job.attempt,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/courses/{id}/retry — reset failed steps and re-admit.
pub async fn retry_course(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let queue = app.queue.clone();
    let result = tokio::task::spawn_blocking(move || {
        let job = Scheduler::new(store, queue).retry(id)?;
        Ok::<_, ProvostError>(serde_json::json!({
            "message": format!("course {id} queued for retry"),
            "job_key": job.key,
            "attempt": job.attempt,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/courses/{id}/status — per-step provisioning progress.
pub async fn get_status(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let course = store.course(id)?;
        let steps = store.step_records(id)?;
        Ok::<_, ProvostError>(serde_json::json!({
            "course_id": id,
            "course_status": course.status,
            "steps": steps,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/courses/{id}/audit — the vendor-call audit trail.
pub async fn get_audit(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        // 404 for unknown courses rather than an empty list
        store.course(id)?;
        let entries = store.audit_entries(id)?;
        Ok::<_, ProvostError>(serde_json::json!(entries))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
