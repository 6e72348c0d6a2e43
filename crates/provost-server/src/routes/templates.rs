use axum::extract::{Path, State};
use axum::Json;

use provost_core::store::SeedTemplate;
use provost_core::ProvostError;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/templates — all seed templates, built-ins included.
pub async fn list_templates(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let templates = store.templates()?;
        Ok::<_, ProvostError>(serde_json::json!(templates))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// GET /api/templates/{id}
pub async fn get_template(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        let template = store
            .template(&id)?
            .ok_or(ProvostError::TemplateNotFound(id))?;
        Ok::<_, ProvostError>(serde_json::json!(template))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}

/// POST /api/templates — create or replace a seed template.
pub async fn upsert_template(
    State(app): State<AppState>,
    Json(body): Json<SeedTemplate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let result = tokio::task::spawn_blocking(move || {
        store.upsert_template(&body)?;
        Ok::<_, ProvostError>(serde_json::json!(body))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
