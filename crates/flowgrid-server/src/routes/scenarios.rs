use axum::extract::{Path, State};
use axum::Json;
use flowgrid_core::scenario::Scenario;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/scenarios: summaries of every stored scenario.
pub async fn list_scenarios(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let summaries = app.store.list();
    Ok(Json(serde_json::to_value(summaries)?))
}

/// GET /api/scenarios/{id}: the full scenario.
pub async fn get_scenario(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Scenario>, AppError> {
    let scenario = app.store.load(&id)?;
    Ok(Json(scenario))
}

/// POST /api/scenarios: create or overwrite a scenario. The response carries
/// the assigned `scenarioId`.
pub async fn save_scenario(
    State(app): State<AppState>,
    Json(scenario): Json<Scenario>,
) -> Result<Json<Scenario>, AppError> {
    let store = app.store.clone();
    let saved = tokio::task::spawn_blocking(move || {
        scenario.validate()?;
        store.save(scenario)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(saved))
}
