use axum::extract::{Path, State};
use axum::Json;
use flowgrid_core::catalog::ActionCatalog;
use flowgrid_core::FlowgridError;

use crate::error::AppError;
use crate::state::AppState;

/// Read the configured catalog source. It is re-read on every request so
/// edits to the action file or manifest show up without a restart.
async fn load_catalog(app: &AppState) -> Result<ActionCatalog, AppError> {
    let config = app.config.clone();
    let catalog = tokio::task::spawn_blocking(move || {
        let actions = config.load_catalog()?;
        Ok::<_, FlowgridError>(ActionCatalog::new(actions))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(catalog)
}

/// GET /api/actions: every known action definition.
pub async fn list_actions(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = load_catalog(&app).await?;
    tracing::debug!(count = catalog.len(), "serving action catalog");
    Ok(Json(serde_json::to_value(catalog.actions())?))
}

/// GET /api/actions/{code}: a single action definition.
pub async fn get_action(
    State(app): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let catalog = load_catalog(&app).await?;
    let action = catalog
        .lookup(&code)
        .ok_or(FlowgridError::UnknownAction(code))?;
    Ok(Json(serde_json::to_value(action)?))
}
