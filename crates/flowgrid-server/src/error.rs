use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flowgrid_core::FlowgridError;

// ---------------------------------------------------------------------------
// AppError
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

fn status_for(e: &FlowgridError) -> StatusCode {
    match e {
        FlowgridError::ScenarioNotFound(_)
        | FlowgridError::StepNotFound(_)
        | FlowgridError::UnknownAction(_) => StatusCode::NOT_FOUND,
        FlowgridError::InvalidScenarioId(_)
        | FlowgridError::InvalidStepOrder(_)
        | FlowgridError::IndexOutOfRange { .. }
        | FlowgridError::DuplicateRowId(_)
        | FlowgridError::InvalidRow(_)
        | FlowgridError::InvalidSchema(_) => StatusCode::BAD_REQUEST,
        FlowgridError::ExportPrecondition => StatusCode::CONFLICT,
        FlowgridError::CatalogUnavailable(_) | FlowgridError::Backend(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        FlowgridError::LoadFailed { .. } | FlowgridError::PersistFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        FlowgridError::Workbook(_)
        | FlowgridError::Io(_)
        | FlowgridError::Yaml(_)
        | FlowgridError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .downcast_ref::<FlowgridError>()
            .map(status_for)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self.0, "request failed");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_not_found_maps_to_404() {
        let err = AppError(FlowgridError::ScenarioNotFound("s-1".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_action_maps_to_404() {
        let err = AppError(FlowgridError::UnknownAction("retired".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_scenario_id_maps_to_400() {
        let err = AppError(FlowgridError::InvalidScenarioId("../etc".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicate_row_id_maps_to_400() {
        let err = AppError(FlowgridError::DuplicateRowId("row-1".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_step_order_maps_to_400() {
        let err = AppError(FlowgridError::InvalidStepOrder("duplicate step id".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn export_precondition_maps_to_409() {
        let err = AppError(FlowgridError::ExportPrecondition.into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn catalog_unavailable_maps_to_503() {
        let err = AppError(FlowgridError::CatalogUnavailable("missing".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn persist_failed_maps_to_502() {
        let err = AppError(FlowgridError::PersistFailed("upstream".into()).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn io_error_maps_to_500() {
        let io_err = std::io::Error::other("disk full");
        let err = AppError(FlowgridError::Io(io_err).into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn non_flowgrid_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_body_is_json() {
        let err = AppError(FlowgridError::ScenarioNotFound("s-1".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(
            ct.to_str().unwrap().contains("application/json"),
            "expected JSON content type, got {:?}",
            ct
        );
    }
}
