use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowgridError {
    #[error("action catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("invalid step order: {0}")]
    InvalidStepOrder(String),

    #[error("index {index} out of range for {len} steps")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("duplicate row id '{0}' in grid")]
    DuplicateRowId(String),

    #[error("invalid row: {0}")]
    InvalidRow(String),

    #[error("failed to load scenario '{scenario_id}': {reason}")]
    LoadFailed { scenario_id: String, reason: String },

    #[error("failed to persist scenario: {0}")]
    PersistFailed(String),

    #[error("export unavailable: scenario has not been saved yet")]
    ExportPrecondition,

    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("invalid scenario id '{0}': must be alphanumeric with '-' or '_'")]
    InvalidScenarioId(String),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl From<rust_xlsxwriter::XlsxError> for FlowgridError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        FlowgridError::Workbook(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlowgridError>;
