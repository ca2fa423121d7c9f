//! Column derivation for the three step grids.
//!
//! Everything here is a pure function of an [`ActionDefinition`]: the same
//! action and grid kind always yield the same columns in the same order.

use crate::catalog::{ActionDefinition, BodyColumnInfo};
use crate::types::GridKind;
use serde::Serialize;

/// Key of a column within one grid of one action.
pub type ColumnKey = String;

/// Reserved name of the implicit row identity column.
pub const ID_COLUMN: &str = "id";

/// Label of the implicit row identity column in rendered tables.
pub const ID_HEADER: &str = "ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: ColumnKey,
    pub header: String,
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Resolve the ordered columns of `kind` for `action`. The identity column is
/// implicit and never part of the result.
pub fn resolve_columns(action: &ActionDefinition, kind: GridKind) -> Vec<Column> {
    match kind {
        GridKind::Params => param_columns(action),
        GridKind::Request => body_columns(action, kind, action.request_columns()),
        GridKind::Response => body_columns(action, kind, action.response_columns()),
    }
}

/// Keys of [`resolve_columns`], in order.
pub fn column_keys(action: &ActionDefinition, kind: GridKind) -> Vec<ColumnKey> {
    resolve_columns(action, kind)
        .into_iter()
        .map(|c| c.key)
        .collect()
}

/// A grid with no columns is absent for the step: it is neither rendered nor
/// exported. A grid with columns but no rows is present.
pub fn is_absent(action: &ActionDefinition, kind: GridKind) -> bool {
    resolve_columns(action, kind).is_empty()
}

fn param_columns(action: &ActionDefinition) -> Vec<Column> {
    let path = action.path_params().iter().enumerate().map(|(i, p)| Column {
        key: format!("param_{}_{}", p.technical_column_name, i),
        header: format!("Path: {}", p.technical_column_name),
        mandatory: p.is_mandatory,
        description: p.derived_data_type.clone(),
    });
    let query = action.query_params().iter().enumerate().map(|(i, p)| Column {
        key: format!("query_{}_{}", p.technical_column_name, i),
        header: format!("Query: {}", p.technical_column_name),
        mandatory: p.is_mandatory,
        description: p.derived_data_type.clone(),
    });
    path.chain(query).collect()
}

fn body_columns(
    action: &ActionDefinition,
    kind: GridKind,
    descriptors: &[BodyColumnInfo],
) -> Vec<Column> {
    descriptors
        .iter()
        .filter_map(|d| {
            let Some(path) = d.attribute_path.as_deref().filter(|p| !p.is_empty()) else {
                tracing::warn!(
                    action_code = %action.action_code,
                    grid = %kind,
                    column = %d.technical_column_name,
                    "descriptor has no attribute path; column skipped"
                );
                return None;
            };
            let header = d
                .attribute_grid_path
                .as_deref()
                .filter(|h| !h.is_empty())
                .unwrap_or(path);
            Some(Column {
                key: path.to_string(),
                header: header.to_string(),
                mandatory: d.is_mandatory,
                description: Some(format!(
                    "{} field: {} (path: {})",
                    kind.title(),
                    d.technical_column_name,
                    header
                )),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
