//! Row records and the conversion between them and positional cell matrices.

use crate::error::{FlowgridError, Result};
use crate::schema::{ColumnKey, ID_COLUMN};
use crate::types::GridKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// RowId
// ---------------------------------------------------------------------------

/// Identity of a row within its grid. Independent of the row's values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Number(n) => write!(f, "{n}"),
            RowId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        RowId::Number(n)
    }
}

impl From<i32> for RowId {
    fn from(n: i32) -> Self {
        RowId::Number(i64::from(n))
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId::Text(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId::Text(s)
    }
}

/// Parse a user-supplied id; numeric input becomes a numeric id.
pub fn parse_row_id(raw: &str) -> RowId {
    raw.parse::<i64>()
        .map(RowId::Number)
        .unwrap_or_else(|_| RowId::Text(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Null,
}

impl Scalar {
    /// Textual form used by tables and exports. Null is the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Null => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

// ---------------------------------------------------------------------------
// RowRecord
// ---------------------------------------------------------------------------

/// One identified row. On the wire the values sit next to `id`:
/// `{"id": 1, "param_x_0": "A"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    pub id: RowId,
    #[serde(flatten)]
    pub values: BTreeMap<ColumnKey, Scalar>,
}

impl RowRecord {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<ColumnKey>, value: impl Into<Scalar>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Textual value under `key`, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.values.get(key).map(Scalar::to_text).unwrap_or_default()
    }
}

/// A fresh id that no existing row can carry.
pub fn fresh_row_id(kind: GridKind) -> RowId {
    RowId::Text(format!("{}-{}", kind.as_str(), uuid::Uuid::new_v4().simple()))
}

/// A row with every column present and empty.
pub fn blank_row(kind: GridKind, columns: &[ColumnKey]) -> RowRecord {
    RowRecord {
        id: fresh_row_id(kind),
        values: columns
            .iter()
            .map(|c| (c.clone(), Scalar::Text(String::new())))
            .collect(),
    }
}

/// Check the identity invariants of a grid: unique ids and no value stored
/// under the reserved identity key.
pub fn check_rows(rows: &[RowRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for row in rows {
        if !seen.insert(&row.id) {
            return Err(FlowgridError::DuplicateRowId(row.id.to_string()));
        }
        if row.values.contains_key(ID_COLUMN) {
            return Err(FlowgridError::InvalidRow(format!(
                "row '{}' stores a value under the reserved '{ID_COLUMN}' key",
                row.id
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Matrix conversion
// ---------------------------------------------------------------------------

/// Positional cell values: rows × columns in resolver order.
pub type Matrix = Vec<Vec<String>>;

/// Convert an edited matrix back into row records.
///
/// Row `i` keeps the id of `previous[i]`; rows past the end of `previous` get
/// a fresh id. Short rows are padded with empty values and cells beyond the
/// column list are dropped.
pub fn from_matrix(
    kind: GridKind,
    previous: &[RowRecord],
    columns: &[ColumnKey],
    matrix: &[Vec<String>],
) -> Vec<RowRecord> {
    matrix
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let id = previous
                .get(i)
                .map(|r| r.id.clone())
                .unwrap_or_else(|| fresh_row_id(kind));
            let values = columns
                .iter()
                .enumerate()
                .map(|(c, key)| {
                    let cell = cells.get(c).cloned().unwrap_or_default();
                    (key.clone(), Scalar::Text(cell))
                })
                .collect();
            RowRecord { id, values }
        })
        .collect()
}

/// Convert row records into a matrix in column order. Values under keys
/// outside `columns` are dropped; absent values become empty strings.
pub fn to_matrix(rows: &[RowRecord], columns: &[ColumnKey]) -> Matrix {
    rows.iter()
        .map(|row| columns.iter().map(|key| row.text(key)).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(keys: &[&str]) -> Vec<ColumnKey> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn matrix(rows: &[&[&str]]) -> Matrix {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn matrix_round_trip_is_lossless() {
        let columns = cols(&["param_id_0", "query_page_0"]);
        let m = matrix(&[&["7", "1"], &["8", ""], &["", "3"]]);
        let rows = from_matrix(GridKind::Params, &[], &columns, &m);
        assert_eq!(to_matrix(&rows, &columns), m);
    }

    #[test]
    fn existing_rows_keep_their_ids() {
        let columns = cols(&["a"]);
        let previous = vec![RowRecord::new(1).with("a", "x"), RowRecord::new("r2").with("a", "y")];
        let edited = matrix(&[&["x2"], &["y2"], &["z"]]);

        let rows = from_matrix(GridKind::Request, &previous, &columns, &edited);
        assert_eq!(rows[0].id, RowId::Number(1));
        assert_eq!(rows[1].id, RowId::Text("r2".into()));
        assert!(matches!(&rows[2].id, RowId::Text(s) if s.starts_with("request-")));
        assert_eq!(rows[0].text("a"), "x2");
        check_rows(&rows).unwrap();
    }

    #[test]
    fn appended_rows_get_distinct_ids() {
        let columns = cols(&["a"]);
        let rows = from_matrix(GridKind::Response, &[], &columns, &matrix(&[&["1"], &["2"]]));
        assert_ne!(rows[0].id, rows[1].id);
    }

    #[test]
    fn short_rows_pad_and_long_rows_truncate() {
        let columns = cols(&["a", "b"]);
        let rows = from_matrix(
            GridKind::Params,
            &[],
            &columns,
            &matrix(&[&["only"], &["1", "2", "3"]]),
        );
        assert_eq!(rows[0].text("b"), "");
        assert_eq!(rows[1].values.len(), 2);
    }

    #[test]
    fn to_matrix_drops_unknown_keys_and_fills_gaps() {
        let columns = cols(&["a", "b"]);
        let rows = vec![RowRecord::new(1).with("b", "kept").with("renamed", "dropped")];
        assert_eq!(to_matrix(&rows, &columns), matrix(&[&["", "kept"]]));
    }

    #[test]
    fn scalars_render_as_text() {
        let row: RowRecord =
            serde_json::from_str(r#"{"id": 3, "n": 42, "b": true, "s": "x", "z": null}"#).unwrap();
        assert_eq!(row.id, RowId::Number(3));
        assert_eq!(row.text("n"), "42");
        assert_eq!(row.text("b"), "true");
        assert_eq!(row.text("s"), "x");
        assert_eq!(row.text("z"), "");
        assert_eq!(row.text("missing"), "");
        assert!(!row.values.contains_key("id"));
    }

    #[test]
    fn wire_form_flattens_values_next_to_id() {
        let row = RowRecord::new(1).with("param_x_0", "A");
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({"id": 1, "param_x_0": "A"}));
    }

    #[test]
    fn check_rows_rejects_duplicates_and_reserved_key() {
        let dup = vec![RowRecord::new(1), RowRecord::new(1)];
        assert!(matches!(check_rows(&dup), Err(FlowgridError::DuplicateRowId(_))));

        let mut reserved = RowRecord::new(2);
        reserved.values.insert("id".into(), Scalar::from("3"));
        assert!(matches!(check_rows(&[reserved]), Err(FlowgridError::InvalidRow(_))));
    }

    #[test]
    fn blank_row_has_every_column_empty() {
        let row = blank_row(GridKind::Params, &cols(&["a", "b"]));
        assert_eq!(row.values.len(), 2);
        assert!(row.values.values().all(Scalar::is_empty));
    }

    #[test]
    fn parse_row_id_prefers_numbers() {
        assert_eq!(parse_row_id("12"), RowId::Number(12));
        assert_eq!(parse_row_id("params-1"), RowId::Text("params-1".into()));
    }
}
