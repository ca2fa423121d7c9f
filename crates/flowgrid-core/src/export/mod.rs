//! Export of a saved scenario as a workbook and as an HTML document.
//!
//! Both forms walk the same resolved view of the scenario, so they agree on
//! which steps are exported, their ordinals and which grids appear.

pub mod markup;
pub mod workbook;
pub mod xlsx;

use crate::catalog::{ActionCatalog, ActionDefinition};
use crate::error::{FlowgridError, Result};
use crate::rows::RowRecord;
use crate::scenario::{Scenario, ScenarioStep};
use crate::schema::{resolve_columns, Column};
use crate::types::GridKind;
use serde::{Deserialize, Serialize};

pub use markup::compose_markup;
pub use workbook::{compose_workbook, Workbook};

pub const DEFAULT_ANNOTATION_WIDTH: u16 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Minimum width, in columns, of merged annotation rows.
    pub annotation_width: u16,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            annotation_width: DEFAULT_ANNOTATION_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub ordinal: usize,
    pub step_id: String,
    pub action_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub exported: usize,
    pub skipped: Vec<SkippedStep>,
}

// ---------------------------------------------------------------------------
// Resolved view
// ---------------------------------------------------------------------------

pub(crate) struct ResolvedGrid<'a> {
    pub kind: GridKind,
    pub columns: Vec<Column>,
    pub rows: &'a [RowRecord],
}

pub(crate) struct ResolvedStep<'a> {
    /// 1-based position of the step in the scenario.
    pub ordinal: usize,
    pub step: &'a ScenarioStep,
    pub action: &'a ActionDefinition,
    /// Non-absent grids, in params/request/response order.
    pub grids: Vec<ResolvedGrid<'a>>,
}

/// Resolve every exportable step. Fails when the scenario was never saved;
/// steps whose action is no longer in the catalog are reported, not exported.
pub(crate) fn resolve_steps<'a>(
    scenario: &'a Scenario,
    catalog: &'a ActionCatalog,
) -> Result<(Vec<ResolvedStep<'a>>, ExportReport)> {
    if scenario.id.is_none() {
        return Err(FlowgridError::ExportPrecondition);
    }

    let mut resolved = Vec::with_capacity(scenario.steps.len());
    let mut report = ExportReport::default();
    for (i, step) in scenario.steps.iter().enumerate() {
        let ordinal = i + 1;
        let Some(action) = catalog.lookup(&step.action_code) else {
            tracing::warn!(
                step_id = %step.id,
                action_code = %step.action_code,
                "action not in catalog; step left out of export"
            );
            report.skipped.push(SkippedStep {
                ordinal,
                step_id: step.id.clone(),
                action_code: step.action_code.clone(),
            });
            continue;
        };
        let grids = GridKind::all()
            .iter()
            .filter_map(|&kind| {
                let columns = resolve_columns(action, kind);
                (!columns.is_empty()).then(|| ResolvedGrid {
                    kind,
                    columns,
                    rows: step.grid(kind),
                })
            })
            .collect();
        resolved.push(ResolvedStep {
            ordinal,
            step,
            action,
            grids,
        });
    }
    report.exported = resolved.len();
    Ok((resolved, report))
}

/// Compose the workbook and render it to `.xlsx` bytes.
pub fn export_xlsx(
    scenario: &Scenario,
    catalog: &ActionCatalog,
    options: ExportOptions,
) -> Result<(Vec<u8>, ExportReport)> {
    let (book, report) = compose_workbook(scenario, catalog, options)?;
    let bytes = xlsx::render(&book)?;
    Ok((bytes, report))
}
