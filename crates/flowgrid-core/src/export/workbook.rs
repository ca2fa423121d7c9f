//! Workbook layout.
//!
//! Each exported step becomes one sheet. Blocks are appended top to bottom
//! from row 0; every merge and table range is recorded in the sheet's region
//! list at the moment its block is written, so offsets follow purely from
//! the shape of the data.

use super::{resolve_steps, ExportOptions, ExportReport, ResolvedGrid, ResolvedStep};
use crate::catalog::ActionCatalog;
use crate::error::Result;
use crate::scenario::Scenario;
use crate::schema::ID_HEADER;
use serde::Serialize;

pub const TABLE_STYLE: &str = "TableStyleMedium9";

const SHEET_NAME_MAX: usize = 31;
const SHEET_NAME_FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

const BLOCK_SPACING: u32 = 1;
const GRID_SPACING: u32 = 2;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    Plain,
    Bold,
    Italic,
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub text: String,
    pub style: CellStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionKind {
    Merge,
    Table {
        name: String,
        style: String,
        header_row: bool,
        columns: Vec<String>,
    },
}

/// An inclusive rectangular range of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
    pub kind: RegionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub cells: Vec<Cell>,
    pub regions: Vec<Region>,
    /// Rows consumed by the layout, including spacers.
    pub row_count: u32,
}

impl Sheet {
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Region> {
        self.regions
            .iter()
            .filter(|r| matches!(r.kind, RegionKind::Table { .. }))
    }

    pub fn merges(&self) -> impl Iterator<Item = &Region> {
        self.regions
            .iter()
            .filter(|r| matches!(r.kind, RegionKind::Merge))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

/// Excel sheet name rules: at most 31 characters, none of `[]:*?/\`.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if SHEET_NAME_FORBIDDEN.contains(&c) { '_' } else { c })
        .take(SHEET_NAME_MAX)
        .collect();
    let trimmed = cleaned.trim_matches('\'').trim();
    if trimmed.is_empty() {
        "Sheet".to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Lay out every exportable step of `scenario` as a sheet.
pub fn compose_workbook(
    scenario: &Scenario,
    catalog: &ActionCatalog,
    options: ExportOptions,
) -> Result<(Workbook, ExportReport)> {
    let (steps, report) = resolve_steps(scenario, catalog)?;
    let sheets = steps
        .iter()
        .map(|step| compose_sheet(step, options))
        .collect();
    Ok((Workbook { sheets }, report))
}

fn compose_sheet(step: &ResolvedStep<'_>, options: ExportOptions) -> Sheet {
    let widest_table = step
        .grids
        .iter()
        .map(|g| g.columns.len() as u16 + 1)
        .max()
        .unwrap_or(0);
    let width = widest_table.max(options.annotation_width).max(1);

    let mut layout = SheetLayout::new(
        sanitize_sheet_name(&format!("{}. {}", step.ordinal, step.step.action_code)),
        width,
    );

    let before = step.step.before_description.trim();
    if !before.is_empty() {
        layout.annotation("Before", before);
        layout.skip(BLOCK_SPACING);
    }

    layout.line(
        format!("Step {}: {}", step.ordinal, step.action.action_code),
        CellStyle::Bold,
    );
    layout.line(format!("Component: {}", step.action.component_name), CellStyle::Plain);
    layout.line(format!("Group: {}", step.action.group_name), CellStyle::Plain);
    layout.skip(BLOCK_SPACING);

    for (i, grid) in step.grids.iter().enumerate() {
        if i > 0 {
            layout.skip(GRID_SPACING);
        }
        layout.grid(step.ordinal, grid);
    }

    let after = step.step.after_description.trim();
    if !after.is_empty() {
        if !step.grids.is_empty() {
            layout.skip(BLOCK_SPACING);
        }
        layout.annotation("After", after);
    }

    tracing::debug!(
        sheet = %layout.sheet.name,
        rows = layout.row,
        regions = layout.sheet.regions.len(),
        "sheet laid out"
    );
    layout.finish()
}

struct SheetLayout {
    sheet: Sheet,
    row: u32,
    width: u16,
}

impl SheetLayout {
    fn new(name: String, width: u16) -> Self {
        Self {
            sheet: Sheet {
                name,
                cells: Vec::new(),
                regions: Vec::new(),
                row_count: 0,
            },
            row: 0,
            width,
        }
    }

    fn put(&mut self, col: u16, text: impl Into<String>, style: CellStyle) {
        self.sheet.cells.push(Cell {
            row: self.row,
            col,
            text: text.into(),
            style,
        });
    }

    fn line(&mut self, text: impl Into<String>, style: CellStyle) {
        self.put(0, text, style);
        self.row += 1;
    }

    /// Spans the annotation width; a one-column width stays a plain cell
    /// since Excel rejects single-cell merges.
    fn merged_line(&mut self, text: &str, style: CellStyle) {
        self.put(0, text, style);
        if self.width < 2 {
            self.row += 1;
            return;
        }
        self.sheet.regions.push(Region {
            first_row: self.row,
            last_row: self.row,
            first_col: 0,
            last_col: self.width - 1,
            kind: RegionKind::Merge,
        });
        self.row += 1;
    }

    fn skip(&mut self, rows: u32) {
        self.row += rows;
    }

    fn annotation(&mut self, label: &str, text: &str) {
        self.merged_line(label, CellStyle::Bold);
        self.merged_line(text, CellStyle::Italic);
    }

    fn grid(&mut self, ordinal: usize, grid: &ResolvedGrid<'_>) {
        self.line(grid.kind.title(), CellStyle::Bold);

        let header_row = self.row;
        let mut headers = Vec::with_capacity(grid.columns.len() + 1);
        headers.push(ID_HEADER.to_string());
        headers.extend(grid.columns.iter().map(|c| c.header.clone()));
        for (col, header) in headers.iter().enumerate() {
            self.put(col as u16, header.clone(), CellStyle::Header);
        }
        self.row += 1;

        for record in grid.rows {
            self.put(0, record.id.to_string(), CellStyle::Plain);
            for (i, column) in grid.columns.iter().enumerate() {
                self.put(i as u16 + 1, record.text(&column.key), CellStyle::Plain);
            }
            self.row += 1;
        }

        self.sheet.regions.push(Region {
            first_row: header_row,
            last_row: self.row - 1,
            first_col: 0,
            last_col: grid.columns.len() as u16,
            kind: RegionKind::Table {
                name: format!("Step{}_{}", ordinal, grid.kind.table_suffix()),
                style: TABLE_STYLE.to_string(),
                header_row: true,
                columns: headers,
            },
        });
    }

    fn finish(mut self) -> Sheet {
        self.sheet.row_count = self.row;
        self.sheet
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
