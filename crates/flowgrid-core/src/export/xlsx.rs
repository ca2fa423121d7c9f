//! Rendering of the workbook model to `.xlsx` bytes.

use super::workbook::{Cell, CellStyle, RegionKind, Sheet, Workbook};
use crate::error::Result;
use rust_xlsxwriter::{Format, Table, TableColumn, TableStyle, Worksheet};
use std::collections::HashSet;

struct Formats {
    plain: Format,
    bold: Format,
    italic: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            plain: Format::new(),
            bold: Format::new().set_bold(),
            italic: Format::new().set_italic().set_text_wrap(),
        }
    }

    fn for_style(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Plain => &self.plain,
            CellStyle::Bold | CellStyle::Header => &self.bold,
            CellStyle::Italic => &self.italic,
        }
    }
}

pub fn render(book: &Workbook) -> Result<Vec<u8>> {
    let formats = Formats::new();
    let mut xlsx = rust_xlsxwriter::Workbook::new();
    for sheet in &book.sheets {
        let worksheet = xlsx.add_worksheet();
        render_sheet(worksheet, sheet, &formats)?;
    }
    Ok(xlsx.save_to_buffer()?)
}

fn render_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &Formats) -> Result<()> {
    worksheet.set_name(&sheet.name)?;

    // Cells owned by a merge or a table header are written with the region.
    let mut claimed: HashSet<(u32, u16)> = HashSet::new();

    for region in &sheet.regions {
        match &region.kind {
            RegionKind::Merge => {
                let cell = sheet.cell(region.first_row, region.first_col);
                let (text, style) = cell
                    .map(|c| (c.text.as_str(), c.style))
                    .unwrap_or(("", CellStyle::Plain));
                worksheet.merge_range(
                    region.first_row,
                    region.first_col,
                    region.last_row,
                    region.last_col,
                    text,
                    formats.for_style(style),
                )?;
                claimed.insert((region.first_row, region.first_col));
            }
            RegionKind::Table {
                name,
                style,
                header_row,
                columns,
            } => {
                // A table needs at least one data row below its header.
                if region.last_row == region.first_row {
                    continue;
                }
                let table = Table::new()
                    .set_name(name)
                    .set_style(table_style(style))
                    .set_header_row(*header_row)
                    .set_columns(&table_columns(columns));
                worksheet.add_table(
                    region.first_row,
                    region.first_col,
                    region.last_row,
                    region.last_col,
                    &table,
                )?;
                if *header_row {
                    for col in region.first_col..=region.last_col {
                        claimed.insert((region.first_row, col));
                    }
                }
            }
        }
    }

    for Cell {
        row,
        col,
        text,
        style,
    } in &sheet.cells
    {
        if claimed.contains(&(*row, *col)) {
            continue;
        }
        worksheet.write_string_with_format(*row, *col, text, formats.for_style(*style))?;
    }

    worksheet.autofit();
    Ok(())
}

/// Table headers must be unique within a table; repeats get a numeric suffix.
fn table_columns(headers: &[String]) -> Vec<TableColumn> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .map(|h| {
            let mut header = h.clone();
            let mut n = 2;
            while !seen.insert(header.to_lowercase()) {
                header = format!("{h} {n}");
                n += 1;
            }
            TableColumn::new().set_header(header)
        })
        .collect()
}

fn table_style(name: &str) -> TableStyle {
    match name {
        "TableStyleLight1" => TableStyle::Light1,
        "TableStyleMedium2" => TableStyle::Medium2,
        _ => TableStyle::Medium9,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{compose_workbook, fixtures, ExportOptions};

    #[test]
    fn renders_a_workbook_with_merges_and_tables() {
        let (book, _) = compose_workbook(
            &fixtures::scenario(),
            &fixtures::catalog(),
            ExportOptions::default(),
        )
        .unwrap();
        let bytes = render(&book).unwrap();
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[test]
    fn header_only_tables_render_as_plain_cells() {
        let mut scenario = fixtures::scenario();
        scenario.steps[0].params.clear();
        scenario.steps[0].response.clear();
        let (book, _) =
            compose_workbook(&scenario, &fixtures::catalog(), ExportOptions::default()).unwrap();
        assert!(render(&book).is_ok());
    }

    #[test]
    fn repeated_headers_are_made_unique() {
        let headers = vec!["ID".to_string(), "name".to_string(), "Name".to_string()];
        assert_eq!(table_columns(&headers).len(), 3);
    }

    #[test]
    fn unknown_table_style_falls_back() {
        assert!(matches!(table_style("Nope"), TableStyle::Medium9));
    }
}
