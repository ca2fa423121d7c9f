use flowgrid_core::flow::GridView;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<String>| {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{cell:w$}")
            })
            .collect();
        println!("{}", padded.join("  ").trim_end());
    };

    line(headers.iter().map(|h| h.to_string()).collect());
    line(widths.iter().map(|&w| "-".repeat(w)).collect());
    for row in rows {
        line(row);
    }
}

/// One grid as a table, the row id first. Absent grids print nothing.
pub fn print_grid(view: &GridView) {
    if view.columns.is_empty() {
        return;
    }
    println!("{}:", view.grid.title());
    let mut headers = vec!["ID"];
    headers.extend(view.columns.iter().map(|c| c.header.as_str()));
    let rows = view
        .row_ids
        .iter()
        .zip(&view.cells)
        .map(|(id, cells)| {
            let mut row = vec![id.to_string()];
            row.extend(cells.iter().cloned());
            row
        })
        .collect();
    print_table(&headers, rows);
}
