//! HTML rendering of a saved scenario.

use super::{resolve_steps, ExportReport, ResolvedGrid, ResolvedStep};
use crate::catalog::ActionCatalog;
use crate::error::Result;
use crate::scenario::Scenario;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;margin-bottom:1em}\
th,td{border:1px solid #999;padding:4px 8px;text-align:left}\
th{background:#eee}\
.annotation{font-style:italic}\
.no-data{color:#777}";

/// Render `scenario` as a standalone HTML document.
pub fn compose_markup(scenario: &Scenario, catalog: &ActionCatalog) -> Result<(String, ExportReport)> {
    let (steps, report) = resolve_steps(scenario, catalog)?;

    let title = escape(&scenario.name);
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{title}</title>");
    let _ = writeln!(out, "<style>{STYLE}</style>");
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{title}</h1>");
    for step in &steps {
        write_step(&mut out, step);
    }
    out.push_str("</body>\n</html>\n");
    Ok((out, report))
}

fn write_step(out: &mut String, step: &ResolvedStep<'_>) {
    let _ = writeln!(out, "<section class=\"step\" id=\"step-{}\">", step.ordinal);
    let _ = writeln!(
        out,
        "<h2>Step {}: {}</h2>",
        step.ordinal,
        escape(&step.action.action_code)
    );
    let _ = writeln!(
        out,
        "<p class=\"meta\">{} &middot; {} &middot; {}</p>",
        escape(step.action.kind.as_str()),
        escape(&step.action.component_name),
        escape(&step.action.group_name)
    );

    write_annotation(out, "Before", &step.step.before_description);
    for grid in &step.grids {
        write_grid(out, grid);
    }
    write_annotation(out, "After", &step.step.after_description);

    out.push_str("</section>\n");
}

fn write_annotation(out: &mut String, label: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let _ = writeln!(
        out,
        "<div class=\"annotation\"><strong>{label}</strong><p>{}</p></div>",
        escape(text)
    );
}

fn write_grid(out: &mut String, grid: &ResolvedGrid<'_>) {
    let _ = writeln!(out, "<h3>{}</h3>", escape(grid.kind.title()));
    if grid.rows.is_empty() || grid.columns.is_empty() {
        out.push_str("<p class=\"no-data\">No data</p>\n");
        return;
    }

    out.push_str("<table border=\"1\">\n<thead><tr>");
    for column in &grid.columns {
        let _ = write!(out, "<th>{}</th>", escape(&column.header));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for record in grid.rows {
        out.push_str("<tr>");
        for column in &grid.columns {
            let _ = write!(out, "<td>{}</td>", escape(&record.text(&column.key)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    fn html() -> String {
        compose_markup(&fixtures::scenario(), &fixtures::catalog())
            .unwrap()
            .0
    }

    #[test]
    fn one_section_per_exported_step() {
        let html = html();
        assert_eq!(html.matches("<section").count(), 2);
        assert!(html.contains("<h2>Step 1: get-user</h2>"));
        assert!(html.contains("<h2>Step 3: noop</h2>"));
        assert!(!html.contains("retired-action"));
        assert!(html.contains("FetchAndVerify"));
    }

    #[test]
    fn grids_render_as_tables_without_id_column() {
        let html = html();
        assert!(html.contains("<h3>Parameters (Path &amp; Query)</h3>"));
        assert!(html.contains("<th>Path: id</th>"));
        assert!(!html.contains("<th>ID</th>"));
        assert!(html.contains("<td>42</td>"));
        assert!(!html.contains("<h3>Request Body</h3>"), "absent grid is not rendered");
    }

    #[test]
    fn values_are_escaped() {
        let html = html();
        assert!(html.contains("<td>&lt;b&gt;Bob&lt;/b&gt;</td>"));
        assert!(!html.contains("<b>Bob</b>"));
    }

    #[test]
    fn empty_grid_renders_placeholder() {
        let mut scenario = fixtures::scenario();
        scenario.steps[0].response.clear();
        let (html, _) = compose_markup(&scenario, &fixtures::catalog()).unwrap();
        assert!(html.contains("<h3>Response Verification</h3>\n<p class=\"no-data\">No data</p>"));
    }

    #[test]
    fn annotations_appear_when_present() {
        let html = html();
        assert!(html.contains("<strong>Before</strong><p>Seed the user table</p>"));
        assert!(!html.contains("<strong>After</strong>"));
    }

    #[test]
    fn escape_handles_markup_characters() {
        assert_eq!(escape(r#"a&b<"c">'d'"#), "a&amp;b&lt;&quot;c&quot;&gt;&#39;d&#39;");
    }
}
