use super::scenario::read_draft;
use super::App;
use crate::output::print_json;
use anyhow::Context;
use clap::ValueEnum;
use flowgrid_core::export::ExportReport;
use flowgrid_core::paths::{export_file_name, HTML_EXTENSION, XLSX_EXTENSION};
use flowgrid_core::{io, FlowgridError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Html,
    All,
}

impl ExportFormat {
    fn xlsx(self) -> bool {
        matches!(self, ExportFormat::Xlsx | ExportFormat::All)
    }

    fn html(self) -> bool {
        matches!(self, ExportFormat::Html | ExportFormat::All)
    }
}

pub fn run(app: &App, draft: &Path, format: ExportFormat, out_dir: &Path) -> anyhow::Result<()> {
    let model = read_draft(draft)?;
    let scenario = model.scenario();
    let scenario_id = scenario
        .id
        .clone()
        .ok_or(FlowgridError::ExportPrecondition)
        .context("save the draft with `flowgrid scenario save` before exporting")?;
    let name = scenario.name.clone();

    let rt = app.runtime()?;
    let session = app.session(&rt, model)?;
    io::ensure_dir(out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let mut files: Vec<PathBuf> = Vec::new();
    let mut report = ExportReport::default();

    if format.xlsx() {
        let (bytes, r) = session.export_workbook(app.config.export.options())?;
        let path = out_dir.join(export_file_name(&scenario_id, &name, XLSX_EXTENSION));
        io::atomic_write(&path, &bytes)
            .with_context(|| format!("cannot write {}", path.display()))?;
        files.push(path);
        report = r;
    }
    if format.html() {
        let (html, r) = session.export_markup()?;
        let path = out_dir.join(export_file_name(&scenario_id, &name, HTML_EXTENSION));
        io::atomic_write(&path, html.as_bytes())
            .with_context(|| format!("cannot write {}", path.display()))?;
        files.push(path);
        report = r;
    }

    if app.json {
        return print_json(&serde_json::json!({
            "scenarioId": scenario_id,
            "files": files,
            "exported": report.exported,
            "skipped": report.skipped,
        }));
    }
    for skipped in &report.skipped {
        eprintln!(
            "warning: step {} ({}) skipped: action '{}' is not in the catalog",
            skipped.ordinal, skipped.step_id, skipped.action_code
        );
    }
    for file in &files {
        println!("Wrote {}", file.display());
    }
    println!("{} step(s) exported", report.exported);
    Ok(())
}
