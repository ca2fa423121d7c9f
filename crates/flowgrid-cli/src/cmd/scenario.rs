use super::App;
use crate::output::{print_grid, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use flowgrid_core::client::ScenarioBackend;
use flowgrid_core::flow::{Command, CommandOutput, FlowModel, LoadOutcome, LoadState};
use flowgrid_core::scenario::Scenario;
use flowgrid_core::session::Session;
use flowgrid_core::types::{DescriptionSlot, GridKind};
use flowgrid_core::{io, FlowgridError};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ScenarioSubcommand {
    /// Start a new, unsaved draft
    New {
        draft: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Overwrite an existing draft file
        #[arg(long)]
        force: bool,
    },
    /// Show a draft's steps
    Show { draft: PathBuf },
    /// Rename the scenario
    Rename {
        draft: PathBuf,
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Append a step for a catalog action
    AddStep { draft: PathBuf, action_code: String },
    /// Remove a step
    RemoveStep { draft: PathBuf, step_id: String },
    /// Move the step at one position to another (1-based, as in `show`)
    Move {
        draft: PathBuf,
        from: usize,
        to: usize,
    },
    /// Put the steps in the given order; every step id exactly once
    Reorder {
        draft: PathBuf,
        #[arg(required = true)]
        step_ids: Vec<String>,
    },
    /// Set the before or after annotation of a step
    Describe {
        draft: PathBuf,
        step_id: String,
        /// before | after
        slot: DescriptionSlot,
        /// Annotation text; omit to clear
        text: Vec<String>,
    },
    /// Append a blank row to one of a step's grids
    AddRow {
        draft: PathBuf,
        step_id: String,
        /// params | request | response
        grid: GridKind,
    },
    /// Remove a row from one of a step's grids
    RemoveRow {
        draft: PathBuf,
        step_id: String,
        grid: GridKind,
        row_id: String,
    },
    /// Set one cell, addressed by row id and column key or header
    SetCell {
        draft: PathBuf,
        step_id: String,
        grid: GridKind,
        row_id: String,
        column: String,
        value: Vec<String>,
    },
    /// Show one step with its annotations and grids
    Expand { draft: PathBuf, step_id: String },
    /// Persist the draft to the backend and record the assigned id
    Save { draft: PathBuf },
    /// Fetch a stored scenario into a draft file
    Load {
        scenario_id: String,
        /// Draft file to write
        #[arg(long)]
        out: PathBuf,
    },
    /// List scenarios stored on the backend
    List,
}

pub fn run(app: &App, subcmd: ScenarioSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ScenarioSubcommand::New { draft, name, force } => new(app, &draft, name, force),
        ScenarioSubcommand::Show { draft } => show(app, &draft),
        ScenarioSubcommand::Rename { draft, name } => rename(app, &draft, &name.join(" ")),
        ScenarioSubcommand::AddStep { draft, action_code } => add_step(app, &draft, &action_code),
        ScenarioSubcommand::RemoveStep { draft, step_id } => remove_step(app, &draft, &step_id),
        ScenarioSubcommand::Move { draft, from, to } => move_step(app, &draft, from, to),
        ScenarioSubcommand::Reorder { draft, step_ids } => reorder(app, &draft, step_ids),
        ScenarioSubcommand::Describe {
            draft,
            step_id,
            slot,
            text,
        } => describe(app, &draft, &step_id, slot, text.join(" ")),
        ScenarioSubcommand::AddRow {
            draft,
            step_id,
            grid,
        } => add_row(app, &draft, &step_id, grid),
        ScenarioSubcommand::RemoveRow {
            draft,
            step_id,
            grid,
            row_id,
        } => remove_row(app, &draft, &step_id, grid, &row_id),
        ScenarioSubcommand::SetCell {
            draft,
            step_id,
            grid,
            row_id,
            column,
            value,
        } => set_cell(app, &draft, &step_id, grid, &row_id, &column, value.join(" ")),
        ScenarioSubcommand::Expand { draft, step_id } => expand(app, &draft, &step_id),
        ScenarioSubcommand::Save { draft } => save(app, &draft),
        ScenarioSubcommand::Load { scenario_id, out } => load(app, &scenario_id, &out),
        ScenarioSubcommand::List => list(app),
    }
}

// ---------------------------------------------------------------------------
// Draft files
// ---------------------------------------------------------------------------

/// Read a draft in the wire format and check its step and row invariants.
pub fn read_draft(path: &Path) -> anyhow::Result<FlowModel> {
    let scenario: Scenario = io::read_json(path)
        .with_context(|| format!("cannot read draft {}", path.display()))?;
    FlowModel::from_scenario(scenario).with_context(|| format!("invalid draft {}", path.display()))
}

fn write_draft(path: &Path, model: &FlowModel) -> anyhow::Result<()> {
    io::write_json(path, &model.snapshot())
        .with_context(|| format!("cannot write draft {}", path.display()))
}

/// Print `message`, or `value` as JSON with `--json`.
fn report(app: &App, message: &str, value: serde_json::Value) -> anyhow::Result<()> {
    if app.json {
        print_json(&value)
    } else {
        println!("{message}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Local edits
// ---------------------------------------------------------------------------

fn new(app: &App, draft: &Path, name: Option<String>, force: bool) -> anyhow::Result<()> {
    if draft.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", draft.display());
    }
    let mut model = FlowModel::new();
    if let Some(name) = name {
        model.rename(name);
    }
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Created draft {}", draft.display()),
        serde_json::json!({ "draft": draft, "scenarioName": model.scenario().name }),
    )
}

fn show(app: &App, draft: &Path) -> anyhow::Result<()> {
    let model = read_draft(draft)?;
    let scenario = model.scenario();
    if app.json {
        return print_json(scenario);
    }

    println!("Scenario: {}", scenario.name);
    println!(
        "ID:       {}",
        scenario.id.as_deref().unwrap_or("(unsaved)")
    );
    println!("Mode:     {}", model.mode());
    if scenario.steps.is_empty() {
        println!("\nNo steps.");
        return Ok(());
    }
    println!();
    let rows = scenario
        .steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            vec![
                (i + 1).to_string(),
                step.id.clone(),
                step.action_code.clone(),
                step.params.len().to_string(),
                step.request.len().to_string(),
                step.response.len().to_string(),
            ]
        })
        .collect();
    print_table(&["#", "ID", "ACTION", "PARAMS", "REQUEST", "RESPONSE"], rows);
    Ok(())
}

fn rename(app: &App, draft: &Path, name: &str) -> anyhow::Result<()> {
    let mut model = read_draft(draft)?;
    model.rename(name);
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Renamed scenario to '{name}'"),
        serde_json::json!({ "scenarioName": name }),
    )
}

fn remove_step(app: &App, draft: &Path, step_id: &str) -> anyhow::Result<()> {
    let mut model = read_draft(draft)?;
    if !model.remove_step(step_id) {
        return Err(FlowgridError::StepNotFound(step_id.to_string()).into());
    }
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Removed step {step_id}"),
        serde_json::json!({ "stepId": step_id, "removed": true }),
    )
}

fn move_step(app: &App, draft: &Path, from: usize, to: usize) -> anyhow::Result<()> {
    let (Some(from_index), Some(to_index)) = (from.checked_sub(1), to.checked_sub(1)) else {
        anyhow::bail!("positions start at 1");
    };
    let mut model = read_draft(draft)?;
    model.move_step(from_index, to_index)?;
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Moved step {from} to position {to}"),
        serde_json::json!({ "order": model.scenario().step_ids() }),
    )
}

fn reorder(app: &App, draft: &Path, step_ids: Vec<String>) -> anyhow::Result<()> {
    let mut model = read_draft(draft)?;
    model.reorder(&step_ids)?;
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Reordered {} steps", step_ids.len()),
        serde_json::json!({ "order": step_ids }),
    )
}

fn describe(
    app: &App,
    draft: &Path,
    step_id: &str,
    slot: DescriptionSlot,
    text: String,
) -> anyhow::Result<()> {
    let mut model = read_draft(draft)?;
    model.update_description(step_id, slot, text)?;
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Updated {} annotation of {step_id}", slot.label()),
        serde_json::json!({ "stepId": step_id, "slot": slot }),
    )
}

// ---------------------------------------------------------------------------
// Catalog-backed edits
// ---------------------------------------------------------------------------

fn add_step(app: &App, draft: &Path, action_code: &str) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let mut session = app.session(&rt, read_draft(draft)?)?;
    let output = session.apply(Command::AddStep {
        action_code: action_code.to_string(),
    })?;
    let CommandOutput::StepAdded(step_id) = output else {
        anyhow::bail!("unexpected result adding step: {output:?}");
    };
    write_draft(draft, session.model())?;
    report(
        app,
        &format!("Added step {step_id} ({action_code})"),
        serde_json::json!({ "stepId": step_id, "actionCode": action_code }),
    )
}

fn add_row(app: &App, draft: &Path, step_id: &str, grid: GridKind) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let mut session = app.session(&rt, read_draft(draft)?)?;
    let output = session.apply(Command::AppendRow {
        step_id: step_id.to_string(),
        grid,
    })?;
    let CommandOutput::RowAdded(row_id) = output else {
        anyhow::bail!("unexpected result adding row: {output:?}");
    };
    write_draft(draft, session.model())?;
    report(
        app,
        &format!("Added {grid} row {row_id} to {step_id}"),
        serde_json::json!({ "stepId": step_id, "grid": grid, "rowId": row_id }),
    )
}

fn remove_row(
    app: &App,
    draft: &Path,
    step_id: &str,
    grid: GridKind,
    row_id: &str,
) -> anyhow::Result<()> {
    let mut model = read_draft(draft)?;
    let id = model
        .scenario()
        .step(step_id)
        .ok_or_else(|| FlowgridError::StepNotFound(step_id.to_string()))?
        .grid(grid)
        .iter()
        .map(|r| r.id.clone())
        .find(|id| id.to_string() == row_id)
        .with_context(|| format!("no {grid} row '{row_id}' in step {step_id}"))?;
    model.remove_row(step_id, grid, &id)?;
    write_draft(draft, &model)?;
    report(
        app,
        &format!("Removed {grid} row {row_id} from {step_id}"),
        serde_json::json!({ "stepId": step_id, "grid": grid, "rowId": id }),
    )
}

fn set_cell(
    app: &App,
    draft: &Path,
    step_id: &str,
    grid: GridKind,
    row_id: &str,
    column: &str,
    value: String,
) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let mut session = app.session(&rt, read_draft(draft)?)?;
    let mut view = session.model().grid_matrix(session.catalog(), step_id, grid)?;

    let row = view
        .row_ids
        .iter()
        .position(|id| id.to_string() == row_id)
        .with_context(|| format!("no {grid} row '{row_id}' in step {step_id}"))?;
    let col = view
        .columns
        .iter()
        .position(|c| c.key == column || c.header == column)
        .with_context(|| format!("no column '{column}' in the {grid} grid of {step_id}"))?;
    view.cells[row][col] = value.clone();

    session.apply(Command::ApplyMatrix {
        step_id: step_id.to_string(),
        grid,
        cells: view.cells,
    })?;
    write_draft(draft, session.model())?;
    let key = &view.columns[col].key;
    report(
        app,
        &format!("Set {step_id}/{grid}/{row_id}/{key} = '{value}'"),
        serde_json::json!({ "stepId": step_id, "grid": grid, "rowId": row_id, "column": key, "value": value }),
    )
}

fn expand(app: &App, draft: &Path, step_id: &str) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let mut session = app.session(&rt, read_draft(draft)?)?;
    session.apply(Command::ToggleExpansion {
        step_id: step_id.to_string(),
    })?;

    let model = session.model();
    let views = GridKind::all()
        .iter()
        .map(|&kind| model.grid_matrix(session.catalog(), step_id, kind))
        .collect::<Result<Vec<_>, _>>()?;
    let step = model
        .scenario()
        .step(step_id)
        .ok_or_else(|| FlowgridError::StepNotFound(step_id.to_string()))?;

    if app.json {
        return print_json(&serde_json::json!({
            "stepId": step.id,
            "actionCode": step.action_code,
            "beforeDescription": step.before_description,
            "afterDescription": step.after_description,
            "grids": views,
        }));
    }

    println!("Step {} ({})", step.id, step.action_code);
    for slot in [DescriptionSlot::Before, DescriptionSlot::After] {
        let text = step.description(slot);
        if !text.is_empty() {
            println!("{}: {text}", slot.label());
        }
    }
    for view in &views {
        println!();
        print_grid(view);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

fn save(app: &App, draft: &Path) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let mut session = Session::with_model(app.backend(), read_draft(draft)?);
    let id = rt
        .block_on(session.persist())
        .with_context(|| format!("cannot save to {}", app.server))?;
    write_draft(draft, session.model())?;
    report(
        app,
        &format!("Saved scenario {id}"),
        serde_json::json!({ "scenarioId": id }),
    )
}

fn load(app: &App, scenario_id: &str, out: &Path) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let mut session = Session::new(app.backend());
    match rt.block_on(session.load(scenario_id)) {
        LoadOutcome::Applied => {}
        LoadOutcome::Failed => {
            let reason = match session.model().load_state() {
                LoadState::Failed { reason, .. } => reason.clone(),
                _ => "unknown error".to_string(),
            };
            anyhow::bail!("cannot load scenario '{scenario_id}': {reason}");
        }
        LoadOutcome::Stale => anyhow::bail!("load of '{scenario_id}' was superseded"),
    }
    write_draft(out, session.model())?;
    report(
        app,
        &format!(
            "Loaded '{}' into {}",
            session.model().scenario().name,
            out.display()
        ),
        serde_json::json!({ "scenarioId": scenario_id, "draft": out }),
    )
}

fn list(app: &App) -> anyhow::Result<()> {
    let rt = app.runtime()?;
    let summaries = rt
        .block_on(app.backend().list())
        .with_context(|| format!("cannot list scenarios on {}", app.server))?;

    if app.json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("No scenarios.");
        return Ok(());
    }
    let rows = summaries
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.name.clone(),
                s.step_count.to_string(),
                s.updated_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STEPS", "UPDATED"], rows);
    Ok(())
}
