//! The scenario flow model.
//!
//! A single [`FlowModel`] owns the editor state. Every mutation goes through a
//! named command (or [`FlowModel::apply`]), is applied atomically, bumps the
//! model revision and publishes a [`FlowEvent`]. Asynchronous collaborators
//! never touch the state directly: a load is bracketed by [`FlowModel::begin_load`]
//! and [`FlowModel::complete_load`], and a persist result is handed to
//! [`FlowModel::complete_persist`].

use crate::catalog::{ActionCatalog, ActionDefinition};
use crate::error::{FlowgridError, Result};
use crate::reorder::{move_item, validate_order};
use crate::rows::{blank_row, check_rows, from_matrix, to_matrix, Matrix, RowId, RowRecord};
use crate::scenario::{Scenario, ScenarioStep};
use crate::schema::{column_keys, resolve_columns, Column};
use crate::types::{DescriptionSlot, EditMode, GridKind};
use serde::Serialize;
use tokio::sync::broadcast;

pub type StepId = String;

/// Name given to the scenario created by `begin_load(None)`.
pub const NEW_SCENARIO_NAME: &str = "New Scenario";

const EVENT_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    Idle,
    Loading { scenario_id: String },
    Failed { scenario_id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowState {
    pub scenario: Scenario,
    pub expanded_step: Option<StepId>,
    pub mode: EditMode,
    pub load: LoadState,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            scenario: Scenario::new(NEW_SCENARIO_NAME),
            expanded_step: None,
            mode: EditMode::Create,
            load: LoadState::Idle,
        }
    }
}

/// Handle for one outstanding load. Only the ticket of the most recent
/// `begin_load` can still apply its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    revision: u64,
    scenario_id: String,
}

impl LoadTicket {
    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// The response arrived after a newer load or a local edit and was
    /// discarded.
    Stale,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEventKind {
    StepAdded { step_id: StepId },
    StepRemoved { step_id: StepId },
    StepsReordered,
    GridUpdated { step_id: StepId, grid: GridKind },
    DescriptionUpdated { step_id: StepId, slot: DescriptionSlot },
    ExpansionChanged { step_id: Option<StepId> },
    Renamed,
    LoadStarted { scenario_id: String },
    Loaded { scenario_id: String },
    LoadFailed { scenario_id: String },
    Persisted { scenario_id: String },
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEvent {
    pub revision: u64,
    #[serde(flatten)]
    pub kind: FlowEventKind,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Editing intents, in the shape a UI or CLI produces them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddStep { action_code: String },
    RemoveStep { step_id: StepId },
    Reorder { order: Vec<StepId> },
    MoveStep { from: usize, to: usize },
    UpdateGrid { step_id: StepId, grid: GridKind, rows: Vec<RowRecord> },
    UpdateDescription { step_id: StepId, slot: DescriptionSlot, text: String },
    ToggleExpansion { step_id: StepId },
    Rename { name: String },
    AppendRow { step_id: StepId, grid: GridKind },
    RemoveRow { step_id: StepId, grid: GridKind, row_id: RowId },
    ApplyMatrix { step_id: StepId, grid: GridKind, cells: Matrix },
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Done,
    StepAdded(StepId),
    Removed(bool),
    RowAdded(RowId),
}

/// One grid as a positional matrix, with the columns and row ids that give
/// the cells their meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridView {
    pub grid: GridKind,
    pub columns: Vec<Column>,
    pub row_ids: Vec<RowId>,
    pub cells: Matrix,
}

// ---------------------------------------------------------------------------
// FlowModel
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FlowModel {
    state: FlowState,
    revision: u64,
    next_step: u64,
    load_seq: u64,
    events: broadcast::Sender<FlowEvent>,
}

impl Default for FlowModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowModel {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: FlowState::default(),
            revision: 0,
            next_step: 0,
            load_seq: 0,
            events,
        }
    }

    /// Start from an existing scenario, e.g. a draft read from disk.
    pub fn from_scenario(scenario: Scenario) -> Result<Self> {
        scenario.validate()?;
        let mut model = Self::new();
        model.state.mode = if scenario.id.is_some() {
            EditMode::Edit
        } else {
            EditMode::Create
        };
        model.next_step = highest_step_number(&scenario);
        model.state.scenario = scenario;
        Ok(model)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn scenario(&self) -> &Scenario {
        &self.state.scenario
    }

    pub fn expanded_step(&self) -> Option<&str> {
        self.state.expanded_step.as_deref()
    }

    pub fn mode(&self) -> EditMode {
        self.state.mode
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state.load
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Owned copy of the scenario for persisting or exporting.
    pub fn snapshot(&self) -> Scenario {
        self.state.scenario.clone()
    }

    fn commit(&mut self, kind: FlowEventKind) {
        self.revision += 1;
        tracing::debug!(revision = self.revision, event = ?kind, "flow model updated");
        // No subscribers is fine.
        let _ = self.events.send(FlowEvent {
            revision: self.revision,
            kind,
        });
    }

    /// Numbering continues after the highest `step-N` already in the
    /// scenario, so an id freed by a removal is not handed out again.
    fn next_step_id(&mut self) -> StepId {
        loop {
            self.next_step += 1;
            let id = format!("step-{}", self.next_step);
            if self.state.scenario.step(&id).is_none() {
                return id;
            }
        }
    }

    fn step_mut(&mut self, step_id: &str) -> Result<&mut ScenarioStep> {
        self.state
            .scenario
            .step_mut(step_id)
            .ok_or_else(|| FlowgridError::StepNotFound(step_id.to_string()))
    }

    fn step_action<'c>(
        &self,
        catalog: &'c ActionCatalog,
        step_id: &str,
    ) -> Result<&'c ActionDefinition> {
        let step = self
            .state
            .scenario
            .step(step_id)
            .ok_or_else(|| FlowgridError::StepNotFound(step_id.to_string()))?;
        catalog
            .lookup(&step.action_code)
            .ok_or_else(|| FlowgridError::UnknownAction(step.action_code.clone()))
    }

    // -----------------------------------------------------------------------
    // Step commands
    // -----------------------------------------------------------------------

    /// Append a step for `action_code`. Each non-absent grid starts with one
    /// blank row shaped by the resolved columns.
    pub fn add_step(&mut self, catalog: &ActionCatalog, action_code: &str) -> Result<StepId> {
        let action = catalog
            .lookup(action_code)
            .ok_or_else(|| FlowgridError::UnknownAction(action_code.to_string()))?;

        let step_id = self.next_step_id();
        let mut step = ScenarioStep::new(step_id.clone(), action_code);
        for &kind in GridKind::all() {
            let columns = column_keys(action, kind);
            if !columns.is_empty() {
                step.grid_mut(kind).push(blank_row(kind, &columns));
            }
        }
        self.state.scenario.steps.push(step);
        self.commit(FlowEventKind::StepAdded {
            step_id: step_id.clone(),
        });
        Ok(step_id)
    }

    /// Remove a step. Returns `false` when no such step exists.
    pub fn remove_step(&mut self, step_id: &str) -> bool {
        let before = self.state.scenario.steps.len();
        self.state.scenario.steps.retain(|s| s.id != step_id);
        if self.state.scenario.steps.len() == before {
            return false;
        }
        if self.state.expanded_step.as_deref() == Some(step_id) {
            self.state.expanded_step = None;
        }
        self.commit(FlowEventKind::StepRemoved {
            step_id: step_id.to_string(),
        });
        true
    }

    /// Replace the step order. `order` must list every step exactly once.
    pub fn reorder(&mut self, order: &[StepId]) -> Result<()> {
        let current = self.state.scenario.step_ids();
        let proposed: Vec<&str> = order.iter().map(String::as_str).collect();
        validate_order(&current, &proposed)?;

        let mut remaining = std::mem::take(&mut self.state.scenario.steps);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(pos) = remaining.iter().position(|s| &s.id == id) {
                reordered.push(remaining.swap_remove(pos));
            }
        }
        self.state.scenario.steps = reordered;
        self.commit(FlowEventKind::StepsReordered);
        Ok(())
    }

    pub fn move_step(&mut self, from: usize, to: usize) -> Result<()> {
        move_item(&mut self.state.scenario.steps, from, to)?;
        if from != to {
            self.commit(FlowEventKind::StepsReordered);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Grid and description commands
    // -----------------------------------------------------------------------

    /// Replace one grid of a step wholesale. Column keys are not checked
    /// against the schema; row identity is.
    pub fn update_grid(&mut self, step_id: &str, kind: GridKind, rows: Vec<RowRecord>) -> Result<()> {
        check_rows(&rows)?;
        let step = self.step_mut(step_id)?;
        *step.grid_mut(kind) = rows;
        self.commit(FlowEventKind::GridUpdated {
            step_id: step_id.to_string(),
            grid: kind,
        });
        Ok(())
    }

    pub fn update_description(
        &mut self,
        step_id: &str,
        slot: DescriptionSlot,
        text: impl Into<String>,
    ) -> Result<()> {
        let step = self.step_mut(step_id)?;
        *step.description_mut(slot) = text.into();
        self.commit(FlowEventKind::DescriptionUpdated {
            step_id: step_id.to_string(),
            slot,
        });
        Ok(())
    }

    /// Expand `step_id`, or collapse it if it is already the expanded step.
    pub fn toggle_expansion(&mut self, step_id: &str) -> Result<()> {
        if self.state.scenario.step(step_id).is_none() {
            return Err(FlowgridError::StepNotFound(step_id.to_string()));
        }
        let expanded = if self.state.expanded_step.as_deref() == Some(step_id) {
            None
        } else {
            Some(step_id.to_string())
        };
        self.state.expanded_step = expanded.clone();
        self.commit(FlowEventKind::ExpansionChanged { step_id: expanded });
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.state.scenario.name = name.into();
        self.commit(FlowEventKind::Renamed);
    }

    /// Append a blank row to one grid and return its id.
    pub fn append_row(
        &mut self,
        catalog: &ActionCatalog,
        step_id: &str,
        kind: GridKind,
    ) -> Result<RowId> {
        let columns = column_keys(self.step_action(catalog, step_id)?, kind);
        if columns.is_empty() {
            return Err(FlowgridError::InvalidRow(format!(
                "step '{step_id}' has no {kind} grid"
            )));
        }
        let row = blank_row(kind, &columns);
        let row_id = row.id.clone();
        self.step_mut(step_id)?.grid_mut(kind).push(row);
        self.commit(FlowEventKind::GridUpdated {
            step_id: step_id.to_string(),
            grid: kind,
        });
        Ok(row_id)
    }

    /// Remove one row by id. Returns `false` when the grid holds no such row.
    pub fn remove_row(&mut self, step_id: &str, kind: GridKind, row_id: &RowId) -> Result<bool> {
        let grid = self.step_mut(step_id)?.grid_mut(kind);
        let before = grid.len();
        grid.retain(|r| &r.id != row_id);
        if grid.len() == before {
            return Ok(false);
        }
        self.commit(FlowEventKind::GridUpdated {
            step_id: step_id.to_string(),
            grid: kind,
        });
        Ok(true)
    }

    /// The grid as the editing surface sees it.
    pub fn grid_matrix(
        &self,
        catalog: &ActionCatalog,
        step_id: &str,
        kind: GridKind,
    ) -> Result<GridView> {
        let action = self.step_action(catalog, step_id)?;
        let columns = resolve_columns(action, kind);
        let keys: Vec<String> = columns.iter().map(|c| c.key.clone()).collect();
        let rows = self
            .state
            .scenario
            .step(step_id)
            .map(|s| s.grid(kind))
            .unwrap_or(&[]);
        Ok(GridView {
            grid: kind,
            row_ids: rows.iter().map(|r| r.id.clone()).collect(),
            cells: to_matrix(rows, &keys),
            columns,
        })
    }

    /// Write an edited matrix back. Row positions keep their ids.
    pub fn apply_matrix(
        &mut self,
        catalog: &ActionCatalog,
        step_id: &str,
        kind: GridKind,
        cells: &[Vec<String>],
    ) -> Result<()> {
        let keys = column_keys(self.step_action(catalog, step_id)?, kind);
        let previous = self
            .state
            .scenario
            .step(step_id)
            .map(|s| s.grid(kind).to_vec())
            .unwrap_or_default();
        let rows = from_matrix(kind, &previous, &keys, cells);
        self.update_grid(step_id, kind, rows)
    }

    /// Dispatch a [`Command`] to the matching named operation.
    pub fn apply(&mut self, catalog: &ActionCatalog, command: Command) -> Result<CommandOutput> {
        match command {
            Command::AddStep { action_code } => {
                self.add_step(catalog, &action_code).map(CommandOutput::StepAdded)
            }
            Command::RemoveStep { step_id } => Ok(CommandOutput::Removed(self.remove_step(&step_id))),
            Command::Reorder { order } => self.reorder(&order).map(|_| CommandOutput::Done),
            Command::MoveStep { from, to } => self.move_step(from, to).map(|_| CommandOutput::Done),
            Command::UpdateGrid { step_id, grid, rows } => {
                self.update_grid(&step_id, grid, rows).map(|_| CommandOutput::Done)
            }
            Command::UpdateDescription { step_id, slot, text } => self
                .update_description(&step_id, slot, text)
                .map(|_| CommandOutput::Done),
            Command::ToggleExpansion { step_id } => {
                self.toggle_expansion(&step_id).map(|_| CommandOutput::Done)
            }
            Command::Rename { name } => {
                self.rename(name);
                Ok(CommandOutput::Done)
            }
            Command::AppendRow { step_id, grid } => self
                .append_row(catalog, &step_id, grid)
                .map(CommandOutput::RowAdded),
            Command::RemoveRow { step_id, grid, row_id } => self
                .remove_row(&step_id, grid, &row_id)
                .map(CommandOutput::Removed),
            Command::ApplyMatrix { step_id, grid, cells } => self
                .apply_matrix(catalog, &step_id, grid, &cells)
                .map(|_| CommandOutput::Done),
            Command::Reset => {
                self.reset();
                Ok(CommandOutput::Done)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Load / persist
    // -----------------------------------------------------------------------

    /// Start loading `scenario_id`, or start a fresh scenario when `None`.
    ///
    /// Any earlier ticket becomes stale.
    pub fn begin_load(&mut self, scenario_id: Option<&str>) -> Option<LoadTicket> {
        self.load_seq += 1;
        self.state.expanded_step = None;

        let Some(id) = scenario_id else {
            self.state.scenario = Scenario::new(NEW_SCENARIO_NAME);
            self.state.mode = EditMode::Create;
            self.state.load = LoadState::Idle;
            self.commit(FlowEventKind::Reset);
            return None;
        };

        self.state.scenario = Scenario::default();
        self.state.mode = EditMode::Edit;
        self.state.load = LoadState::Loading {
            scenario_id: id.to_string(),
        };
        self.commit(FlowEventKind::LoadStarted {
            scenario_id: id.to_string(),
        });
        Some(LoadTicket {
            seq: self.load_seq,
            revision: self.revision,
            scenario_id: id.to_string(),
        })
    }

    /// Apply the outcome of the load started with `ticket`.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<Scenario>) -> LoadOutcome {
        if ticket.seq != self.load_seq {
            tracing::warn!(
                scenario_id = %ticket.scenario_id,
                "discarding response of a superseded load"
            );
            return LoadOutcome::Stale;
        }
        if ticket.revision != self.revision {
            tracing::warn!(
                scenario_id = %ticket.scenario_id,
                "discarding load response; the scenario was edited while loading"
            );
            self.state.load = LoadState::Idle;
            return LoadOutcome::Stale;
        }

        match result.and_then(|scenario| scenario.validate().map(|_| scenario)) {
            Ok(mut scenario) => {
                if scenario.id.is_none() {
                    scenario.id = Some(ticket.scenario_id.clone());
                }
                self.next_step = highest_step_number(&scenario);
                self.state.scenario = scenario;
                self.state.mode = EditMode::Edit;
                self.state.load = LoadState::Idle;
                self.commit(FlowEventKind::Loaded {
                    scenario_id: ticket.scenario_id,
                });
                LoadOutcome::Applied
            }
            Err(e) => {
                let reason = match e {
                    FlowgridError::LoadFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::warn!(scenario_id = %ticket.scenario_id, %reason, "scenario load failed");
                self.state.scenario = Scenario::default();
                self.state.mode = EditMode::Create;
                self.state.load = LoadState::Failed {
                    scenario_id: ticket.scenario_id.clone(),
                    reason,
                };
                self.commit(FlowEventKind::LoadFailed {
                    scenario_id: ticket.scenario_id,
                });
                LoadOutcome::Failed
            }
        }
    }

    /// Apply the outcome of persisting a snapshot. Success adopts the
    /// assigned id and timestamp; failure leaves the model untouched.
    pub fn complete_persist(&mut self, result: Result<Scenario>) -> Result<String> {
        let saved = result.map_err(|e| match e {
            FlowgridError::PersistFailed(reason) => FlowgridError::PersistFailed(reason),
            other => FlowgridError::PersistFailed(other.to_string()),
        })?;
        let id = saved.id.ok_or_else(|| {
            FlowgridError::PersistFailed("backend response carried no scenario id".to_string())
        })?;

        self.state.scenario.id = Some(id.clone());
        self.state.scenario.updated_at = saved.updated_at;
        self.state.mode = EditMode::Edit;
        self.commit(FlowEventKind::Persisted {
            scenario_id: id.clone(),
        });
        Ok(id)
    }

    /// Back to the initial state. Outstanding loads become stale.
    pub fn reset(&mut self) {
        self.load_seq += 1;
        self.state = FlowState::default();
        self.commit(FlowEventKind::Reset);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

fn highest_step_number(scenario: &Scenario) -> u64 {
    scenario
        .steps
        .iter()
        .filter_map(|s| s.id.strip_prefix("step-")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}
