//! An editing session: the flow model wired to a catalog and a backend.
//!
//! Boundary failures end up as explicit state (an empty catalog, a failed
//! load state) or as returned errors; the model is never left half-updated.

use crate::catalog::{ActionCatalog, ActionDefinition};
use crate::client::ScenarioBackend;
use crate::error::Result;
use crate::export::{compose_markup, export_xlsx, ExportOptions, ExportReport};
use crate::flow::{Command, CommandOutput, FlowModel, LoadOutcome};

pub struct Session<B> {
    backend: B,
    catalog: ActionCatalog,
    model: FlowModel,
}

impl<B: ScenarioBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            catalog: ActionCatalog::default(),
            model: FlowModel::new(),
        }
    }

    /// Start from an existing model, e.g. a draft read from disk.
    pub fn with_model(backend: B, model: FlowModel) -> Self {
        Self {
            backend,
            catalog: ActionCatalog::default(),
            model,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &FlowModel {
        &self.model
    }

    pub fn into_model(self) -> FlowModel {
        self.model
    }

    /// Fetch the catalog. On failure the catalog is left empty.
    pub async fn refresh_catalog(&mut self) -> Result<usize> {
        let fetched = self.backend.fetch_catalog().await;
        self.catalog.refresh(fetched)
    }

    /// Use definitions read from somewhere other than the backend.
    pub fn replace_catalog(&mut self, actions: Vec<ActionDefinition>) -> usize {
        self.catalog.replace(actions);
        self.catalog.len()
    }

    pub fn apply(&mut self, command: Command) -> Result<CommandOutput> {
        self.model.apply(&self.catalog, command)
    }

    /// Replace the model's scenario with a fresh one.
    pub fn new_scenario(&mut self) {
        self.model.begin_load(None);
    }

    pub async fn load(&mut self, scenario_id: &str) -> LoadOutcome {
        let Some(ticket) = self.model.begin_load(Some(scenario_id)) else {
            return LoadOutcome::Stale;
        };
        let result = self.backend.load(scenario_id).await;
        self.model.complete_load(ticket, result)
    }

    /// Persist a snapshot and adopt the assigned id.
    pub async fn persist(&mut self) -> Result<String> {
        let snapshot = self.model.snapshot();
        let result = self.backend.persist(&snapshot).await;
        self.model.complete_persist(result)
    }

    pub fn export_workbook(&self, options: ExportOptions) -> Result<(Vec<u8>, ExportReport)> {
        export_xlsx(self.model.scenario(), &self.catalog, options)
    }

    pub fn export_markup(&self) -> Result<(String, ExportReport)> {
        compose_markup(self.model.scenario(), &self.catalog)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
