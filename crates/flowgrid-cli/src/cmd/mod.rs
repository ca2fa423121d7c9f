pub mod actions;
pub mod export;
pub mod health;
pub mod scenario;
pub mod serve;

use anyhow::Context;
use flowgrid_core::catalog::{ActionCatalog, ActionDefinition};
use flowgrid_core::client::HttpBackend;
use flowgrid_core::config::Config;
use flowgrid_core::flow::FlowModel;
use flowgrid_core::openapi;
use flowgrid_core::session::Session;
use std::path::{Path, PathBuf};

/// Resolved global options shared by every subcommand.
pub struct App {
    pub config: Config,
    pub server: String,
    pub catalog_file: Option<PathBuf>,
    pub json: bool,
}

impl App {
    pub fn new(
        config_path: Option<&Path>,
        server: Option<String>,
        catalog_file: Option<PathBuf>,
        json: bool,
    ) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("cannot read current directory")?;
        let config = Config::discover(config_path, &cwd).context("failed to load config")?;
        let server = server.unwrap_or_else(|| config.client.base_url.clone());
        Ok(Self {
            config,
            server,
            catalog_file,
            json,
        })
    }

    pub fn backend(&self) -> HttpBackend {
        HttpBackend::new(self.server.clone())
    }

    pub fn runtime(&self) -> anyhow::Result<tokio::runtime::Runtime> {
        Ok(tokio::runtime::Runtime::new()?)
    }

    /// A session over `model` with its catalog filled in, from `--catalog`
    /// when given and from the backend otherwise.
    pub fn session(
        &self,
        rt: &tokio::runtime::Runtime,
        model: FlowModel,
    ) -> anyhow::Result<Session<HttpBackend>> {
        let mut session = Session::with_model(self.backend(), model);
        match &self.catalog_file {
            Some(path) => {
                session.replace_catalog(read_catalog_file(path)?);
            }
            None => {
                rt.block_on(session.refresh_catalog())
                    .with_context(|| format!("cannot fetch the action catalog from {}", self.server))?;
            }
        }
        Ok(session)
    }

    pub fn catalog(&self, rt: &tokio::runtime::Runtime) -> anyhow::Result<ActionCatalog> {
        let session = self.session(rt, FlowModel::new())?;
        Ok(session.catalog().clone())
    }
}

/// A JSON array is read as action definitions; anything else as an apiList
/// manifest whose schema paths are relative to it.
fn read_catalog_file(path: &Path) -> anyhow::Result<Vec<ActionDefinition>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read catalog file {}", path.display()))?;
    if data.trim_start().starts_with('[') {
        let catalog = ActionCatalog::from_json(&data)
            .with_context(|| format!("invalid catalog file {}", path.display()))?;
        return Ok(catalog.actions().to_vec());
    }
    openapi::load_manifest(path).with_context(|| format!("invalid manifest {}", path.display()))
}
