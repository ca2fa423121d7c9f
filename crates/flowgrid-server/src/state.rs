use flowgrid_core::config::Config;
use flowgrid_core::store::ScenarioStore;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<ScenarioStore>,
}

impl AppState {
    /// Open the configured scenario store. Without `storage.dir` scenarios
    /// live in memory for the lifetime of the process.
    pub fn new(config: Config) -> flowgrid_core::Result<Self> {
        let store = match config.storage_dir() {
            Some(dir) => ScenarioStore::open(&dir)?,
            None => {
                tracing::info!("no storage dir configured; scenarios are kept in memory");
                ScenarioStore::in_memory()
            }
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: ScenarioStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}
