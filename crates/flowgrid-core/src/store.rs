//! Scenario persistence behind the HTTP backend.

use crate::error::{FlowgridError, Result};
use crate::paths::{scenario_file, validate_scenario_id};
use crate::scenario::{Scenario, ScenarioSummary};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Scenarios keyed by id. With a directory, every save is also written to
/// `<dir>/<id>.json` and existing files are read back on open.
#[derive(Debug, Default)]
pub struct ScenarioStore {
    dir: Option<PathBuf>,
    scenarios: Mutex<HashMap<String, Scenario>>,
}

impl ScenarioStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn open(dir: &Path) -> Result<Self> {
        crate::io::ensure_dir(dir)?;
        let mut scenarios = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match crate::io::read_json::<Scenario>(&path) {
                Ok(scenario) => match scenario.id.clone() {
                    Some(id) if validate_scenario_id(&id).is_ok() => {
                        scenarios.insert(id, scenario);
                    }
                    _ => tracing::warn!(file = %path.display(), "stored scenario has no valid id; ignored"),
                },
                Err(e) => tracing::warn!(file = %path.display(), error = %e, "unreadable scenario file; ignored"),
            }
        }
        tracing::info!(dir = %dir.display(), count = scenarios.len(), "scenario store opened");
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            scenarios: Mutex::new(scenarios),
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Scenario>> {
        self.scenarios.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `scenario`, assigning an id when it has none. Returns the stored
    /// copy with its id and `updatedAt` set.
    pub fn save(&self, mut scenario: Scenario) -> Result<Scenario> {
        let id = match scenario.id.take() {
            Some(id) => {
                validate_scenario_id(&id)?;
                id
            }
            None => uuid::Uuid::new_v4().to_string(),
        };
        scenario.id = Some(id.clone());
        scenario.updated_at = Some(chrono::Utc::now());

        if let Some(dir) = &self.dir {
            crate::io::write_json(&scenario_file(dir, &id), &scenario)?;
        }
        self.entries().insert(id.clone(), scenario.clone());
        tracing::info!(scenario_id = %id, steps = scenario.steps.len(), "scenario saved");
        Ok(scenario)
    }

    pub fn load(&self, id: &str) -> Result<Scenario> {
        validate_scenario_id(id)?;
        self.entries()
            .get(id)
            .cloned()
            .ok_or_else(|| FlowgridError::ScenarioNotFound(id.to_string()))
    }

    /// Summaries sorted by name, then id.
    pub fn list(&self) -> Vec<ScenarioSummary> {
        let mut summaries: Vec<ScenarioSummary> =
            self.entries().values().map(Scenario::summary).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioStep;
    use tempfile::TempDir;

    fn draft(name: &str) -> Scenario {
        let mut s = Scenario::new(name);
        s.steps.push(ScenarioStep::new("step-1", "noop"));
        s
    }

    #[test]
    fn save_assigns_id_and_timestamp() {
        let store = ScenarioStore::in_memory();
        let saved = store.save(draft("A")).unwrap();
        let id = saved.id.clone().unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert!(saved.updated_at.is_some());
        assert_eq!(store.load(&id).unwrap(), saved);
    }

    #[test]
    fn save_with_id_overwrites() {
        let store = ScenarioStore::in_memory();
        let mut first = store.save(draft("A")).unwrap();
        first.name = "A2".into();
        let second = store.save(first.clone()).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "A2");
    }

    #[test]
    fn unknown_and_invalid_ids() {
        let store = ScenarioStore::in_memory();
        assert!(matches!(
            store.load("nope"),
            Err(FlowgridError::ScenarioNotFound(_))
        ));
        assert!(matches!(
            store.load("../x"),
            Err(FlowgridError::InvalidScenarioId(_))
        ));
        let mut bad = draft("bad");
        bad.id = Some("a/b".into());
        assert!(store.save(bad).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn list_is_sorted_by_name() {
        let store = ScenarioStore::in_memory();
        store.save(draft("zeta")).unwrap();
        store.save(draft("alpha")).unwrap();
        let names: Vec<String> = store.list().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(store.list()[0].step_count, 1);
    }

    #[test]
    fn directory_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let id = {
            let store = ScenarioStore::open(dir.path()).unwrap();
            store.save(draft("persisted")).unwrap().id.unwrap()
        };
        std::fs::write(dir.path().join("junk.json"), "not json").unwrap();

        let reopened = ScenarioStore::open(dir.path()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.load(&id).unwrap().name, "persisted");
    }
}
