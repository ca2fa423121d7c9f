use crate::error::{FlowgridError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "flowgrid.yaml";
pub const DEFAULT_ACTIONS_FILE: &str = "actions.json";
pub const DEFAULT_STORAGE_DIR: &str = ".flowgrid/scenarios";

pub const XLSX_EXTENSION: &str = "xlsx";
pub const HTML_EXTENSION: &str = "html";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// File holding one stored scenario. `id` must already be validated.
pub fn scenario_file(storage_dir: &Path, id: &str) -> PathBuf {
    storage_dir.join(format!("{id}.json"))
}

/// Export artifact name: `<id>_<name>.<ext>`, restricted to `[A-Za-z0-9._-]`.
pub fn export_file_name(scenario_id: &str, scenario_name: &str, extension: &str) -> String {
    let stem = format!("{scenario_id}_{scenario_name}");
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.{extension}", cleaned.trim_end_matches('_'))
}

// ---------------------------------------------------------------------------
// Scenario id validation
// ---------------------------------------------------------------------------

static SCENARIO_ID_RE: OnceLock<Regex> = OnceLock::new();

fn scenario_id_re() -> &'static Regex {
    SCENARIO_ID_RE
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]*$").expect("scenario id pattern"))
}

/// Ids become file names, so only alphanumerics, `-` and `_` are allowed.
pub fn validate_scenario_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !scenario_id_re().is_match(id) {
        return Err(FlowgridError::InvalidScenarioId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["s1", "5f0c7a1e-9d2b-4c8e-8f6a-1b2c3d4e5f60", "My_Scenario-2"] {
            validate_scenario_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ids() {
        for id in ["", "../etc/passwd", "-lead", "has space", "a/b", "x.json"] {
            assert!(validate_scenario_id(id).is_err(), "expected invalid: {id}");
        }
        assert!(validate_scenario_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn path_helpers() {
        let dir = Path::new("/tmp/proj");
        assert_eq!(config_path(dir), PathBuf::from("/tmp/proj/flowgrid.yaml"));
        assert_eq!(
            scenario_file(dir, "abc"),
            PathBuf::from("/tmp/proj/abc.json")
        );
    }

    #[test]
    fn export_names_are_sanitised() {
        assert_eq!(
            export_file_name("s-1", "User lookup (v2)", XLSX_EXTENSION),
            "s-1_User_lookup__v2.xlsx"
        );
        assert_eq!(export_file_name("s-1", "", HTML_EXTENSION), "s-1.html");
    }
}
