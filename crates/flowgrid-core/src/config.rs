use crate::catalog::{ActionCatalog, ActionDefinition};
use crate::error::{FlowgridError, Result};
use crate::export::{ExportOptions, DEFAULT_ANNOTATION_WIDTH};
use crate::{openapi, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// CatalogSource
// ---------------------------------------------------------------------------

/// Where the server gets its action catalog from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogSource {
    /// A pre-flattened JSON array of action definitions.
    Actions { path: PathBuf },
    /// An `apiList.json` manifest naming one OpenAPI document per action.
    Manifest { path: PathBuf },
}

impl Default for CatalogSource {
    fn default() -> Self {
        CatalogSource::Actions {
            path: PathBuf::from(paths::DEFAULT_ACTIONS_FILE),
        }
    }
}

impl CatalogSource {
    pub fn path(&self) -> &Path {
        match self {
            CatalogSource::Actions { path } | CatalogSource::Manifest { path } => path,
        }
    }

    /// Read the definitions. Relative paths resolve against `base`.
    pub fn load(&self, base: &Path) -> Result<Vec<ActionDefinition>> {
        let path = base.join(self.path());
        let loaded = match self {
            CatalogSource::Actions { .. } => std::fs::read_to_string(&path)
                .map_err(FlowgridError::from)
                .and_then(|data| ActionCatalog::from_json(&data))
                .map(|catalog| catalog.actions().to_vec()),
            CatalogSource::Manifest { .. } => openapi::load_manifest(&path),
        };
        loaded.map_err(|e| match e {
            FlowgridError::CatalogUnavailable(reason) => FlowgridError::CatalogUnavailable(reason),
            other => FlowgridError::CatalogUnavailable(format!("{}: {other}", path.display())),
        })
    }
}

// ---------------------------------------------------------------------------
// Storage / client / export sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for scenario files. Scenarios live in memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    format!("http://localhost:{}", default_port())
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_annotation_width")]
    pub annotation_width: u16,
}

fn default_annotation_width() -> u16 {
    DEFAULT_ANNOTATION_WIDTH
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            annotation_width: default_annotation_width(),
        }
    }
}

impl ExportConfig {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            annotation_width: self.annotation_width.max(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogSource,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub export: ExportConfig,
    /// Directory relative paths resolve against; the config file's directory.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            catalog: CatalogSource::default(),
            storage: StorageConfig::default(),
            client: ClientConfig::default(),
            export: ExportConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut cfg: Config = serde_yaml::from_str(&data)?;
        cfg.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(cfg)
    }

    /// Load `path` when given. Without a path, `flowgrid.yaml` in `dir` is
    /// used if present, otherwise the defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let candidate = paths::config_path(dir);
        if candidate.exists() {
            return Self::load(&candidate);
        }
        Ok(Self {
            base_dir: dir.to_path_buf(),
            ..Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    /// Resolve a configured path against the config file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage.dir.as_deref().map(|d| self.resolve(d))
    }

    pub fn load_catalog(&self) -> Result<Vec<ActionDefinition>> {
        self.catalog.load(&self.base_dir)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("unknown config version {}; expected 1", self.version),
            });
        }

        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0; an ephemeral port will be chosen".to_string(),
            });
        }

        if self.catalog.path().as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "catalog.path is empty".to_string(),
            });
        } else if !self.resolve(self.catalog.path()).exists() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "catalog file '{}' does not exist; the catalog will be empty",
                    self.resolve(self.catalog.path()).display()
                ),
            });
        }

        if self.export.annotation_width < 2 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "export.annotation_width={} is narrow; annotations may be hard to read",
                    self.export.annotation_width
                ),
            });
        }

        if !self.client.base_url.starts_with("http://") && !self.client.base_url.starts_with("https://") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "client.base_url '{}' is not an http(s) URL",
                    self.client.base_url
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: Config = serde_yaml::from_str("version: 1\n").unwrap();
        assert_eq!(cfg.server.port, 5001);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.export.annotation_width, 6);
        assert_eq!(cfg.client.base_url, "http://localhost:5001");
        assert!(cfg.storage.dir.is_none());
        assert!(matches!(cfg.catalog, CatalogSource::Actions { .. }));
    }

    #[test]
    fn catalog_source_is_tagged() {
        let cfg: Config =
            serde_yaml::from_str("catalog:\n  type: manifest\n  path: apiList.json\n").unwrap();
        assert_eq!(
            cfg.catalog,
            CatalogSource::Manifest {
                path: PathBuf::from("apiList.json")
            }
        );
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(yaml.contains("type: manifest"));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flowgrid.yaml");
        std::fs::write(&path, "storage:\n  dir: data/scenarios\n").unwrap();

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.storage_dir().unwrap(), dir.path().join("data/scenarios"));
    }

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::discover(None, dir.path()).unwrap();
        assert_eq!(cfg.server.port, 5001);
        assert_eq!(cfg.base_dir, dir.path());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flowgrid.yaml");
        let mut cfg = Config::default();
        cfg.server.port = 8080;
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap().server.port, 8080);
    }

    #[test]
    fn validate_flags_suspicious_values() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::discover(None, dir.path()).unwrap();
        cfg.server.port = 0;
        cfg.export.annotation_width = 1;
        cfg.client.base_url = "localhost:5001".into();

        let warnings = cfg.validate();
        let messages: Vec<&str> = warnings.iter().map(|w| w.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.contains("server.port is 0")));
        assert!(messages.iter().any(|m| m.contains("does not exist")));
        assert!(messages.iter().any(|m| m.contains("annotation_width=1")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("base_url")));
    }

    #[test]
    fn actions_catalog_loads_from_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("actions.json"),
            r#"[{"actionCode": "noop", "type": "SimpleCommand"}]"#,
        )
        .unwrap();
        let cfg = Config::discover(None, dir.path()).unwrap();
        let actions = cfg.load_catalog().unwrap();
        assert_eq!(actions[0].action_code, "noop");
    }

    #[test]
    fn missing_catalog_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::discover(None, dir.path()).unwrap();
        assert!(matches!(
            cfg.load_catalog(),
            Err(FlowgridError::CatalogUnavailable(_))
        ));
    }
}
