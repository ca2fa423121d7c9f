//! Building action definitions from per-action OpenAPI documents.
//!
//! A manifest lists, per component, the schema document of every action:
//!
//! ```json
//! {"components": {"User Service": {"apiSchemas": {"create-user": "schemas/create-user.json"}}}}
//! ```
//!
//! Each document must define exactly one path. Request and response bodies
//! are flattened into colon-joined attribute paths such as
//! `:request:address:city`.

use crate::catalog::{ActionDefinition, BodyColumnInfo, ParameterInfo, PathPropertyListMap};
use crate::error::{FlowgridError, Result};
use crate::types::ActionKind;
use serde_json::Value;
use std::path::Path;

pub const DEFAULT_GROUP: &str = "DefaultGroup";
pub const REQUEST_PREFIX: &str = ":request";
pub const RESPONSE_PREFIX: &str = ":response";

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const JSON_MEDIA_TYPE: &str = "application/json";
const MAX_DEPTH: usize = 16;

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    pub action_code: String,
    pub schema_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestComponent {
    pub name: String,
    pub schemas: Vec<SchemaEntry>,
}

/// The manifest, with component and action order as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiListManifest {
    pub components: Vec<ManifestComponent>,
}

impl ApiListManifest {
    pub fn parse(data: &str) -> Result<Self> {
        let root = parse_document(data)?;
        let components = root
            .get("components")
            .and_then(Value::as_object)
            .ok_or_else(|| FlowgridError::InvalidSchema("manifest has no components".into()))?;

        let components = components
            .iter()
            .map(|(name, detail)| {
                let schemas = detail
                    .get("apiSchemas")
                    .and_then(Value::as_object)
                    .map(|schemas| {
                        schemas
                            .iter()
                            .filter_map(|(code, path)| {
                                path.as_str().map(|p| SchemaEntry {
                                    action_code: code.clone(),
                                    schema_path: p.to_string(),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                ManifestComponent {
                    name: name.clone(),
                    schemas,
                }
            })
            .collect();
        Ok(Self { components })
    }
}

/// Parse a JSON or YAML document.
pub fn parse_document(data: &str) -> Result<Value> {
    match serde_json::from_str(data) {
        Ok(value) => Ok(value),
        Err(_) => Ok(serde_yaml::from_str(data)?),
    }
}

// ---------------------------------------------------------------------------
// Catalog building
// ---------------------------------------------------------------------------

/// Build one definition per manifest entry. Entries whose document cannot be
/// loaded or does not fit the expected shape are skipped with a warning.
pub fn build_catalog<F>(manifest: &ApiListManifest, mut load: F) -> Vec<ActionDefinition>
where
    F: FnMut(&str) -> Result<Value>,
{
    let mut actions = Vec::new();
    for component in &manifest.components {
        for entry in &component.schemas {
            let built = load(&entry.schema_path)
                .and_then(|doc| action_from_document(&component.name, &entry.action_code, &doc));
            match built {
                Ok(action) => actions.push(action),
                Err(e) => tracing::warn!(
                    component = %component.name,
                    action_code = %entry.action_code,
                    schema = %entry.schema_path,
                    error = %e,
                    "schema document skipped"
                ),
            }
        }
    }
    actions
}

/// Read a manifest file and the schema documents it names. Schema paths are
/// relative to the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Vec<ActionDefinition>> {
    let data = std::fs::read_to_string(path)?;
    let manifest = ApiListManifest::parse(&data)?;
    let base = path.parent().unwrap_or(Path::new("."));
    let actions = build_catalog(&manifest, |schema_path| {
        let text = std::fs::read_to_string(base.join(schema_path))?;
        parse_document(&text)
    });
    tracing::info!(
        manifest = %path.display(),
        actions = actions.len(),
        "built action catalog from manifest"
    );
    Ok(actions)
}

/// Derive one action definition from its OpenAPI document.
pub fn action_from_document(component: &str, action_code: &str, doc: &Value) -> Result<ActionDefinition> {
    let paths = doc
        .get("paths")
        .and_then(Value::as_object)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| FlowgridError::InvalidSchema("document defines no paths".into()))?;
    if paths.len() != 1 {
        return Err(FlowgridError::InvalidSchema(format!(
            "expected exactly one path, found {}",
            paths.len()
        )));
    }
    let Some((endpoint, item)) = paths.iter().next() else {
        return Err(FlowgridError::InvalidSchema("document defines no paths".into()));
    };

    let (method, operation) = ["post", "get"]
        .iter()
        .find_map(|m| item.get(*m).map(|op| (*m, op)))
        .ok_or_else(|| {
            FlowgridError::InvalidSchema(format!("no POST or GET operation on '{endpoint}'"))
        })?;

    let group = operation
        .get("tags")
        .and_then(Value::as_array)
        .and_then(|tags| tags.first())
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_GROUP);

    let mut action = ActionDefinition::new(
        action_code,
        component,
        group,
        ActionKind::from_http_method(method),
    );
    action.endpoint = Some(endpoint.clone());
    action.path_property_list_map = Some(parameters(operation));

    if let Some(body) = operation.get("requestBody") {
        let schema = json_schema(body);
        action.request_body_column_list =
            Some(Flattener::new(doc, REQUEST_PREFIX).body(schema));
    }
    if let Some(responses) = operation.get("responses") {
        let response = ["200", "201", "default"]
            .iter()
            .find_map(|code| responses.get(*code));
        let schema = response.and_then(json_schema);
        if schema.is_none() {
            tracing::debug!(action_code, "no 200, 201 or default JSON response schema");
        }
        action.response_body_column_list =
            Some(Flattener::new(doc, RESPONSE_PREFIX).body(schema));
    }
    Ok(action)
}

fn parameters(operation: &Value) -> PathPropertyListMap {
    let mut map = PathPropertyListMap::default();
    let Some(params) = operation.get("parameters").and_then(Value::as_array) else {
        return map;
    };
    for param in params {
        let Some(name) = param.get("name").and_then(Value::as_str) else {
            continue;
        };
        let info = ParameterInfo {
            technical_column_name: name.to_string(),
            derived_data_type: param
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            is_mandatory: param.get("required").and_then(Value::as_bool).unwrap_or(false),
        };
        match param.get("in").and_then(Value::as_str) {
            Some(loc) if loc.eq_ignore_ascii_case("path") => map.path_params.push(info),
            Some(loc) if loc.eq_ignore_ascii_case("query") => map.query_params.push(info),
            _ => {}
        }
    }
    map
}

fn json_schema(holder: &Value) -> Option<&Value> {
    holder.get("content")?.get(JSON_MEDIA_TYPE)?.get("schema")
}

fn is_array(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("array") || schema.get("items").is_some()
}

fn required_of(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// `:request` for top-level fields, `:request:address` for fields nested
/// under `address`.
pub fn derived_data_type(path: &str, prefix: &str) -> String {
    if path.matches(':').count() <= 1 {
        return prefix.to_string();
    }
    match path.rfind(':') {
        Some(pos) => format!("{prefix}{}", &path[..pos]),
        None => prefix.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Flattener
// ---------------------------------------------------------------------------

struct Flattener<'a> {
    doc: &'a Value,
    prefix: &'static str,
    columns: Vec<BodyColumnInfo>,
}

impl<'a> Flattener<'a> {
    fn new(doc: &'a Value, prefix: &'static str) -> Self {
        Self {
            doc,
            prefix,
            columns: Vec::new(),
        }
    }

    fn resolve(&self, reference: &str) -> Option<&'a Value> {
        let Some(name) = reference.strip_prefix(SCHEMA_REF_PREFIX) else {
            tracing::warn!(reference, "unsupported schema reference");
            return None;
        };
        let resolved = self
            .doc
            .get("components")
            .and_then(|c| c.get("schemas"))
            .and_then(|s| s.get(name));
        if resolved.is_none() {
            tracing::warn!(reference, "schema reference not found");
        }
        resolved
    }

    fn deref(&self, schema: &'a Value) -> Option<&'a Value> {
        match schema.get("$ref").and_then(Value::as_str) {
            Some(reference) => self.resolve(reference),
            None => Some(schema),
        }
    }

    fn body(mut self, schema: Option<&'a Value>) -> Vec<BodyColumnInfo> {
        let Some(schema) = schema.and_then(|s| self.deref(s)) else {
            return self.columns;
        };
        let Some(root) = self.data_schema(schema) else {
            tracing::warn!(prefix = self.prefix, "could not determine the body's data schema");
            return self.columns;
        };
        let required = required_of(root);
        self.flatten(root, "", &required, 0);
        self.columns
    }

    /// Unwrap a top-level array, or an object whose single property holds
    /// the payload.
    fn data_schema(&self, schema: &'a Value) -> Option<&'a Value> {
        if is_array(schema) {
            return schema.get("items").and_then(|i| self.deref(i));
        }
        let single = schema
            .get("properties")
            .and_then(Value::as_object)
            .filter(|p| p.len() == 1)
            .and_then(|p| p.values().next());
        match single {
            Some(inner) if is_array(inner) => inner.get("items").and_then(|i| self.deref(i)),
            Some(inner) => self.deref(inner),
            None => Some(schema),
        }
    }

    fn flatten(&mut self, schema: &'a Value, path: &str, required: &[String], depth: usize) {
        if depth > MAX_DEPTH {
            tracing::warn!(path, "schema nesting too deep; remaining fields skipped");
            return;
        }
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            if let Some(resolved) = self.resolve(reference) {
                self.flatten(resolved, path, &required_of(resolved), depth + 1);
            }
            return;
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                let field_path = format!("{path}:{name}");
                let Some(property) = self.deref(property) else {
                    continue;
                };
                if is_array(property) {
                    if let Some(items) = property.get("items") {
                        self.flatten(items, &field_path, &required_of(items), depth + 1);
                    }
                } else if property.get("properties").is_some() {
                    self.flatten(property, &field_path, &required_of(property), depth + 1);
                } else {
                    self.leaf(name, &field_path, required.contains(name));
                }
            }
        } else if is_array(schema) {
            if let Some(items) = schema.get("items") {
                self.flatten(items, path, &required_of(items), depth + 1);
            }
        }
    }

    fn leaf(&mut self, name: &str, path: &str, mandatory: bool) {
        let derived = derived_data_type(path, self.prefix);
        let attribute_path = format!("{derived}:{name}");
        self.columns.push(BodyColumnInfo {
            technical_column_name: name.to_string(),
            derived_data_type: Some(derived),
            is_mandatory: mandatory,
            attribute_path: Some(attribute_path.clone()),
            attribute_grid_path: Some(attribute_path),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
