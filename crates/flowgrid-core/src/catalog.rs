//! Action definitions as the backend manifest describes them, and the
//! catalog the editor looks actions up in by code.

use crate::error::{FlowgridError, Result};
use crate::types::ActionKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// A path or query parameter of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    pub technical_column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_data_type: Option<String>,
    #[serde(default, rename = "isMandatory")]
    pub is_mandatory: bool,
}

/// A flattened request or response body field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyColumnInfo {
    pub technical_column_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_data_type: Option<String>,
    #[serde(default, rename = "isMandatory")]
    pub is_mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_grid_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPropertyListMap {
    #[serde(default, rename = "pathParamList", alias = "PathParamList")]
    pub path_params: Vec<ParameterInfo>,
    #[serde(default, rename = "queryParamList", alias = "QueryParamList")]
    pub query_params: Vec<ParameterInfo>,
}

// ---------------------------------------------------------------------------
// ActionDefinition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub action_code: String,
    #[serde(default)]
    pub component_name: String,
    #[serde(default, rename = "actionCodeGroupName")]
    pub group_name: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(
        default,
        rename = "endPoint",
        alias = "endpoint",
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_property_list_map: Option<PathPropertyListMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body_column_list: Option<Vec<BodyColumnInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body_column_list: Option<Vec<BodyColumnInfo>>,
}

impl ActionDefinition {
    pub fn new(
        action_code: impl Into<String>,
        component_name: impl Into<String>,
        group_name: impl Into<String>,
        kind: ActionKind,
    ) -> Self {
        Self {
            action_code: action_code.into(),
            component_name: component_name.into(),
            group_name: group_name.into(),
            kind,
            endpoint: None,
            path_property_list_map: None,
            request_body_column_list: None,
            response_body_column_list: None,
        }
    }

    pub fn path_params(&self) -> &[ParameterInfo] {
        self.path_property_list_map
            .as_ref()
            .map(|m| m.path_params.as_slice())
            .unwrap_or(&[])
    }

    pub fn query_params(&self) -> &[ParameterInfo] {
        self.path_property_list_map
            .as_ref()
            .map(|m| m.query_params.as_slice())
            .unwrap_or(&[])
    }

    pub fn request_columns(&self) -> &[BodyColumnInfo] {
        self.request_body_column_list.as_deref().unwrap_or(&[])
    }

    pub fn response_columns(&self) -> &[BodyColumnInfo] {
        self.response_body_column_list.as_deref().unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// ActionCatalog
// ---------------------------------------------------------------------------

/// The set of actions known to the editor.
///
/// An empty catalog means "no actions known". Callers that need to tell a
/// failed fetch from a pending one track that themselves.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<ActionDefinition>,
    index: HashMap<String, usize>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<ActionDefinition>) -> Self {
        let mut catalog = Self::default();
        catalog.replace(actions);
        catalog
    }

    /// Parse a catalog payload (a JSON array of action definitions).
    pub fn from_json(data: &str) -> Result<Self> {
        let actions: Vec<ActionDefinition> = serde_json::from_str(data)
            .map_err(|e| FlowgridError::CatalogUnavailable(format!("malformed catalog: {e}")))?;
        Ok(Self::new(actions))
    }

    /// Replace every entry. Duplicate action codes keep the first occurrence.
    pub fn replace(&mut self, actions: Vec<ActionDefinition>) {
        self.actions.clear();
        self.index.clear();
        for action in actions {
            if self.index.contains_key(&action.action_code) {
                tracing::warn!(
                    action_code = %action.action_code,
                    "duplicate action code in catalog; keeping the first definition"
                );
                continue;
            }
            self.index
                .insert(action.action_code.clone(), self.actions.len());
            self.actions.push(action);
        }
    }

    /// Apply the outcome of a catalog fetch. A failed fetch empties the
    /// catalog instead of leaving stale entries behind.
    pub fn refresh(&mut self, fetched: Result<Vec<ActionDefinition>>) -> Result<usize> {
        match fetched {
            Ok(actions) => {
                self.replace(actions);
                Ok(self.actions.len())
            }
            Err(e) => {
                self.clear();
                let reason = match e {
                    FlowgridError::CatalogUnavailable(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!(%reason, "action catalog fetch failed; catalog cleared");
                Err(FlowgridError::CatalogUnavailable(reason))
            }
        }
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.index.clear();
    }

    pub fn lookup(&self, action_code: &str) -> Option<&ActionDefinition> {
        self.index.get(action_code).map(|&i| &self.actions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.actions.iter()
    }

    pub fn actions(&self) -> &[ActionDefinition] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
