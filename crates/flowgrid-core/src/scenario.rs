use crate::error::{FlowgridError, Result};
use crate::rows::{check_rows, RowRecord};
use crate::types::{DescriptionSlot, GridKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// ScenarioStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    pub id: String,
    pub action_code: String,
    #[serde(default, rename = "stepParamsData", deserialize_with = "null_as_default")]
    pub params: Vec<RowRecord>,
    #[serde(default, rename = "stepRequestData", deserialize_with = "null_as_default")]
    pub request: Vec<RowRecord>,
    #[serde(default, rename = "stepResponseData", deserialize_with = "null_as_default")]
    pub response: Vec<RowRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub before_description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub after_description: String,
}

impl ScenarioStep {
    pub fn new(id: impl Into<String>, action_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action_code: action_code.into(),
            params: Vec::new(),
            request: Vec::new(),
            response: Vec::new(),
            before_description: String::new(),
            after_description: String::new(),
        }
    }

    pub fn grid(&self, kind: GridKind) -> &[RowRecord] {
        match kind {
            GridKind::Params => &self.params,
            GridKind::Request => &self.request,
            GridKind::Response => &self.response,
        }
    }

    pub fn grid_mut(&mut self, kind: GridKind) -> &mut Vec<RowRecord> {
        match kind {
            GridKind::Params => &mut self.params,
            GridKind::Request => &mut self.request,
            GridKind::Response => &mut self.response,
        }
    }

    pub fn description(&self, slot: DescriptionSlot) -> &str {
        match slot {
            DescriptionSlot::Before => &self.before_description,
            DescriptionSlot::After => &self.after_description,
        }
    }

    pub fn description_mut(&mut self, slot: DescriptionSlot) -> &mut String {
        match slot {
            DescriptionSlot::Before => &mut self.before_description,
            DescriptionSlot::After => &mut self.after_description,
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// Wire shape: `{scenarioId?, scenarioName, steps: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default, rename = "scenarioId", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "scenarioName", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, alias = "flowSteps", deserialize_with = "null_as_default")]
    pub steps: Vec<ScenarioStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&ScenarioStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut ScenarioStep> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }

    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Check identity invariants: unique step ids and valid grids.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.id.is_empty() {
                return Err(FlowgridError::InvalidStepOrder(
                    "step with an empty id".to_string(),
                ));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(FlowgridError::InvalidStepOrder(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
            for kind in GridKind::all() {
                check_rows(step.grid(*kind))?;
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> ScenarioSummary {
        ScenarioSummary {
            id: self.id.clone().unwrap_or_default(),
            name: self.name.clone(),
            step_count: self.steps.len(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    #[serde(rename = "scenarioId")]
    pub id: String,
    #[serde(rename = "scenarioName")]
    pub name: String,
    pub step_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::RowId;

    #[test]
    fn missing_and_null_grids_default_to_empty() {
        let json = r#"{
            "scenarioId": "s-1",
            "scenarioName": "Checkout",
            "steps": [
                {"id": "step-1", "actionCode": "create-user", "stepParamsData": null},
                {"id": "step-2", "actionCode": "get-user",
                 "stepRequestData": [{"id": 1, ":request:name": "Ada"}]}
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.id.as_deref(), Some("s-1"));
        assert!(scenario.steps[0].params.is_empty());
        assert!(scenario.steps[0].response.is_empty());
        assert_eq!(scenario.steps[1].request[0].id, RowId::Number(1));
        assert_eq!(scenario.steps[1].before_description, "");
        scenario.validate().unwrap();
    }

    #[test]
    fn legacy_flow_steps_key_is_accepted() {
        let json = r#"{"scenarioName": "Old", "flowSteps": [{"id": "a", "actionCode": "x"}]}"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.steps.len(), 1);
        assert!(scenario.id.is_none());
    }

    #[test]
    fn unsaved_scenario_omits_id_on_the_wire() {
        let json = serde_json::to_value(Scenario::new("Draft")).unwrap();
        assert!(json.get("scenarioId").is_none());
        assert_eq!(json["scenarioName"], "Draft");
        assert!(json["steps"].as_array().unwrap().is_empty());
    }

    #[test]
    fn validate_rejects_duplicate_step_ids() {
        let mut scenario = Scenario::new("Dup");
        scenario.steps.push(ScenarioStep::new("a", "x"));
        scenario.steps.push(ScenarioStep::new("a", "y"));
        assert!(matches!(
            scenario.validate(),
            Err(FlowgridError::InvalidStepOrder(_))
        ));
    }
}
