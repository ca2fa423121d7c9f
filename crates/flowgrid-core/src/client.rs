//! The editor's view of its backend: catalog fetch, health and scenario
//! persistence, each a one-shot async call.

use crate::catalog::ActionDefinition;
use crate::error::{FlowgridError, Result};
use crate::paths::validate_scenario_id;
use crate::scenario::{Scenario, ScenarioSummary};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn up() -> Self {
        Self {
            status: "UP".to_string(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("up")
    }
}

#[async_trait]
pub trait ScenarioBackend: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<ActionDefinition>>;
    async fn health(&self) -> Result<HealthStatus>;
    async fn load(&self, scenario_id: &str) -> Result<Scenario>;
    /// Persist a snapshot; the response carries the assigned id.
    async fn persist(&self, scenario: &Scenario) -> Result<Scenario>;
    async fn list(&self) -> Result<Vec<ScenarioSummary>>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = match reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build() {
            Ok(http) => http,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "cannot build HTTP client; using defaults without a timeout"
                );
                reqwest::Client::default()
            }
        };
        Self::with_client(base_url, http)
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Decode a JSON response body, or describe why there is none.
    async fn decode<T: DeserializeOwned>(
        response: std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> std::result::Result<T, String> {
        let response = response.map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_message(status, &body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| format!("undecodable response: {e}"))
    }
}

/// Prefer the server's `{"error": ...}` message over the raw body.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}

#[async_trait]
impl ScenarioBackend for HttpBackend {
    async fn fetch_catalog(&self) -> Result<Vec<ActionDefinition>> {
        let response = self.http.get(self.url("/api/actions")).send().await;
        Self::decode(response)
            .await
            .map_err(FlowgridError::CatalogUnavailable)
    }

    async fn health(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.url("/health")).send().await;
        Self::decode(response).await.map_err(FlowgridError::Backend)
    }

    async fn load(&self, scenario_id: &str) -> Result<Scenario> {
        validate_scenario_id(scenario_id).map_err(|e| FlowgridError::LoadFailed {
            scenario_id: scenario_id.to_string(),
            reason: e.to_string(),
        })?;
        let response = self
            .http
            .get(self.url(&format!("/api/scenarios/{scenario_id}")))
            .send()
            .await;
        Self::decode(response)
            .await
            .map_err(|reason| FlowgridError::LoadFailed {
                scenario_id: scenario_id.to_string(),
                reason,
            })
    }

    async fn persist(&self, scenario: &Scenario) -> Result<Scenario> {
        let response = self
            .http
            .post(self.url("/api/scenarios"))
            .json(scenario)
            .send()
            .await;
        Self::decode(response)
            .await
            .map_err(FlowgridError::PersistFailed)
    }

    async fn list(&self) -> Result<Vec<ScenarioSummary>> {
        let response = self.http.get(self.url("/api/scenarios")).send().await;
        Self::decode(response).await.map_err(FlowgridError::Backend)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
