use axum::http::StatusCode;
use flowgrid_core::config::{CatalogSource, Config};
use flowgrid_server::state::AppState;
use http_body_util::BodyExt;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ACTIONS: &str = r#"[
  {
    "actionCode": "get-user",
    "componentName": "Users",
    "actionCodeGroupName": "Lookup",
    "type": "FetchAndVerify",
    "endPoint": "/users/{id}",
    "pathPropertyListMap": {
      "pathParamList": [{"technicalColumnName": "param_id_0", "isMandatory": true}],
      "queryParamList": []
    },
    "responseBodyColumnList": [
      {"technicalColumnName": ":response:name", "attributePath": "name"}
    ]
  },
  {"actionCode": "noop", "componentName": "Misc", "type": "SimpleCommand"}
]"#;

/// Write an actions file into `dir` and build a config pointing at it.
fn project(dir: &TempDir) -> Config {
    std::fs::write(dir.path().join("actions.json"), ACTIONS).unwrap();
    Config {
        base_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

fn app(config: Config) -> axum::Router {
    flowgrid_server::build_router(AppState::new(config).unwrap())
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Health & catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_up() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(project(&dir)), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "UP"}));
}

#[tokio::test]
async fn lists_actions_from_file() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(project(&dir)), "/api/actions").await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["actionCode"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["get-user", "noop"]);
    assert_eq!(body[0]["type"], "FetchAndVerify");
}

#[tokio::test]
async fn get_single_action() {
    let dir = TempDir::new().unwrap();
    let router = app(project(&dir));

    let (status, body) = get(router.clone(), "/api/actions/get-user").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endPoint"], "/users/{id}");

    let (status, body) = get(router, "/api/actions/retired").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("retired"));
}

#[tokio::test]
async fn missing_catalog_is_service_unavailable() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        base_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    let (status, body) = get(app(config), "/api/actions").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("catalog"));
}

#[tokio::test]
async fn catalog_from_openapi_manifest() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("apiList.json"),
        r#"{"components": {"Users": {"apiSchemas": {"get-user": "get-user.json"}}}}"#,
    )
    .unwrap();
    let doc = json!({
        "openapi": "3.0.0",
        "paths": {
            "/users/{id}": {
                "get": {
                    "tags": ["Lookup"],
                    "parameters": [{"name": "id", "in": "path", "required": true}],
                    "responses": {
                        "200": {
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {"name": {"type": "string"}}
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    });
    std::fs::write(dir.path().join("get-user.json"), doc.to_string()).unwrap();

    let config = Config {
        base_dir: dir.path().to_path_buf(),
        catalog: CatalogSource::Manifest {
            path: PathBuf::from("apiList.json"),
        },
        ..Config::default()
    };
    let (status, body) = get(app(config), "/api/actions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["actionCode"], "get-user");
    assert_eq!(body[0]["componentName"], "Users");
    assert_eq!(body[0]["actionCodeGroupName"], "Lookup");
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

fn draft() -> serde_json::Value {
    json!({
        "scenarioName": "User lookup",
        "steps": [{
            "id": "step-1",
            "actionCode": "get-user",
            "stepParamsData": [{"id": 1, "param_id_0": "42"}],
            "stepRequestData": [],
            "stepResponseData": [],
            "beforeDescription": "user exists",
            "afterDescription": ""
        }]
    })
}

#[tokio::test]
async fn save_assigns_id_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let router = app(project(&dir));

    let (status, saved) = post_json(router.clone(), "/api/scenarios", draft()).await;
    assert_eq!(status, StatusCode::OK);
    let id = saved["scenarioId"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert!(saved["updatedAt"].is_string());

    let (status, loaded) = get(router.clone(), &format!("/api/scenarios/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["scenarioName"], "User lookup");
    assert_eq!(loaded["steps"][0]["stepParamsData"][0]["param_id_0"], "42");
    assert_eq!(loaded["steps"][0]["beforeDescription"], "user exists");

    let (status, list) = get(router, "/api/scenarios").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["scenarioId"], id.as_str());
    assert_eq!(list[0]["stepCount"], 1);
}

#[tokio::test]
async fn save_with_existing_id_overwrites() {
    let dir = TempDir::new().unwrap();
    let router = app(project(&dir));

    let (_, saved) = post_json(router.clone(), "/api/scenarios", draft()).await;
    let mut edited = saved.clone();
    edited["scenarioName"] = json!("Renamed");
    let (status, again) = post_json(router.clone(), "/api/scenarios", edited).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["scenarioId"], saved["scenarioId"]);

    let (_, list) = get(router, "/api/scenarios").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["scenarioName"], "Renamed");
}

#[tokio::test]
async fn unknown_scenario_is_404() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get(app(project(&dir)), "/api/scenarios/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

#[tokio::test]
async fn duplicate_step_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut body = draft();
    let step = body["steps"][0].clone();
    body["steps"].as_array_mut().unwrap().push(step);

    let (status, _) = post_json(app(project(&dir)), "/api/scenarios", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_scenario_id_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut body = draft();
    body["scenarioId"] = json!("../escape");

    let (status, _) = post_json(app(project(&dir)), "/api/scenarios", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn directory_storage_persists_across_restarts() {
    let dir = TempDir::new().unwrap();
    let mut config = project(&dir);
    config.storage.dir = Some(PathBuf::from("scenarios"));

    let (_, saved) = post_json(app(config.clone()), "/api/scenarios", draft()).await;
    let id = saved["scenarioId"].as_str().unwrap();
    assert!(dir.path().join("scenarios").join(format!("{id}.json")).exists());

    let (status, loaded) = get(app(config), &format!("/api/scenarios/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["scenarioName"], "User lookup");
}
