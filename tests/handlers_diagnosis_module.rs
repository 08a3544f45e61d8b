mod support;

use serde_json::json;
use std::sync::Arc;
use support::{paths, MockResponse, MockServer};
use tfdoctor::config::{
    InferenceSettings, InvocationSettings, SecretsSettings, Settings, TerraformSettings,
    VcsSettings,
};
use tfdoctor::handlers::{DiagnosisHandler, DiagnosisRequest, DiagnosisResult};
use tfdoctor::secrets::StaticSecretStore;

fn settings(server: &MockServer) -> Settings {
    Settings {
        terraform: TerraformSettings {
            api_url: format!("{}/api/v2", server.base_url),
            secret_name: "tfe".to_string(),
        },
        vcs: VcsSettings {
            api_base: format!("{}/api/v4", server.base_url),
            host_prefix: "https://gitlab.com/".to_string(),
            secret_name: "vcs".to_string(),
        },
        inference: InferenceSettings::default(),
        invocation: InvocationSettings::default(),
        secrets: SecretsSettings::default(),
        http_timeout_secs: 5,
    }
}

fn secrets() -> Arc<StaticSecretStore> {
    Arc::new(
        StaticSecretStore::new()
            .with_secret("tfe", "tfe_api_token", "tfe-token")
            .with_secret("vcs", "token", "vcs-token"),
    )
}

fn platform_responder(base: &str, path: &str) -> MockResponse {
    match path {
        "/api/v2/organizations/acme/workspaces/network" => {
            MockResponse::json(json!({"data": {"id": "ws-1"}}).to_string())
        }
        "/api/v2/workspaces/ws-1/runs" => MockResponse::json(
            json!({"data": [{
                "id": "run-1",
                "attributes": {"status": "errored"},
                "relationships": {"plan": {"data": {"id": "plan-1"}}}
            }]})
            .to_string(),
        ),
        "/api/v2/plans/plan-1" => MockResponse::json(
            json!({"data": {"attributes": {"log-read-url": format!("{base}/logs/plan-1")}}})
                .to_string(),
        ),
        "/logs/plan-1" => MockResponse::text("Initializing...\nError: Invalid provider configuration\nmore"),
        "/api/v4/projects/group%2Finfra/repository/tree?ref=dev&recursive=true&per_page=100&page=1" => {
            MockResponse::json(json!([{"type": "blob", "path": "main.tf"}]).to_string())
        }
        "/api/v4/projects/group%2Finfra/repository/files/main.tf/raw?ref=dev" => {
            MockResponse::text("provider \"aws\" {}")
        }
        _ => MockResponse::status(404),
    }
}

#[test]
fn workspace_only_request_returns_error_summary_and_empty_files() {
    let server = MockServer::start(platform_responder);
    let handler = DiagnosisHandler::new(settings(&server), secrets());

    let response = handler.handle(&DiagnosisRequest::new(
        "https://app.terraform.io/app/acme/workspaces/network",
    ));
    assert_eq!(response.status_code, 200);
    let body: DiagnosisResult = serde_json::from_str(&response.body).expect("body json");
    assert_eq!(body.files_content, "");
    let message = body.error_message.expect("error message");
    assert!(message.starts_with("Plan Error:\nError: Invalid provider configuration"));

    let requests = server.finish();
    assert!(!paths(&requests).iter().any(|p| p.starts_with("/api/v4")));
}

#[test]
fn repository_request_bundles_files_on_requested_branch() {
    let server = MockServer::start(platform_responder);
    let handler = DiagnosisHandler::new(settings(&server), secrets());

    let result = handler
        .diagnose(&DiagnosisRequest {
            workspace_url: "https://app.terraform.io/app/acme/workspaces/network".to_string(),
            repo_url: Some("https://gitlab.com/group/infra".to_string()),
            branch_name: Some("dev".to_string()),
        })
        .expect("diagnose");
    assert_eq!(result.files_content, "File: main.tf\nprovider \"aws\" {}\n\n");
    assert!(result
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("Plan Error:")));

    let requests = server.finish();
    for request in requests.iter().filter(|r| r.path.starts_with("/api/v4")) {
        assert_eq!(request.auth_header, "Bearer vcs-token");
    }
}

#[test]
fn malformed_workspace_url_is_a_500_with_error_body() {
    let server = MockServer::start(platform_responder);
    let handler = DiagnosisHandler::new(settings(&server), secrets());

    let response = handler.handle(&DiagnosisRequest::new("not-a-workspace-url"));
    assert_eq!(response.status_code, 500);
    let body: serde_json::Value = serde_json::from_str(&response.body).expect("body json");
    assert!(body["error"]
        .as_str()
        .is_some_and(|e| e.contains("malformed workspace reference")));
    assert!(body.get("error_message").is_none());
}

#[test]
fn missing_secret_aborts_with_500() {
    let server = MockServer::start(platform_responder);
    let handler = DiagnosisHandler::new(settings(&server), Arc::new(StaticSecretStore::new()));

    let response = handler.handle(&DiagnosisRequest::new(
        "https://app.terraform.io/app/acme/workspaces/network",
    ));
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("secret `tfe` was not found"));
    assert!(server.finish().is_empty());
}

#[test]
fn event_without_workspace_url_is_rejected() {
    let server = MockServer::start(platform_responder);
    let handler = DiagnosisHandler::new(settings(&server), secrets());

    let response = handler.handle_event(&json!({"repo_url": null, "branch_name": "main"}));
    assert_eq!(response.status_code, 500);
    assert!(response.body.contains("invalid diagnosis request"));
}

#[test]
fn blank_branch_defaults_to_main() {
    let request: DiagnosisRequest = serde_json::from_value(json!({
        "workspace_url": "https://app.terraform.io/app/acme/workspaces/network",
        "branch_name": ""
    }))
    .expect("request");
    assert_eq!(request.branch(), "main");
}
