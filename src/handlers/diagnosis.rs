use crate::config::Settings;
use crate::repository::RepositoryFetcher;
use crate::secrets::{secret_value, SecretError, SecretStore, TERRAFORM_TOKEN_KEY, VCS_TOKEN_KEY};
use crate::shared::{HttpClient, RemoteFetchError};
use crate::terraform::{MalformedReferenceError, RunDiagnoser, TerraformApiClient, WorkspaceReference};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, thiserror::Error)]
pub enum DiagnosisError {
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Remote(#[from] RemoteFetchError),
    #[error(transparent)]
    Reference(#[from] MalformedReferenceError),
    #[error("invalid diagnosis request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub workspace_url: String,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
}

impl DiagnosisRequest {
    pub fn new(workspace_url: impl Into<String>) -> Self {
        Self {
            workspace_url: workspace_url.into(),
            repo_url: None,
            branch_name: None,
        }
    }

    pub fn branch(&self) -> &str {
        self.branch_name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_BRANCH)
    }

    fn repository(&self) -> Option<&str> {
        self.repo_url
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    #[serde(default)]
    pub files_content: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Function-style response: a status code plus a JSON-encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl DiagnosisResponse {
    pub fn success(result: &DiagnosisResult) -> Self {
        match serde_json::to_string(result) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(err) => Self::failure(&err.to_string()),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            status_code: 500,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Stage one: pulls the failing run's error lines and, when asked, the
/// repository's configuration files.
pub struct DiagnosisHandler {
    settings: Settings,
    secrets: Arc<dyn SecretStore>,
    http: HttpClient,
}

impl DiagnosisHandler {
    pub fn new(settings: Settings, secrets: Arc<dyn SecretStore>) -> Self {
        let http = HttpClient::with_timeout_secs(settings.http_timeout_secs);
        Self {
            settings,
            secrets,
            http,
        }
    }

    pub fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisResult, DiagnosisError> {
        let mut files_content = String::new();
        if let Some(repo_url) = request.repository() {
            let token = secret_value(self.secrets.as_ref(), &self.settings.vcs.secret_name, VCS_TOKEN_KEY)?;
            let fetcher = RepositoryFetcher::new(
                self.http.clone(),
                &self.settings.vcs.api_base,
                &self.settings.vcs.host_prefix,
                token,
            );
            files_content = fetcher.fetch_bundle(repo_url, request.branch())?.render();
            tracing::info!("fetched repository files content successfully");
        }

        let token = secret_value(
            self.secrets.as_ref(),
            &self.settings.terraform.secret_name,
            TERRAFORM_TOKEN_KEY,
        )?;
        let reference = WorkspaceReference::parse(&request.workspace_url)?;
        let api = TerraformApiClient::new(self.http.clone(), &self.settings.terraform.api_url, token);
        let report = RunDiagnoser::new(&api).diagnose(&reference)?;

        Ok(DiagnosisResult {
            files_content,
            error_message: Some(report.summary()),
        })
    }

    pub fn handle(&self, request: &DiagnosisRequest) -> DiagnosisResponse {
        match self.diagnose(request) {
            Ok(result) => DiagnosisResponse::success(&result),
            Err(err) => {
                tracing::error!(error = %err, "diagnosis failed");
                DiagnosisResponse::failure(&err.to_string())
            }
        }
    }

    /// Entry point for a raw JSON event.
    pub fn handle_event(&self, event: &serde_json::Value) -> DiagnosisResponse {
        tracing::info!(event = %event, "received event");
        match serde_json::from_value::<DiagnosisRequest>(event.clone()) {
            Ok(request) => self.handle(&request),
            Err(err) => {
                let err = DiagnosisError::InvalidRequest(err.to_string());
                tracing::error!(error = %err, "diagnosis failed");
                DiagnosisResponse::failure(&err.to_string())
            }
        }
    }
}
