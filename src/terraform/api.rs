use crate::shared::{bearer, HttpClient, RemoteFetchError};
use serde::Deserialize;
use std::fmt;

const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// Lifecycle status of a run as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Pending,
    Fetching,
    Queuing,
    PlanQueued,
    Planning,
    Planned,
    PolicyChecking,
    PolicyChecked,
    Confirmed,
    ApplyQueued,
    Applying,
    Applied,
    PlannedAndFinished,
    Discarded,
    Canceled,
    ForceCanceled,
    Errored,
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "pending" => Self::Pending,
            "fetching" => Self::Fetching,
            "queuing" => Self::Queuing,
            "plan_queued" => Self::PlanQueued,
            "planning" => Self::Planning,
            "planned" => Self::Planned,
            "policy_checking" => Self::PolicyChecking,
            "policy_checked" => Self::PolicyChecked,
            "confirmed" => Self::Confirmed,
            "apply_queued" => Self::ApplyQueued,
            "applying" => Self::Applying,
            "applied" => Self::Applied,
            "planned_and_finished" => Self::PlannedAndFinished,
            "discarded" => Self::Discarded,
            "canceled" => Self::Canceled,
            "force_canceled" => Self::ForceCanceled,
            "errored" => Self::Errored,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Queuing => "queuing",
            Self::PlanQueued => "plan_queued",
            Self::Planning => "planning",
            Self::Planned => "planned",
            Self::PolicyChecking => "policy_checking",
            Self::PolicyChecked => "policy_checked",
            Self::Confirmed => "confirmed",
            Self::ApplyQueued => "apply_queued",
            Self::Applying => "applying",
            Self::Applied => "applied",
            Self::PlannedAndFinished => "planned_and_finished",
            Self::Discarded => "discarded",
            Self::Canceled => "canceled",
            Self::ForceCanceled => "force_canceled",
            Self::Errored => "errored",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: String,
    pub status: RunStatus,
    pub plan_id: Option<String>,
    pub apply_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
struct ResourceIdentifier {
    id: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct Relationship {
    #[serde(default)]
    data: Option<ResourceIdentifier>,
}

#[derive(Debug, Clone, Deserialize)]
struct RunAttributes {
    status: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RunRelationships {
    #[serde(default)]
    plan: Option<Relationship>,
    #[serde(default)]
    apply: Option<Relationship>,
}

#[derive(Debug, Clone, Deserialize)]
struct RunResource {
    id: String,
    attributes: RunAttributes,
    #[serde(default)]
    relationships: RunRelationships,
}

impl From<RunResource> for RunRecord {
    fn from(value: RunResource) -> Self {
        let related_id =
            |rel: Option<Relationship>| rel.and_then(|rel| rel.data).map(|data| data.id);
        Self {
            id: value.id,
            status: RunStatus::parse(&value.attributes.status),
            plan_id: related_id(value.relationships.plan),
            apply_id: related_id(value.relationships.apply),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PhaseAttributes {
    #[serde(default, rename = "log-read-url")]
    log_read_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PhaseResource {
    #[serde(default)]
    attributes: PhaseAttributes,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct PhaseDocument {
    #[serde(default)]
    data: PhaseResource,
}

/// Plan or apply sub-resource of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Plan,
    Apply,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Plan => "Plan",
            Self::Apply => "Apply",
        }
    }

    fn collection(self) -> &'static str {
        match self {
            Self::Plan => "plans",
            Self::Apply => "applies",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan => f.write_str("plan"),
            Self::Apply => f.write_str("apply"),
        }
    }
}

#[derive(Clone)]
pub struct TerraformApiClient {
    http: HttpClient,
    api_url: String,
    token: String,
}

impl fmt::Debug for TerraformApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerraformApiClient")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TerraformApiClient {
    pub fn new(http: HttpClient, api_url: &str, token: String) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    fn get_document<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, RemoteFetchError> {
        let url = self.endpoint(path);
        let authorization = bearer(&self.token);
        let response = self.http.get(
            &url,
            &[
                ("Authorization", authorization.as_str()),
                ("Content-Type", JSON_API_CONTENT_TYPE),
            ],
        )?;
        response.json::<T>()
    }

    pub fn run(&self, run_id: &str) -> Result<RunRecord, RemoteFetchError> {
        let path = format!("runs/{}", urlencoding::encode(run_id));
        let document: Document<RunResource> = self.get_document(&path)?;
        Ok(document.data.into())
    }

    pub fn workspace_id(&self, organization: &str, workspace: &str) -> Result<String, RemoteFetchError> {
        let path = format!(
            "organizations/{}/workspaces/{}",
            urlencoding::encode(organization),
            urlencoding::encode(workspace)
        );
        let document: Document<ResourceIdentifier> = self.get_document(&path)?;
        Ok(document.data.id)
    }

    /// Runs in the order the platform returns them, newest first.
    pub fn workspace_runs(&self, workspace_id: &str) -> Result<Vec<RunRecord>, RemoteFetchError> {
        let path = format!("workspaces/{}/runs", urlencoding::encode(workspace_id));
        let document: Document<Vec<RunResource>> = self.get_document(&path)?;
        Ok(document.data.into_iter().map(RunRecord::from).collect())
    }

    /// Returns the phase's `log-read-url`, if the platform issued one.
    pub fn phase_log_url(&self, phase: Phase, id: &str) -> Result<Option<String>, RemoteFetchError> {
        let path = format!("{}/{}", phase.collection(), urlencoding::encode(id));
        let document: PhaseDocument = self.get_document(&path)?;
        Ok(document
            .data
            .attributes
            .log_read_url
            .filter(|url| !url.trim().is_empty()))
    }

    /// Log blobs are served from pre-signed URLs and must not receive the API token.
    pub fn fetch_log(&self, log_read_url: &str) -> Result<String, RemoteFetchError> {
        Ok(self.http.get(log_read_url, &[])?.body)
    }
}
