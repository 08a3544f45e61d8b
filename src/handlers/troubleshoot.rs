use super::diagnosis::{DiagnosisRequest, DEFAULT_BRANCH};
use super::invoke::DiagnosisInvoker;
use super::prompt::build_prompt;
use crate::config::EscalationRule;
use crate::inference::{InferenceClient, InferenceError};
use crate::shared::RemoteFetchError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum TroubleshootError {
    #[error("{0}")]
    MissingData(String),
    #[error("diagnosis invocation failed: {0}")]
    Invocation(#[from] RemoteFetchError),
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("invalid agent event: {0}")]
    InvalidEvent(String),
    #[error("unreadable diagnosis response (status {status}): {reason}")]
    InvalidDiagnosis { status: u16, reason: String },
}

impl TroubleshootError {
    /// Text shown to the user inside the response envelope.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingData(detail) => format!("Missing required information: {detail}"),
            other => format!("Error: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentParameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: String,
}

/// Invocation event sent by the agent framework for one action-group call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEvent {
    #[serde(default, rename = "actionGroup")]
    pub action_group: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub parameters: Vec<AgentParameter>,
    #[serde(default, rename = "messageVersion")]
    pub message_version: Option<String>,
}

impl AgentEvent {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value.as_str())
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(rename = "TEXT")]
    pub text: TextBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResponse {
    #[serde(rename = "responseBody")]
    pub response_body: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(rename = "actionGroup")]
    pub action_group: String,
    pub function: String,
    #[serde(rename = "functionResponse")]
    pub function_response: FunctionResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response: ActionResponse,
    #[serde(rename = "messageVersion")]
    pub message_version: String,
}

impl AgentResponse {
    pub fn text(event: &AgentEvent, body: impl Into<String>) -> Self {
        Self {
            response: ActionResponse {
                action_group: event.action_group.clone(),
                function: event.function.clone(),
                function_response: FunctionResponse {
                    response_body: ResponseBody {
                        text: TextBody { body: body.into() },
                    },
                },
            },
            message_version: event
                .message_version
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE_VERSION.to_string()),
        }
    }

    pub fn body(&self) -> &str {
        &self.response.function_response.response_body.text.body
    }
}

/// Stage-one body as seen from stage two; a failed stage one only carries `error`.
/// `null` counts as absent for every field.
#[derive(Debug, Clone, Default, Deserialize)]
struct StageOneBody {
    #[serde(default)]
    files_content: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Stage two: asks stage one for the error context, then has the language
/// model turn it into troubleshooting steps. Every outcome is wrapped in the
/// agent envelope.
pub struct TroubleshootHandler {
    invoker: Box<dyn DiagnosisInvoker>,
    inference: Box<dyn InferenceClient>,
    escalations: Vec<EscalationRule>,
}

impl TroubleshootHandler {
    pub fn new(
        invoker: Box<dyn DiagnosisInvoker>,
        inference: Box<dyn InferenceClient>,
        escalations: Vec<EscalationRule>,
    ) -> Self {
        Self {
            invoker,
            inference,
            escalations,
        }
    }

    pub fn handle_event(&self, event: &serde_json::Value) -> AgentResponse {
        tracing::info!(event = %event, "received event");
        match serde_json::from_value::<AgentEvent>(event.clone()) {
            Ok(event) => self.handle(&event),
            Err(err) => {
                let err = TroubleshootError::InvalidEvent(err.to_string());
                tracing::error!(error = %err, "troubleshooting failed");
                AgentResponse::text(&AgentEvent::default(), err.user_message())
            }
        }
    }

    pub fn handle(&self, event: &AgentEvent) -> AgentResponse {
        let response = match self.troubleshoot(event) {
            Ok(steps) => AgentResponse::text(event, steps),
            Err(err) => {
                tracing::error!(error = %err, "troubleshooting failed");
                AgentResponse::text(event, err.user_message())
            }
        };
        tracing::info!(
            action_group = %response.response.action_group,
            function = %response.response.function,
            "prepared agent response"
        );
        response
    }

    pub fn troubleshoot(&self, event: &AgentEvent) -> Result<String, TroubleshootError> {
        let workspace_url = event.parameter("workspace_url").ok_or_else(|| {
            TroubleshootError::MissingData("the `workspace_url` parameter was not provided".to_string())
        })?;
        let request = DiagnosisRequest {
            workspace_url: workspace_url.to_string(),
            repo_url: event.parameter("repo_url").map(str::to_string),
            branch_name: Some(
                event
                    .parameter("branch_name")
                    .unwrap_or(DEFAULT_BRANCH)
                    .to_string(),
            ),
        };

        let response = self.invoker.invoke(&request)?;
        let body: StageOneBody = serde_json::from_str(&response.body).map_err(|e| {
            TroubleshootError::InvalidDiagnosis {
                status: response.status_code,
                reason: e.to_string(),
            }
        })?;
        let files_content = body.files_content.unwrap_or_default();
        if body.error_message.is_none() && files_content.is_empty() {
            let mut detail =
                "neither `files_content` nor `error_message` was found in the diagnosis response"
                    .to_string();
            if let Some(upstream) = body.error.filter(|e| !e.is_empty()) {
                detail.push_str(&format!(" (diagnosis failed: {upstream})"));
            }
            return Err(TroubleshootError::MissingData(detail));
        }

        let prompt = build_prompt(
            body.error_message.as_deref(),
            &files_content,
            &self.escalations,
        );
        tracing::debug!(prompt = %prompt, "built troubleshooting prompt");

        let steps = self.inference.complete(&prompt)?;
        tracing::info!(steps = %steps, "generated troubleshooting steps");
        Ok(steps)
    }
}
