use crate::config::InferenceSettings;
use crate::secrets::{secret_value, SecretError, SecretStore, INFERENCE_KEY};
use crate::shared::{bearer, HttpClient, RemoteFetchError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference endpoint is not configured")]
    NotConfigured,
    #[error("inference response carried no text content")]
    EmptyResponse,
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Remote(#[from] RemoteFetchError),
}

/// Turns a prompt into generated text.
pub trait InferenceClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, InferenceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model: String,
    pub version: String,
    pub max_tokens: u32,
    pub messages: Vec<InferenceMessage>,
}

impl InferenceRequest {
    pub fn user_prompt(settings: &InferenceSettings, prompt: &str) -> Self {
        Self {
            model: settings.model_id.clone(),
            version: settings.version.clone(),
            max_tokens: settings.max_tokens,
            messages: vec![InferenceMessage {
                role: "user".to_string(),
                content: vec![ContentBlock {
                    kind: "text".to_string(),
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct InferenceResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

/// Posts the request document to an HTTP inference endpoint. When a secret
/// name is configured its `api_key` is fetched on every call and sent as a
/// bearer token.
pub struct HttpInferenceClient {
    http: HttpClient,
    settings: InferenceSettings,
    secrets: Arc<dyn SecretStore>,
}

impl HttpInferenceClient {
    pub fn new(http: HttpClient, settings: InferenceSettings, secrets: Arc<dyn SecretStore>) -> Self {
        Self {
            http,
            settings,
            secrets,
        }
    }
}

impl InferenceClient for HttpInferenceClient {
    fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        if self.settings.endpoint_url.trim().is_empty() {
            return Err(InferenceError::NotConfigured);
        }

        let api_key = match &self.settings.secret_name {
            Some(name) => Some(secret_value(self.secrets.as_ref(), name, INFERENCE_KEY)?),
            None => None,
        };
        let authorization = api_key.as_deref().map(bearer);
        let mut headers = vec![("Accept", "application/json")];
        if let Some(authorization) = authorization.as_deref() {
            headers.push(("Authorization", authorization));
        }

        let request = InferenceRequest::user_prompt(&self.settings, prompt);
        let body = serde_json::to_value(&request).map_err(|e| RemoteFetchError::Decode {
            url: self.settings.endpoint_url.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!(model = %self.settings.model_id, "invoking inference endpoint");
        let response: InferenceResponse = self
            .http
            .post_json(&self.settings.endpoint_url, &headers, &body)?
            .json()?;

        response
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(InferenceError::EmptyResponse)
    }
}
