use super::ConfigError;
use crate::shared::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_VCS_API_BASE: &str = "https://gitlab.com/api/v4";
pub const DEFAULT_VCS_HOST_PREFIX: &str = "https://gitlab.com/";
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-3-sonnet-20240229-v1:0";
pub const DEFAULT_MODEL_VERSION: &str = "bedrock-2023-05-31";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Process-wide configuration. Built once at start-up and handed to each
/// component constructor; secrets never live here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    pub terraform: TerraformSettings,
    #[serde(default)]
    pub vcs: VcsSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub invocation: InvocationSettings,
    #[serde(default)]
    pub secrets: SecretsSettings,
    #[serde(default = "default_timeout_secs")]
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TerraformSettings {
    pub api_url: String,
    pub secret_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VcsSettings {
    #[serde(default = "default_vcs_api_base")]
    pub api_base: String,
    #[serde(default = "default_vcs_host_prefix")]
    pub host_prefix: String,
    #[serde(default)]
    pub secret_name: String,
}

impl Default for VcsSettings {
    fn default() -> Self {
        Self {
            api_base: default_vcs_api_base(),
            host_prefix: default_vcs_host_prefix(),
            secret_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InferenceSettings {
    #[serde(default)]
    pub endpoint_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_model_version")]
    pub version: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub secret_name: Option<String>,
    #[serde(default = "default_escalations")]
    pub escalations: Vec<EscalationRule>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            model_id: default_model_id(),
            version: default_model_version(),
            max_tokens: default_max_tokens(),
            secret_name: None,
            escalations: default_escalations(),
        }
    }
}

/// Error categories that are routed to a human team instead of producing
/// troubleshooting steps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EscalationRule {
    pub topic: String,
    pub team: String,
    pub contact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct InvocationSettings {
    #[serde(default)]
    pub diagnosis_function_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SecretsSettings {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_vcs_api_base() -> String {
    DEFAULT_VCS_API_BASE.to_string()
}

fn default_vcs_host_prefix() -> String {
    DEFAULT_VCS_HOST_PREFIX.to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

pub fn default_escalations() -> Vec<EscalationRule> {
    vec![
        EscalationRule {
            topic: "service control policies or resource based policies".to_string(),
            team: "Security team".to_string(),
            contact: "abc-security@abc.com".to_string(),
        },
        EscalationRule {
            topic: "S3 bucket creation or VPC resource creation".to_string(),
            team: "Platform team".to_string(),
            contact: "abc-platform@abc.com".to_string(),
        },
    ]
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.terraform.api_url) {
            return Err(ConfigError::Settings(
                "`terraform.api_url` must be an http(s) url".to_string(),
            ));
        }
        if self.terraform.secret_name.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`terraform.secret_name` must be non-empty".to_string(),
            ));
        }
        if self.vcs.secret_name.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`vcs.secret_name` must be non-empty".to_string(),
            ));
        }
        if !is_http_url(&self.vcs.api_base) {
            return Err(ConfigError::Settings(
                "`vcs.api_base` must be an http(s) url".to_string(),
            ));
        }
        if !self.inference.endpoint_url.is_empty() && !is_http_url(&self.inference.endpoint_url) {
            return Err(ConfigError::Settings(
                "`inference.endpoint_url` must be an http(s) url".to_string(),
            ));
        }
        if self.inference.max_tokens == 0 {
            return Err(ConfigError::Settings(
                "`inference.max_tokens` must be greater than zero".to_string(),
            ));
        }
        if let Some(url) = &self.invocation.diagnosis_function_url {
            if !is_http_url(url) {
                return Err(ConfigError::Settings(
                    "`invocation.diagnosis_function_url` must be an http(s) url".to_string(),
                ));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Settings(
                "`http_timeout_secs` must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
