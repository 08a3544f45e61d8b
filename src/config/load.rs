use super::settings::{
    default_escalations, InferenceSettings, InvocationSettings, SecretsSettings,
    TerraformSettings, VcsSettings, DEFAULT_MAX_TOKENS, DEFAULT_MODEL_ID, DEFAULT_MODEL_VERSION,
    DEFAULT_VCS_API_BASE, DEFAULT_VCS_HOST_PREFIX,
};
use super::{ConfigError, Settings};
use crate::shared::DEFAULT_TIMEOUT_SECS;
use std::path::PathBuf;

pub const TERRAFORM_API_URL: &str = "TERRAFORM_API_URL";
pub const TERRAFORM_SECRET_NAME: &str = "TERRAFORM_SECRET_NAME";
pub const VCS_SECRET_NAME: &str = "VCS_SECRET_NAME";
pub const VCS_API_BASE: &str = "VCS_API_BASE";
pub const VCS_HOST_PREFIX: &str = "VCS_HOST_PREFIX";
pub const INFERENCE_ENDPOINT_URL: &str = "INFERENCE_ENDPOINT_URL";
pub const INFERENCE_MODEL_ID: &str = "INFERENCE_MODEL_ID";
pub const INFERENCE_VERSION: &str = "INFERENCE_VERSION";
pub const INFERENCE_MAX_TOKENS: &str = "INFERENCE_MAX_TOKENS";
pub const INFERENCE_SECRET_NAME: &str = "INFERENCE_SECRET_NAME";
pub const DIAGNOSIS_FUNCTION_URL: &str = "DIAGNOSIS_FUNCTION_URL";
pub const HTTP_TIMEOUT_SECS: &str = "TFDOCTOR_HTTP_TIMEOUT_SECS";
pub const SECRETS_DIR: &str = "TFDOCTOR_SECRETS_DIR";
pub const CONFIG_PATH: &str = "TFDOCTOR_CONFIG";

fn parse_number<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                reason: e.to_string(),
            }),
    }
}

impl Settings {
    /// Builds settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let terraform = TerraformSettings {
            api_url: require(TERRAFORM_API_URL)?
                .trim()
                .trim_end_matches('/')
                .to_string(),
            secret_name: require(TERRAFORM_SECRET_NAME)?,
        };
        let vcs = VcsSettings {
            api_base: get(VCS_API_BASE)
                .unwrap_or_else(|| DEFAULT_VCS_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            host_prefix: get(VCS_HOST_PREFIX).unwrap_or_else(|| DEFAULT_VCS_HOST_PREFIX.to_string()),
            secret_name: require(VCS_SECRET_NAME)?,
        };
        let inference = InferenceSettings {
            endpoint_url: get(INFERENCE_ENDPOINT_URL).unwrap_or_default(),
            model_id: get(INFERENCE_MODEL_ID).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            version: get(INFERENCE_VERSION).unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string()),
            max_tokens: parse_number(
                INFERENCE_MAX_TOKENS,
                get(INFERENCE_MAX_TOKENS),
                DEFAULT_MAX_TOKENS,
            )?,
            secret_name: get(INFERENCE_SECRET_NAME),
            escalations: default_escalations(),
        };

        Ok(Self {
            terraform,
            vcs,
            inference,
            invocation: InvocationSettings {
                diagnosis_function_url: get(DIAGNOSIS_FUNCTION_URL),
            },
            secrets: SecretsSettings {
                dir: get(SECRETS_DIR).map(PathBuf::from),
            },
            http_timeout_secs: parse_number(
                HTTP_TIMEOUT_SECS,
                get(HTTP_TIMEOUT_SECS),
                DEFAULT_TIMEOUT_SECS,
            )?,
        })
    }
}

/// Loads settings from the YAML file named by `TFDOCTOR_CONFIG` when set,
/// otherwise from individual env vars, and validates the result.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let settings = match std::env::var(CONFIG_PATH).ok().filter(|v| !v.trim().is_empty()) {
        Some(path) => Settings::from_path(&PathBuf::from(path))?,
        None => Settings::from_env()?,
    };
    settings.validate()?;
    Ok(settings)
}
