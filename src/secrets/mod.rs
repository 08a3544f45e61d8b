use std::collections::BTreeMap;
use std::sync::Arc;

pub mod store;

pub use store::{EnvSecretStore, FileSecretStore, StaticSecretStore};

use crate::config::Settings;

pub const TERRAFORM_TOKEN_KEY: &str = "tfe_api_token";
pub const VCS_TOKEN_KEY: &str = "token";
pub const INFERENCE_KEY: &str = "api_key";

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret `{name}` was not found")]
    NotFound { name: String },
    #[error("failed to read secret `{name}`: {reason}")]
    Read { name: String, reason: String },
    #[error("secret `{name}` is not a json object of string values: {reason}")]
    Parse { name: String, reason: String },
    #[error("secret `{name}` only carries a binary value, which is not supported")]
    BinaryUnsupported { name: String },
    #[error("secret `{name}` has no `{key}` entry")]
    MissingKey { name: String, key: String },
}

/// Source of named secrets. Each lookup hits the backing store again;
/// implementations must not cache values between calls.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, name: &str) -> Result<BTreeMap<String, String>, SecretError>;
}

/// Fetches one key from a named secret.
pub fn secret_value(store: &dyn SecretStore, name: &str, key: &str) -> Result<String, SecretError> {
    let mut values = store.get_secret(name)?;
    values.remove(key).ok_or_else(|| SecretError::MissingKey {
        name: name.to_string(),
        key: key.to_string(),
    })
}

/// Picks the file-backed store when a secrets directory is configured,
/// the environment-backed store otherwise.
pub fn secret_store_from_settings(settings: &Settings) -> Arc<dyn SecretStore> {
    match &settings.secrets.dir {
        Some(dir) => Arc::new(FileSecretStore::new(dir.clone())),
        None => Arc::new(EnvSecretStore),
    }
}

pub(crate) fn parse_secret_string(
    name: &str,
    raw: &str,
) -> Result<BTreeMap<String, String>, SecretError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| SecretError::Parse {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    let serde_json::Value::Object(entries) = value else {
        return Err(SecretError::Parse {
            name: name.to_string(),
            reason: "top-level value must be an object".to_string(),
        });
    };

    let mut values = BTreeMap::new();
    for (key, value) in entries {
        let serde_json::Value::String(text) = value else {
            return Err(SecretError::Parse {
                name: name.to_string(),
                reason: format!("value of `{key}` is not a string"),
            });
        };
        values.insert(key, text);
    }
    Ok(values)
}
