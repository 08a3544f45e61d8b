use super::{parse_secret_string, SecretError, SecretStore};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub const SECRET_ENV_PREFIX: &str = "TFDOCTOR_SECRET";

/// Reads secrets from env vars named `TFDOCTOR_SECRET_<NAME>`, where the
/// name is upper-cased and non-alphanumerics become `_`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

pub fn secret_env_key(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{SECRET_ENV_PREFIX}_{mapped}")
}

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, name: &str) -> Result<BTreeMap<String, String>, SecretError> {
        let key = secret_env_key(name);
        match std::env::var(&key) {
            Ok(raw) if !raw.trim().is_empty() => parse_secret_string(name, &raw),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::NotFound {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::BinaryUnsupported {
                name: name.to_string(),
            }),
        }
    }
}

/// Reads `<dir>/<name>.json`. A file that is not valid UTF-8 is treated as a
/// binary secret.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, SecretError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(SecretError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl SecretStore for FileSecretStore {
    fn get_secret(&self, name: &str) -> Result<BTreeMap<String, String>, SecretError> {
        let path = self.path_for(name)?;
        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SecretError::NotFound {
                name: name.to_string(),
            },
            _ => SecretError::Read {
                name: name.to_string(),
                reason: e.to_string(),
            },
        })?;
        let raw = String::from_utf8(bytes).map_err(|_| SecretError::BinaryUnsupported {
            name: name.to_string(),
        })?;
        parse_secret_string(name, &raw)
    }
}

/// Fixed in-memory secrets, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: BTreeMap<String, BTreeMap<String, String>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: &str, key: &str, value: &str) -> Self {
        self.secrets
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl SecretStore for StaticSecretStore {
    fn get_secret(&self, name: &str) -> Result<BTreeMap<String, String>, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                name: name.to_string(),
            })
    }
}
