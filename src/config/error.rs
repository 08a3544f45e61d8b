#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("missing required env var `{0}`")]
    MissingEnvVar(String),
    #[error("invalid value for env var `{key}`: {reason}")]
    InvalidEnvVar { key: String, reason: String },
    #[error("settings validation failed: {0}")]
    Settings(String),
}
