use config::error::ConfigurationError;
use meta::MetaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Checker context is missing dependency `{0}`")]
    MissingDependency(&'static str),

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to prepare target: {0}")]
    Meta(#[from] MetaError),

    #[error("Invalid cluster snapshot: {0}")]
    Snapshot(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
