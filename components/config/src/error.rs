use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("segment-task-timeout-ms: `{0}` is invalid, it must be positive")]
    InvalidTaskTimeout(u64),

    #[error("An IO error raised")]
    Io(#[from] std::io::Error),

    #[error("Malformed YAML configuration")]
    Yaml(#[from] serde_yaml::Error),
}
