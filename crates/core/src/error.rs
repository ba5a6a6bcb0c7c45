use thiserror::Error;

pub type VinePulseResult<T> = Result<T, VinePulseError>;

#[derive(Error, Debug)]
pub enum VinePulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("Upstream API key invalid or unconfigured: {0}")]
    UpstreamConfig(String),

    #[error("Insight service error: {0}")]
    Insight(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
