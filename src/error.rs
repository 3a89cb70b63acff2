use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipeLensError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Azure DevOps API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Azure DevOps API error (status {status}) after {retries} retries")]
    ApiErrorAfterRetries { status: u16, retries: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Project not found: {project}: {message}")]
    ProjectNotFound { project: String, message: String },

    #[error("Pipeline definition not found: {0}")]
    DefinitionNotFound(u64),

    #[error("Aggregation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipeLensError>;
