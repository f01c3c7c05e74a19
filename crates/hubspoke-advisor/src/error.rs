use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("build LLM: {0}")]
    Build(String),

    #[error("chat: {0}")]
    Chat(String),

    #[error("LLM returned no text")]
    EmptyResponse,

    #[error("settings I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
