use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request to backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: Uuid },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;
