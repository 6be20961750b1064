use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("STORE_READ: {0}")]
    StoreRead(String),
    #[error("STORE_WRITE: {0}")]
    StoreWrite(String),
    #[error("PARSE_FAILURE: {0}")]
    Parse(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for CoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
