use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZbxError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error {code}: {message}")]
    Api {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ZbxError {
    /// True for failures where the request never reached the server
    /// (refused, unreachable, timed out before a status came back).
    pub fn is_delivery_failure(&self) -> bool {
        matches!(self, ZbxError::Connection(_) | ZbxError::Timeout(_) | ZbxError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, ZbxError>;
