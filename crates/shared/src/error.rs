use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Configuration,
    MalformedResponse,
    InvalidStoryShape,
    NoImageReturned,
    Provider,
    Internal,
}

/// Error body returned by the HTTP surface on any non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
#[error("{error}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
            message: message.into(),
        }
    }
}
