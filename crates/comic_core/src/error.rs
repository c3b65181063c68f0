use provider::ProviderError;
use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComicError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("could not parse valid JSON for the comic strip: {source}")]
    MalformedResponse {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid comic strip structure: {0}")]
    InvalidStoryShape(String),
    #[error("image generation failed, no images returned")]
    NoImageReturned,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("comic pipeline failed: {0}")]
    PipelineFailed(#[source] Box<ComicError>),
}

impl ComicError {
    pub fn pipeline_failed(cause: ComicError) -> Self {
        match cause {
            already @ Self::PipelineFailed(_) => already,
            cause => Self::PipelineFailed(Box::new(cause)),
        }
    }

    /// Innermost error, unwrapping any `PipelineFailed` layers.
    pub fn cause(&self) -> &ComicError {
        match self {
            Self::PipelineFailed(inner) => inner.cause(),
            other => other,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self.cause() {
            Self::Configuration(_) => ErrorCode::Configuration,
            Self::MalformedResponse { .. } => ErrorCode::MalformedResponse,
            Self::InvalidStoryShape(_) => ErrorCode::InvalidStoryShape,
            Self::NoImageReturned => ErrorCode::NoImageReturned,
            Self::Provider(_) => ErrorCode::Provider,
            Self::PipelineFailed(_) => ErrorCode::Internal,
        }
    }
}
