//! Generative-content capabilities used by the comic pipeline.
//!
//! The pipeline only sees the two traits below; [`gemini::GeminiClient`] is
//! the production implementation and tests substitute their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod gemini;

pub use gemini::{GeminiClient, GeminiConfig};

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Http(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider API error: {0}")]
    Api(String),
    #[error("failed to decode provider response: {0}")]
    Decode(String),
    #[error("provider response contained no text")]
    EmptyResponse,
    #[error("invalid provider configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    /// Advisory output contract; callers still validate what comes back.
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub number_of_images: u32,
    pub output_mime_type: String,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Base64 payload exactly as the provider returned it.
    pub bytes_b64: String,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, request: TextRequest) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate_images(
        &self,
        request: ImageRequest,
    ) -> Result<Vec<GeneratedImage>, ProviderError>;
}
