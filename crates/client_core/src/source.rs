use std::sync::Arc;

use async_trait::async_trait;
use comic_core::{ComicError, ComicPipeline};
use reqwest::Client;
use shared::{
    domain::{Comic, Theme},
    error::{ApiError, ErrorCode},
    protocol::daily_comic_route,
};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Pipeline(#[from] ComicError),
    #[error("comic server request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Server(ApiError),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}

/// Where the scheduler gets a comic for a theme.
#[async_trait]
pub trait ComicSource: Send + Sync {
    async fn fetch_comic(&self, theme: &Theme) -> Result<Comic, SourceError>;
}

/// Runs the pipeline in-process.
pub struct LocalPipelineSource {
    pipeline: Arc<ComicPipeline>,
}

impl LocalPipelineSource {
    pub fn new(pipeline: Arc<ComicPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl ComicSource for LocalPipelineSource {
    async fn fetch_comic(&self, theme: &Theme) -> Result<Comic, SourceError> {
        Ok(self.pipeline.build_daily_comic(theme).await?)
    }
}

/// Asks a comic server for today's strip. The server picks the theme itself
/// from the same calendar, so `theme` is only used for logging.
pub struct HttpComicSource {
    http: Client,
    comic_url: Url,
}

impl HttpComicSource {
    pub fn new(server_url: &str) -> Result<Self, SourceError> {
        let comic_url = Url::parse(server_url)?.join(daily_comic_route())?;
        Ok(Self {
            http: Client::new(),
            comic_url,
        })
    }
}

#[async_trait]
impl ComicSource for HttpComicSource {
    async fn fetch_comic(&self, theme: &Theme) -> Result<Comic, SourceError> {
        info!(url = %self.comic_url, %theme, "requesting daily comic");
        let response = self.http.get(self.comic_url.clone()).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Comic>().await?);
        }

        let body = response.text().await?;
        match serde_json::from_str::<ApiError>(&body) {
            Ok(api_error) => {
                warn!(%status, code = ?api_error.code, "comic server reported failure");
                Err(SourceError::Server(api_error))
            }
            Err(_) => {
                warn!(%status, body, "comic server returned an unexpected error body");
                Err(SourceError::Server(ApiError::new(
                    ErrorCode::Internal,
                    format!("HTTP {status}"),
                    body,
                )))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
