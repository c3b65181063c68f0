use std::{net::SocketAddr, sync::Arc};

use comic_core::{ComicError, ComicPipeline, DaySelector, PanelRenderer, StoryGenerator};
use provider::GeminiClient;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod cache;
mod config;

use api::build_router;
use app_state::AppState;
use config::{load_settings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let state = build_state(&settings).map_err(|error| {
        error!(%error, "refusing to start");
        error
    })?;
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        timezone = %settings.timezone,
        text_model = %settings.text_model,
        image_model = %settings.image_model,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(settings: &Settings) -> Result<AppState, ComicError> {
    let client = Arc::new(
        GeminiClient::new(settings.gemini_config()?)
            .map_err(|e| ComicError::Configuration(e.to_string()))?,
    );
    let pipeline = ComicPipeline::new(
        StoryGenerator::new(client.clone(), settings.text_model.as_str()),
        PanelRenderer::new(client, settings.image_model.as_str()),
    );
    let selector = DaySelector::new(Arc::new(settings.catalog()?), settings.timezone()?);
    Ok(AppState::new(pipeline, selector, settings.cache_daily_comic))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
