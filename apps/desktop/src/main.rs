use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use client_core::{
    ComicSource, ComicState, HttpComicSource, LocalPipelineSource, RefreshScheduler,
    SchedulerSnapshot,
};
use comic_core::{ComicPipeline, DaySelector, PanelRenderer, StoryGenerator, ThemeCatalog};
use provider::{GeminiClient, GeminiConfig, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use shared::domain::Theme;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Terminal viewer for the daily doodle comic.
#[derive(Parser, Debug)]
struct Args {
    /// Fetch from a comic server instead of calling the provider directly.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,
    #[arg(long, default_value = "America/New_York")]
    timezone: String,
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,
    /// Exit after the first comic settles.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let timezone: Tz = args
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid timezone '{}': {e}", args.timezone))?;
    let selector = DaySelector::new(Arc::new(ThemeCatalog::cats()), timezone);
    let source = build_source(&args)?;
    let show_theme = args.server_url.is_none();

    let (mut updates, handle) = RefreshScheduler::new(selector, source)
        .with_tick(Duration::from_millis(args.tick_ms.max(1)))
        .spawn();

    let mut last_label = "";
    let mut last_theme = None;
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let theme = Some(snapshot.state.theme().clone());
                if snapshot.state.label() != last_label || theme != last_theme {
                    println!("{}", render_snapshot(&snapshot, show_theme));
                    last_label = snapshot.state.label();
                    last_theme = theme;
                    let settled = matches!(
                        snapshot.state,
                        ComicState::Ready { .. } | ComicState::Failed { .. }
                    );
                    if args.once && settled {
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    drop(updates);
    handle.await.context("scheduler task panicked")?;
    Ok(())
}

fn build_source(args: &Args) -> Result<Arc<dyn ComicSource>> {
    if let Some(server_url) = &args.server_url {
        info!(%server_url, "fetching comics from server");
        return Ok(Arc::new(HttpComicSource::new(server_url)?));
    }

    let Some(api_key) = ["GEMINI_API_KEY", "API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|key| !key.trim().is_empty())
    else {
        bail!("API key not set; export GEMINI_API_KEY (or API_KEY) or pass --server-url");
    };
    let client = Arc::new(GeminiClient::new(GeminiConfig {
        api_key,
        ..GeminiConfig::default()
    })?);
    let pipeline = ComicPipeline::new(
        StoryGenerator::new(client.clone(), args.text_model.as_str()),
        PanelRenderer::new(client, args.image_model.as_str()),
    );
    info!(
        text_model = %args.text_model,
        image_model = %args.image_model,
        "generating comics locally"
    );
    Ok(Arc::new(LocalPipelineSource::new(Arc::new(pipeline))))
}

/// Formats one snapshot for the terminal. The locally derived theme is only
/// shown when it is the one the comic was generated from; a comic server may
/// use its own catalog.
fn render_snapshot(snapshot: &SchedulerSnapshot, show_theme: bool) -> String {
    let header = &snapshot.header;
    let mut lines = vec![format!(
        "{} | {} | next comic in {}",
        header.date, header.time, header.countdown
    )];
    let theme_note = |theme: &Theme| {
        if show_theme {
            format!(" ({theme})")
        } else {
            String::new()
        }
    };
    match &snapshot.state {
        ComicState::Idle { theme } => {
            lines.push(format!("Waiting for today's comic{}", theme_note(theme)));
        }
        ComicState::Fetching { theme } => {
            lines.push(format!("Drawing today's comic{}...", theme_note(theme)));
        }
        ComicState::Ready { theme, comic } => {
            lines.push(format!("== {} =={}", comic.title, theme_note(theme)));
            for (index, panel) in comic.panels.iter().enumerate() {
                lines.push(format!(
                    "  [{}] {} ({} byte image)",
                    index + 1,
                    panel.caption,
                    panel.image_url.len()
                ));
            }
        }
        ComicState::Failed { theme, message } => {
            lines.push(format!("{message}{}", theme_note(theme)));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
