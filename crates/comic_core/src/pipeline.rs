use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use shared::domain::{Comic, Panel, Story, Theme};
use tracing::{info, warn};

use crate::{
    error::ComicError,
    render::{ImageHandle, PanelRenderer},
    story::StoryGenerator,
};

/// Composition root of one pipeline run: story first, then every panel
/// rendered concurrently, then the strip assembled in story order.
///
/// A run either yields a complete comic or fails with
/// [`ComicError::PipelineFailed`]; there is no partially rendered strip.
pub struct ComicPipeline {
    story: StoryGenerator,
    renderer: PanelRenderer,
}

impl ComicPipeline {
    pub fn new(story: StoryGenerator, renderer: PanelRenderer) -> Self {
        Self { story, renderer }
    }

    pub async fn build_daily_comic(&self, theme: &Theme) -> Result<Comic, ComicError> {
        let started = Instant::now();
        info!(%theme, "building daily comic");

        let story = self.story.generate_story(theme).await.map_err(|error| {
            warn!(%theme, %error, "story generation failed");
            ComicError::pipeline_failed(error)
        })?;
        let images = self
            .render_panels(&story)
            .await
            .map_err(ComicError::pipeline_failed)?;
        let comic = assemble(story, images);

        info!(
            %theme,
            title = %comic.title,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "daily comic ready"
        );
        Ok(comic)
    }

    /// Issues every render up front and waits for all of them to settle.
    /// The first failure to settle is the one reported.
    async fn render_panels(&self, story: &Story) -> Result<Vec<ImageHandle>, ComicError> {
        let mut pending: FuturesUnordered<_> = story
            .panels
            .iter()
            .enumerate()
            .map(|(index, panel)| async move {
                (index, self.renderer.render_panel(&panel.image_prompt).await)
            })
            .collect();

        let mut slots: Vec<Option<ImageHandle>> = vec![None; story.panels.len()];
        let mut first_failure = None;
        while let Some((index, result)) = pending.next().await {
            match result {
                Ok(image) => slots[index] = Some(image),
                Err(error) => {
                    warn!(panel = index, %error, "panel render failed");
                    first_failure.get_or_insert(error);
                }
            }
        }

        match first_failure {
            Some(error) => Err(error),
            None => Ok(slots.into_iter().flatten().collect()),
        }
    }
}

/// Pairs image `i` with story panel `i`'s caption.
pub fn assemble(story: Story, images: Vec<ImageHandle>) -> Comic {
    let panels = story
        .panels
        .into_iter()
        .zip(images)
        .map(|(panel, image)| Panel {
            image_url: image.into_string(),
            caption: panel.caption,
        })
        .collect();
    Comic {
        title: story.title,
        panels,
    }
}
