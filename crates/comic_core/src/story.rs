use std::sync::Arc;

use provider::{TextGenerator, TextRequest};
use serde::Deserialize;
use serde_json::json;
use shared::domain::{Story, StoryPanel, Theme, PANEL_COUNT};
use tracing::{error, info};

use crate::error::ComicError;

/// Writes a 4-panel story for a theme with one text-generation call.
pub struct StoryGenerator {
    text: Arc<dyn TextGenerator>,
    model: String,
}

impl StoryGenerator {
    pub fn new(text: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            text,
            model: model.into(),
        }
    }

    pub async fn generate_story(&self, theme: &Theme) -> Result<Story, ComicError> {
        let request = TextRequest {
            model: self.model.clone(),
            prompt: story_prompt(theme),
            response_schema: story_schema(),
        };
        let raw = self.text.generate_text(request).await?;
        let story = parse_story(&raw)?;
        info!(%theme, title = %story.title, "story generated");
        Ok(story)
    }
}

pub fn story_prompt(theme: &Theme) -> String {
    format!(
        "Create a funny and simple 4-panel comic strip about a cat. The theme is: \"{theme}\".\n\
         The story should have a clear beginning, middle, and end, told across four panels.\n\
         Panel 1: Setup - The cat sees something or has an idea.\n\
         Panel 2: Action/Complication - The cat attempts something, and a small problem occurs.\n\
         Panel 3: Escalation - The situation gets more chaotic or silly.\n\
         Panel 4: Punchline - The funny or unexpected outcome.\n\
         Keep the descriptions and captions very short and simple."
    )
}

/// Output contract declared to the provider. Advisory only: [`parse_story`]
/// re-checks everything.
pub fn story_schema() -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "A short, catchy title for the 4-panel comic strip. Max 10 words."
            },
            "panels": {
                "type": "ARRAY",
                "description": "An array of exactly 4 panels for the comic strip.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "imagePrompt": {
                            "type": "STRING",
                            "description": "A simple visual description for a single comic panel image. Focus on the cat's action and expression."
                        },
                        "caption": {
                            "type": "STRING",
                            "description": "A short, witty caption for this panel. Max 15 words."
                        }
                    },
                    "required": ["imagePrompt", "caption"]
                }
            }
        },
        "required": ["title", "panels"]
    })
}

#[derive(Debug, Deserialize)]
struct RawStory {
    title: Option<String>,
    panels: Option<Vec<StoryPanel>>,
}

/// Syntax errors are `MalformedResponse`; anything that is valid JSON but not
/// a complete 4-panel story is `InvalidStoryShape`.
pub fn parse_story(raw: &str) -> Result<Story, ComicError> {
    let raw = raw.trim();
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|source| {
        error!(raw, %source, "failed to parse story JSON");
        ComicError::MalformedResponse {
            raw: raw.to_string(),
            source,
        }
    })?;
    let parsed: RawStory =
        serde_json::from_value(value).map_err(|e| ComicError::InvalidStoryShape(e.to_string()))?;

    let story = Story {
        title: parsed
            .title
            .ok_or_else(|| ComicError::InvalidStoryShape("missing title".into()))?,
        panels: parsed
            .panels
            .ok_or_else(|| ComicError::InvalidStoryShape("missing panels".into()))?,
    };
    validate_story(&story)?;
    Ok(story)
}

pub fn validate_story(story: &Story) -> Result<(), ComicError> {
    if story.title.trim().is_empty() {
        return Err(ComicError::InvalidStoryShape("title is empty".into()));
    }
    if story.panels.len() != PANEL_COUNT {
        return Err(ComicError::InvalidStoryShape(format!(
            "expected {PANEL_COUNT} panels, got {}",
            story.panels.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/story_tests.rs"]
mod tests;
