use std::{fmt, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use provider::{AspectRatio, ImageGenerator, ImageRequest};
use tracing::{debug, warn};

use crate::error::ComicError;

const OUTPUT_MIME_TYPE: &str = "image/png";

/// Self-contained image reference, a `data:` URI that needs no further fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle(String);

impl ImageHandle {
    pub fn from_base64(mime_type: &str, payload_b64: &str) -> Self {
        Self(format!("data:{mime_type};base64,{payload_b64}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders one panel prompt in the shared strip style.
pub struct PanelRenderer {
    images: Arc<dyn ImageGenerator>,
    model: String,
}

impl PanelRenderer {
    pub fn new(images: Arc<dyn ImageGenerator>, model: impl Into<String>) -> Self {
        Self {
            images,
            model: model.into(),
        }
    }

    pub async fn render_panel(&self, visual_prompt: &str) -> Result<ImageHandle, ComicError> {
        let request = ImageRequest {
            model: self.model.clone(),
            prompt: styled_prompt(visual_prompt),
            number_of_images: 1,
            output_mime_type: OUTPUT_MIME_TYPE.to_string(),
            aspect_ratio: AspectRatio::Square,
        };
        let images = self.images.generate_images(request).await?;
        let Some(image) = images.into_iter().next() else {
            warn!(visual_prompt, "image generation returned no images");
            return Err(ComicError::NoImageReturned);
        };

        let payload = image.bytes_b64.trim();
        let decoded_len = match STANDARD.decode(payload) {
            Ok(bytes) if !bytes.is_empty() => bytes.len(),
            Ok(_) => return Err(ComicError::NoImageReturned),
            Err(error) => {
                warn!(%error, "image payload is not valid base64");
                return Err(ComicError::NoImageReturned);
            }
        };
        debug!(bytes = decoded_len, "panel rendered");

        let mime_type = image
            .mime_type
            .as_deref()
            .filter(|mime| mime.starts_with("image/"))
            .unwrap_or(OUTPUT_MIME_TYPE);
        Ok(ImageHandle::from_base64(mime_type, payload))
    }
}

pub fn styled_prompt(visual_prompt: &str) -> String {
    format!(
        "A cute, minimalist, hand-drawn doodle of a cat. The scene is: \"{visual_prompt}\". \
         Simple black ink sketch on a plain white background, whimsical and playful cartoon style."
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
