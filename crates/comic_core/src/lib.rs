//! Daily comic pipeline: pick today's theme, write a 4-panel story for it,
//! render every panel concurrently and assemble the strip.

pub mod catalog;
pub mod day_key;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod story;

pub use catalog::ThemeCatalog;
pub use day_key::{DaySelector, DEFAULT_TIMEZONE};
pub use error::ComicError;
pub use pipeline::ComicPipeline;
pub use render::{ImageHandle, PanelRenderer};
pub use story::StoryGenerator;
