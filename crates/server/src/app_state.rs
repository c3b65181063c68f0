use std::sync::Arc;

use chrono::{DateTime, Utc};
use comic_core::{ComicPipeline, DaySelector};

use crate::cache::DailyComicCache;

pub(crate) type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pipeline: Arc<ComicPipeline>,
    pub(crate) selector: DaySelector,
    pub(crate) cache: Option<Arc<DailyComicCache>>,
    pub(crate) clock: Clock,
}

impl AppState {
    pub(crate) fn new(
        pipeline: ComicPipeline,
        selector: DaySelector,
        cache_daily_comic: bool,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            selector,
            cache: cache_daily_comic.then(|| Arc::new(DailyComicCache::default())),
            clock: Arc::new(Utc::now),
        }
    }
}
