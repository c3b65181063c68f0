use std::{future::Future, sync::Arc};

use comic_core::ComicError;
use shared::domain::{Comic, DayKey};
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CacheKey {
    pub(crate) year: i32,
    pub(crate) day: DayKey,
}

pub(crate) type BuildResult = Result<Comic, Arc<ComicError>>;

/// Holds today's comic only. Requests for the same day join one build and
/// all receive its outcome, failures included. A failed build is dropped
/// once it settles so the next request starts over.
#[derive(Default)]
pub(crate) struct DailyComicCache {
    slot: Mutex<Option<(CacheKey, Arc<OnceCell<BuildResult>>)>>,
}

impl DailyComicCache {
    pub(crate) async fn get_or_build<F, Fut>(&self, key: CacheKey, build: F) -> BuildResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Comic, ComicError>>,
    {
        let cell = {
            let mut slot = self.slot.lock().await;
            match slot.as_ref() {
                Some((cached_key, cell)) if *cached_key == key => {
                    debug!(
                        year = key.year,
                        day = key.day.0,
                        ready = cell.initialized(),
                        "joining daily comic"
                    );
                    Arc::clone(cell)
                }
                _ => {
                    let cell = Arc::new(OnceCell::new());
                    *slot = Some((key, Arc::clone(&cell)));
                    cell
                }
            }
        };

        let result = cell
            .get_or_init(|| async { build().await.map_err(Arc::new) })
            .await
            .clone();

        if result.is_err() {
            let mut slot = self.slot.lock().await;
            if matches!(slot.as_ref(), Some((_, current)) if Arc::ptr_eq(current, &cell)) {
                *slot = None;
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
