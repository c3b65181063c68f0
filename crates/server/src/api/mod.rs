use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Datelike;
use comic_core::ComicError;
use shared::{
    domain::Comic,
    error::ApiError,
    protocol::{daily_comic_route, daily_prompt_route, healthz_route, DailyPromptResponse},
};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{app_state::AppState, cache::CacheKey};

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(healthz_route(), get(healthz))
        .route(daily_comic_route(), get(daily_comic))
        .route(daily_prompt_route(), get(daily_prompt))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn daily_comic(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Comic>, (StatusCode, Json<ApiError>)> {
    let now = (state.clock)();
    let theme = state.selector.theme_for(now);

    let result = match &state.cache {
        Some(cache) => {
            let key = CacheKey {
                year: state.selector.civil_date(now).year(),
                day: state.selector.day_key(now),
            };
            cache
                .get_or_build(key, || state.pipeline.build_daily_comic(&theme))
                .await
        }
        None => state.pipeline.build_daily_comic(&theme).await.map_err(Arc::new),
    };

    result.map(Json).map_err(|error| {
        error!(%theme, %error, "error generating comic");
        pipeline_failure(&error)
    })
}

async fn daily_prompt(State(state): State<Arc<AppState>>) -> Json<DailyPromptResponse> {
    let now = (state.clock)();
    Json(DailyPromptResponse {
        prompt: state.selector.theme_for(now),
        day_key: state.selector.day_key(now),
    })
}

fn pipeline_failure(error: &ComicError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(
            error.code(),
            "Failed to generate comic",
            error.cause().to_string(),
        )),
    )
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
