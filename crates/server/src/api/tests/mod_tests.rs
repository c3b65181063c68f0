use super::*;
use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use chrono::{DateTime, Utc};
use comic_core::{ComicPipeline, DaySelector, PanelRenderer, StoryGenerator, ThemeCatalog};
use provider::{
    GeneratedImage, ImageGenerator, ImageRequest, ProviderError, TextGenerator, TextRequest,
};
use shared::error::ErrorCode;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};
use tower::ServiceExt;

struct FakeText {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate_text(&self, request: TextRequest) -> Result<String, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("prompts").push(request.prompt);
        let panels: Vec<String> = (0..4)
            .map(|i| format!(r#"{{"imagePrompt":"scene {i}","caption":"caption {i}"}}"#))
            .collect();
        Ok(format!(
            r#"{{"title":"Strip {n}","panels":[{}]}}"#,
            panels.join(",")
        ))
    }
}

struct FakeImages {
    empty: bool,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate_images(
        &self,
        _request: ImageRequest,
    ) -> Result<Vec<GeneratedImage>, ProviderError> {
        if self.empty {
            return Ok(Vec::new());
        }
        Ok(vec![GeneratedImage {
            bytes_b64: "AAAA".into(),
            mime_type: Some("image/png".into()),
        }])
    }
}

fn fixed_clock(rfc3339: &'static str) -> crate::app_state::Clock {
    Arc::new(move || {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("timestamp")
            .with_timezone(&Utc)
    })
}

fn test_app(empty_images: bool, cache: bool) -> (Router, Arc<FakeText>) {
    let text = Arc::new(FakeText {
        calls: AtomicUsize::new(0),
        prompts: Mutex::new(Vec::new()),
    });
    let pipeline = ComicPipeline::new(
        StoryGenerator::new(text.clone(), "text-model"),
        PanelRenderer::new(Arc::new(FakeImages { empty: empty_images }), "image-model"),
    );
    let selector = DaySelector::new(Arc::new(ThemeCatalog::cats()), comic_core::DEFAULT_TIMEZONE);
    let mut state = AppState::new(pipeline, selector, cache);
    // January 2 in New York: catalog index 1.
    state.clock = fixed_clock("2026-01-02T12:00:00-05:00");
    (build_router(Arc::new(state)), text)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::get(uri).body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, serde_json::from_slice(&bytes).expect("json"))
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _) = test_app(false, true);
    let request = Request::get("/healthz").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"ok");
}

#[tokio::test]
async fn daily_prompt_reports_todays_theme() {
    let (app, _) = test_app(false, true);
    let (status, body) = get_json(app, "/api/daily-prompt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prompt"], "encountering a cucumber for the first time");
    assert_eq!(body["dayKey"], 2);
}

#[tokio::test]
async fn daily_comic_returns_four_ordered_panels() {
    let (app, text) = test_app(false, true);
    let (status, body) = get_json(app, "/api/daily-comic").await;
    assert_eq!(status, StatusCode::OK);

    let comic: Comic = serde_json::from_value(body).expect("comic");
    assert_eq!(comic.title, "Strip 0");
    assert_eq!(comic.panels.len(), 4);
    for (i, panel) in comic.panels.iter().enumerate() {
        assert_eq!(panel.caption, format!("caption {i}"));
        assert_eq!(panel.image_url, "data:image/png;base64,AAAA");
    }
    let prompts = text.prompts.lock().expect("prompts");
    assert!(prompts[0].contains("encountering a cucumber for the first time"));
}

#[tokio::test]
async fn daily_comic_is_cached_for_the_day() {
    let (app, text) = test_app(false, true);
    let (_, first) = get_json(app.clone(), "/api/daily-comic").await;
    let (_, second) = get_json(app, "/api/daily-comic").await;
    assert_eq!(first, second);
    assert_eq!(text.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn uncached_server_regenerates_every_request() {
    let (app, text) = test_app(false, false);
    let (_, first) = get_json(app.clone(), "/api/daily-comic").await;
    let (_, second) = get_json(app, "/api/daily-comic").await;
    assert_eq!(first["title"], "Strip 0");
    assert_eq!(second["title"], "Strip 1");
    assert_eq!(text.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn pipeline_failure_is_500_with_error_body() {
    let (app, _) = test_app(true, true);
    let (status, body) = get_json(app, "/api/daily-comic").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: ApiError = serde_json::from_value(body).expect("error body");
    assert_eq!(error.code, ErrorCode::NoImageReturned);
    assert_eq!(error.error, "Failed to generate comic");
    assert!(error.message.contains("no images returned"));
}
