use super::*;
use axum::{http::StatusCode, routing::get, Json, Router};
use shared::{domain::Panel, error::ErrorCode};
use tokio::net::TcpListener;

async fn spawn_comic_server(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn sample_comic() -> Comic {
    Comic {
        title: "Red Dot Saga".into(),
        panels: (0..4)
            .map(|i| Panel {
                image_url: format!("data:image/png;base64,P{i}AA"),
                caption: format!("caption {i}"),
            })
            .collect(),
    }
}

#[test]
fn rejects_invalid_server_url() {
    assert!(matches!(HttpComicSource::new("not a url"), Err(SourceError::Url(_))));
}

#[tokio::test]
async fn fetches_comic_from_daily_route() {
    let app = Router::new().route(daily_comic_route(), get(|| async { Json(sample_comic()) }));
    let server_url = spawn_comic_server(app).await;

    let source = HttpComicSource::new(&server_url).expect("source");
    let comic = source
        .fetch_comic(&Theme::new("the epic saga of chasing the red dot"))
        .await
        .expect("comic");
    assert_eq!(comic, sample_comic());
}

#[tokio::test]
async fn surfaces_server_error_body() {
    let app = Router::new().route(
        daily_comic_route(),
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(
                    ErrorCode::InvalidStoryShape,
                    "Failed to generate comic",
                    "invalid comic strip structure: expected 4 panels, got 3",
                )),
            )
        }),
    );
    let server_url = spawn_comic_server(app).await;

    let err = HttpComicSource::new(&server_url)
        .expect("source")
        .fetch_comic(&Theme::new("t"))
        .await
        .expect_err("should fail");
    match &err {
        SourceError::Server(api_error) => assert_eq!(api_error.code, ErrorCode::InvalidStoryShape),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("expected 4 panels, got 3"));
}

#[tokio::test]
async fn non_json_error_body_is_still_reported() {
    let app = Router::new().route(
        daily_comic_route(),
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let server_url = spawn_comic_server(app).await;

    let err = HttpComicSource::new(&server_url)
        .expect("source")
        .fetch_comic(&Theme::new("t"))
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("upstream down"));
    assert!(err.to_string().contains("502"));
}
