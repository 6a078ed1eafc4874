use super::*;
use crate::downloader::test_helpers::{self, MockExtractor};
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test VideoDownloader wrapped in Arc, plus its config
async fn create_test_downloader(
    mock: MockExtractor,
) -> (Arc<VideoDownloader>, Arc<Config>, tempfile::TempDir) {
    let (downloader, temp_dir) = test_helpers::create_test_downloader(mock).await;
    let config = downloader.get_config();
    (Arc::new(downloader), config, temp_dir)
}

/// Router over a downloader backed by `mock`
async fn test_app(mock: MockExtractor) -> (Router, Arc<VideoDownloader>, tempfile::TempDir) {
    let (downloader, config, temp_dir) = create_test_downloader(mock).await;
    (create_router(downloader.clone(), config), downloader, temp_dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Poll `/api/status/{id}` until the task is completed or failed
async fn poll_until_terminal(app: &Router, task_id: &str) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/status/{}", task_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        if status["status"] == "completed" || status["status"] == "error" {
            return status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {} never finished: {}",
            task_id,
            status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown_signal() {
    let (downloader, config, _temp_dir) = create_test_downloader(MockExtractor::succeeding()).await;

    let mut config = (*config).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(start_api_server_with_shutdown(
        downloader,
        config,
        async move {
            let _ = stop_rx.await;
        },
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok(), "{:?}", result);
}

#[tokio::test]
async fn test_cors_enabled() {
    let (downloader, config, _temp_dir) = create_test_downloader(MockExtractor::succeeding()).await;

    let mut config = (*config).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_restricted_to_listed_origins() {
    let (downloader, config, _temp_dir) = create_test_downloader(MockExtractor::succeeding()).await;

    let mut config = (*config).clone();
    config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = |origin: &str| {
        Request::builder()
            .uri("/api/health")
            .header("Origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let allowed = app
        .clone()
        .oneshot(request("http://allowed.example"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://allowed.example"
    );

    let other = app.oneshot(request("http://other.example")).await.unwrap();
    assert!(!other.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_disabled() {
    let (downloader, config, _temp_dir) = create_test_downloader(MockExtractor::succeeding()).await;

    let mut config = (*config).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _downloader, _temp_dir) = test_app(MockExtractor::succeeding()).await;
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
