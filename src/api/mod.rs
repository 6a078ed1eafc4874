//! REST API server module
//!
//! Exposes the download service over HTTP: metadata lookup, background
//! downloads with status polling, stored file management, plus health,
//! server-sent events and the OpenAPI document.

use crate::{Config, Result, VideoDownloader};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Downloads
/// - `POST /api/info` - Look up title, thumbnail, duration and qualities
/// - `POST /api/download` - Start a background download, returns `{task_id}`
/// - `GET /api/status/:task_id` - Poll a task
/// - `GET /api/file/:task_id` - Fetch the file of a completed task
///
/// ## Stored files
/// - `GET /api/videos` - List stored files, newest first
/// - `DELETE /api/videos/:filename` - Delete a stored file
/// - `GET /api/videos/:filename/download` - Fetch a stored file by name
///
/// ## System
/// - `GET /api/health` - Health check
/// - `GET /api/events` - Server-sent events stream
/// - `GET /api/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(downloader: Arc<VideoDownloader>, config: Arc<Config>) -> Router {
    let state = AppState::new(downloader, config.clone());

    let router = Router::new()
        // Downloads
        .route("/api/info", post(routes::get_video_info))
        .route("/api/download", post(routes::start_download))
        .route("/api/status/:task_id", get(routes::get_status))
        .route("/api/file/:task_id", get(routes::download_task_file))
        // Stored files
        .route("/api/videos", get(routes::list_videos))
        .route("/api/videos/:filename", axum::routing::delete(routes::delete_video))
        .route(
            "/api/videos/:filename/download",
            get(routes::download_video),
        )
        // System
        .route("/api/health", get(routes::health_check))
        .route("/api/events", get(routes::event_stream))
        .route("/api/openapi.json", get(routes::openapi_spec));

    // SwaggerUi registers its own copy of the document, so it needs a path of its own
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// "*" (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. Methods and headers are always unrestricted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the server fails or the process exits. Use
/// [`start_api_server_with_shutdown`] to stop it from a future.
///
/// # Example
///
/// ```no_run
/// use vidgrab::{VideoDownloader, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let downloader = Arc::new(VideoDownloader::new((*config).clone()).await?);
///
/// // Start API server (blocks until shutdown)
/// vidgrab::api::start_api_server(downloader, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(downloader: Arc<VideoDownloader>, config: Arc<Config>) -> Result<()> {
    start_api_server_with_shutdown(downloader, config, std::future::pending()).await
}

/// Start the API server and stop accepting connections once `shutdown` resolves.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn start_api_server_with_shutdown<F>(
    downloader: Arc<VideoDownloader>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(downloader, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
