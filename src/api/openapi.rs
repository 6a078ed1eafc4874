//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the vidgrab REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the vidgrab REST API
///
/// The document is served at:
/// - `/api/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidgrab REST API",
        version = "0.1.0",
        description = "Look up videos, download them in the background, poll progress and manage stored files",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:54321", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::get_video_info,
        crate::api::routes::start_download,
        crate::api::routes::get_status,
        crate::api::routes::download_task_file,

        // Stored files
        crate::api::routes::list_videos,
        crate::api::routes::delete_video,
        crate::api::routes::download_video,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::Task,
        crate::types::DownloadRequest,
        crate::types::SubmitResponse,
        crate::types::VideoInfo,
        crate::types::FormatOption,
        crate::types::StoredFile,
        crate::types::TaskCounts,
        crate::types::Event,

        // API request/response types from routes
        crate::api::routes::InfoRequest,
        crate::api::routes::SuccessResponse,
        crate::api::routes::HealthResponse,

        // Error types from error.rs
        crate::error::ApiError,
    )),
    tags(
        (name = "downloads", description = "Background downloads - Submit, poll status, fetch the finished file"),
        (name = "videos", description = "Videos - Metadata lookup and stored file management"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI document, events"),
    )
)]
pub struct ApiDoc;
