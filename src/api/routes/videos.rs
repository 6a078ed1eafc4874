//! Stored file handlers.

use super::{SuccessResponse, attachment_response};
use crate::api::AppState;
use crate::error::Result;
use crate::types::StoredFile;
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};

/// GET /videos - List stored files, newest first
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Stored files with retention countdown", body = Vec<StoredFile>),
        (status = 500, description = "Storage directory could not be read", body = crate::error::ApiError)
    )
)]
pub async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<StoredFile>>> {
    Ok(Json(state.downloader.list_videos().await?))
}

/// DELETE /videos/:filename - Delete a stored file
#[utoipa::path(
    delete,
    path = "/api/videos/{filename}",
    tag = "videos",
    params(
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File deleted", body = SuccessResponse),
        (status = 400, description = "Name is not a plain file name", body = crate::error::ApiError),
        (status = 404, description = "No such file", body = crate::error::ApiError)
    )
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<SuccessResponse>> {
    state.downloader.delete_video(&filename).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /videos/:filename/download - Download a stored file by name
#[utoipa::path(
    get,
    path = "/api/videos/{filename}/download",
    tag = "videos",
    params(
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File contents as an attachment", content_type = "application/octet-stream"),
        (status = 400, description = "Name is not a plain file name", body = crate::error::ApiError),
        (status = 404, description = "No such file", body = crate::error::ApiError)
    )
)]
pub async fn download_video(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let path = state.downloader.video_path(&filename).await?;
    attachment_response(&path, &filename).await
}
