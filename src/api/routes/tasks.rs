//! Download task handlers: submit, poll, fetch result.

use super::attachment_response;
use crate::api::AppState;
use crate::error::Result;
use crate::types::{DownloadRequest, SubmitResponse, Task, TaskId};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};

/// POST /download - Start a download in the background
///
/// Returns as soon as the task is registered; poll `/api/status/{task_id}` for progress.
#[utoipa::path(
    post,
    path = "/api/download",
    tag = "downloads",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Task accepted", body = SubmitResponse),
        (status = 400, description = "Missing or malformed URL", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Result<Json<SubmitResponse>> {
    let task_id = state.downloader.submit(request).await?;
    Ok(Json(SubmitResponse { task_id }))
}

/// GET /status/:task_id - Current state of a download task
#[utoipa::path(
    get,
    path = "/api/status/{task_id}",
    tag = "downloads",
    params(
        ("task_id" = String, Path, description = "Task identifier returned by POST /api/download")
    ),
    responses(
        (status = 200, description = "Task status", body = Task),
        (status = 404, description = "Unknown task", body = crate::error::ApiError)
    )
)]
pub async fn get_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>> {
    let task = state.downloader.get_task(&TaskId::from(task_id)).await?;
    Ok(Json(task))
}

/// GET /file/:task_id - Download the file produced by a completed task
#[utoipa::path(
    get,
    path = "/api/file/{task_id}",
    tag = "downloads",
    params(
        ("task_id" = String, Path, description = "Task identifier")
    ),
    responses(
        (status = 200, description = "File contents as an attachment", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown task, task not completed, or file gone", body = crate::error::ApiError)
    )
)]
pub async fn download_task_file(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response> {
    let (filename, path) = state
        .downloader
        .completed_file(&TaskId::from(task_id))
        .await?;
    attachment_response(&path, &filename).await
}
