//! Metadata lookup handler.

use super::InfoRequest;
use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::types::VideoInfo;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// POST /info - Look up a video's title, duration and selectable qualities
///
/// Any failure to read the page (extractor error, extractor not installed) is
/// reported as 400 with the extractor's message.
#[utoipa::path(
    post,
    path = "/api/info",
    tag = "videos",
    request_body = InfoRequest,
    responses(
        (status = 200, description = "Video metadata and quality options", body = VideoInfo),
        (status = 400, description = "Missing URL, or the video could not be read", body = ApiError)
    )
)]
pub async fn get_video_info(
    State(state): State<AppState>,
    Json(request): Json<InfoRequest>,
) -> Result<Json<VideoInfo>, Response> {
    match state.downloader.fetch_video_info(&request.url).await {
        Ok(info) => Ok(Json(info)),
        Err(e) => Err(lookup_failure(e)),
    }
}

/// Response for a failed lookup: extractor-side failures become 400, keeping code and message
fn lookup_failure(error: Error) -> Response {
    match error {
        Error::Extraction(_) | Error::NotSupported(_) | Error::ExternalTool(_) => {
            tracing::warn!(error = %error, "video info lookup failed");
            (StatusCode::BAD_REQUEST, Json(ApiError::from(error))).into_response()
        }
        other => other.into_response(),
    }
}
