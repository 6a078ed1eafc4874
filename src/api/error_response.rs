//! HTTP error response handling for the API
//!
//! This module provides conversions from domain errors to HTTP responses
//! with appropriate status codes and JSON error bodies.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors with a known status go through Error::into_response
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use std::path::PathBuf;

    async fn body_of(response: Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_error_to_http_status_bad_request() {
        let error = Error::InvalidInput("URL is required".to_string());
        assert_eq!(error.status_code(), 400);
        assert_eq!(error.error_code(), "invalid_input");
    }

    #[test]
    fn test_error_to_http_status_task_not_found() {
        let error = Error::TaskNotFound("1a2b3c4d".to_string());
        assert_eq!(error.status_code(), 404);
        assert_eq!(error.error_code(), "task_not_found");
    }

    #[test]
    fn test_error_to_http_status_bad_gateway() {
        let error = Error::Extraction(ExtractionError::Failed {
            reason: "ERROR: Unsupported URL".to_string(),
        });
        assert_eq!(error.status_code(), 502);
        assert_eq!(error.error_code(), "extraction_failed");
    }

    #[test]
    fn test_error_to_http_status_service_unavailable() {
        let error = Error::ShuttingDown;
        assert_eq!(error.status_code(), 503);
        assert_eq!(error.error_code(), "shutting_down");
    }

    #[test]
    fn test_file_not_ready_carries_details() {
        let error = Error::FileNotReady {
            id: "1a2b3c4d".to_string(),
            reason: "task is downloading".to_string(),
        };
        let api_error: ApiError = error.into();

        assert_eq!(api_error.code, "file_not_ready");
        assert!(api_error.error.contains("downloading"));
        assert!(api_error.details.is_some());
    }

    #[tokio::test]
    async fn test_error_into_response() {
        let response = Error::NotFound("file 'clip.mp4'".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let api_error = body_of(response).await;
        assert_eq!(api_error.code, "not_found");
        assert!(api_error.error.contains("clip.mp4"));
    }

    #[tokio::test]
    async fn test_missing_file_into_response() {
        let error = Error::Extraction(ExtractionError::FileMissing {
            path: PathBuf::from("/downloads/clip_1a2b3c4d.mp4"),
        });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let api_error = body_of(response).await;
        assert_eq!(api_error.code, "file_missing");
        assert!(api_error.error.contains("clip_1a2b3c4d.mp4"));
    }

    #[tokio::test]
    async fn test_api_error_defaults_to_500() {
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await.code, "internal_error");
    }
}
