//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`info`] — Metadata lookup before downloading
//! - [`tasks`] — Submitting downloads, polling status, fetching the result
//! - [`videos`] — Stored file listing, deletion and retrieval
//! - [`system`] — Health, events, OpenAPI

use crate::error::{Error, Result};
use crate::utils::{attachment_disposition, content_type_for};
use axum::{
    body::Body,
    http::header,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;

mod info;
mod system;
mod tasks;
mod videos;

// Re-export all handlers so `routes::function_name` works
pub use info::*;
pub use system::*;
pub use tasks::*;
pub use videos::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /info
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct InfoRequest {
    /// Source page URL
    #[serde(default)]
    pub url: String,
}

/// Generic acknowledgement body
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    /// Always true
    pub success: bool,
}

/// Stream a stored file back as an attachment named `filename`
///
/// The body is read in chunks so large files never sit in memory whole.
pub(crate) async fn attachment_response(path: &Path, filename: &str) -> Result<Response> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("file '{}'", filename)));
        }
        Err(e) => return Err(e.into()),
    };
    let length = file.metadata().await?.len();

    axum::http::Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(filename))
        .header(header::CONTENT_LENGTH, length)
        .header(header::CONTENT_DISPOSITION, attachment_disposition(filename))
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| Error::Other(format!("failed to build file response: {}", e)))
}
