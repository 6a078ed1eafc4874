//! No-op extractor for graceful degradation

use super::traits::{FetchRequest, MediaExtractor, MediaMetadata, ProgressUpdate};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Extractor used when no yt-dlp binary is available
///
/// The server still starts, lists and serves stored files; metadata lookups and new
/// downloads fail with `Error::NotSupported`.
///
/// # Examples
///
/// ```
/// use vidgrab::extractor::{MediaExtractor, NoOpExtractor};
///
/// # #[tokio::main]
/// # async fn main() {
/// let extractor = NoOpExtractor;
/// assert!(extractor.fetch_metadata("https://example.com").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpExtractor;

const UNAVAILABLE: &str = "Video extraction requires the external yt-dlp binary. \
     Configure extractor.ytdlp_path or ensure yt-dlp is in PATH.";

#[async_trait]
impl MediaExtractor for NoOpExtractor {
    async fn fetch_metadata(&self, _url: &str) -> crate::Result<MediaMetadata> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    async fn download(
        &self,
        _request: &FetchRequest,
        _progress: mpsc::Sender<ProgressUpdate>,
    ) -> crate::Result<PathBuf> {
        Err(crate::Error::NotSupported(UNAVAILABLE.into()))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
