//! Traits and types for media extraction

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Metadata for one video page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    /// Video title
    pub title: Option<String>,
    /// Thumbnail URL
    pub thumbnail: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    /// Every stream the site offers
    pub formats: Vec<MediaFormat>,
}

/// One stream offered by the site
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaFormat {
    /// Extractor format identifier
    pub format_id: String,
    /// Container extension
    pub ext: String,
    /// Frame height, for video streams
    pub height: Option<u32>,
    /// Exact size when known, otherwise the approximate size
    pub filesize: Option<u64>,
    /// Carries a video track
    pub has_video: bool,
    /// Carries an audio track
    pub has_audio: bool,
}

/// Everything the extractor needs to fetch one video
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Source page URL
    pub url: String,
    /// Height ceiling for the video stream
    pub max_height: u32,
    /// Directory the final file is written to
    pub output_dir: PathBuf,
    /// File name without extension
    pub output_stem: String,
    /// Container audio and video are merged into
    pub merge_format: String,
}

impl FetchRequest {
    /// Best video at or below the ceiling plus best audio, else the best combined stream
    /// at or below the ceiling
    pub fn format_selector(&self) -> String {
        format!(
            "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
            h = self.max_height
        )
    }

    /// Path the file is expected at when the extractor keeps the merge container
    pub fn expected_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", self.output_stem, self.merge_format))
    }
}

/// Phase of a progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    /// Bytes are being transferred
    Downloading,
    /// One stream finished transferring
    Finished,
    /// Anything else the extractor reports (errors, post-processing)
    Other,
}

/// Cumulative byte counters for the stream currently being fetched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Phase of the transfer
    pub phase: ProgressPhase,
    /// Bytes received so far
    pub downloaded_bytes: u64,
    /// Total size (exact, else estimated); None when unknown
    pub total_bytes: Option<u64>,
}

/// Trait for the external capability that resolves and fetches media
///
/// Implementations can drive an external binary or provide stub behavior for
/// graceful degradation when no binary is installed.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Resolve a page URL to its metadata and stream list
    async fn fetch_metadata(&self, url: &str) -> crate::Result<MediaMetadata>;

    /// Fetch and mux the media described by `request`
    ///
    /// Progress reports are pushed into `progress` as they arrive. On success the path
    /// of the final file is returned; it lives in `request.output_dir` and its name
    /// starts with `request.output_stem`.
    async fn download(
        &self,
        request: &FetchRequest,
        progress: mpsc::Sender<ProgressUpdate>,
    ) -> crate::Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// File name component of a path, if it is valid UTF-8
pub(crate) fn file_name_of(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}
