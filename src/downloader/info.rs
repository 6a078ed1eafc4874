//! Video metadata and the list of selectable qualities.

use crate::error::Result;
use crate::extractor::{MediaFormat, MediaMetadata};
use crate::types::{FormatOption, VideoInfo};
use crate::utils::validate_url;
use std::collections::BTreeMap;

use super::VideoDownloader;

/// Lowest height offered to the user
pub const MIN_LISTED_HEIGHT: u32 = 720;

/// Offered when the site lists nothing at or above [`MIN_LISTED_HEIGHT`]
pub const DEFAULT_QUALITIES: [u32; 2] = [1080, 720];

impl VideoDownloader {
    /// Resolve a page URL into its title, thumbnail, duration and qualities
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidInput`] for an empty or malformed URL
    /// - extractor errors when the page cannot be resolved
    pub async fn fetch_video_info(&self, url: &str) -> Result<VideoInfo> {
        let url = validate_url(url)?;
        let meta = self.extractor.fetch_metadata(&url).await?;

        tracing::debug!(
            url = %url,
            formats = meta.formats.len(),
            "metadata fetched"
        );

        let formats = summarize_formats(&meta, &self.config.extractor.merge_output_format);
        Ok(VideoInfo {
            title: meta
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            thumbnail: meta.thumbnail.unwrap_or_default(),
            duration: meta.duration.unwrap_or(0.0),
            formats,
        })
    }
}

/// Collapse the extractor's stream list into selectable qualities
///
/// Video streams of at least [`MIN_LISTED_HEIGHT`] become `"{height}p"` options.
/// A video-only stream's size includes the largest audio-only stream, since that is
/// what gets muxed in. One option per quality survives, carrying the largest size
/// seen; options are ordered by height, highest first. When nothing qualifies the
/// [`DEFAULT_QUALITIES`] are offered with unknown sizes.
pub fn summarize_formats(meta: &MediaMetadata, ext: &str) -> Vec<FormatOption> {
    let best_audio = meta
        .formats
        .iter()
        .filter(|f| f.has_audio && !f.has_video)
        .filter_map(|f| f.filesize)
        .max();

    let mut by_height: BTreeMap<u32, Option<u64>> = BTreeMap::new();
    for format in meta.formats.iter().filter(|f| f.has_video) {
        let Some(height) = format.height.filter(|h| *h >= MIN_LISTED_HEIGHT) else {
            continue;
        };
        let size = combined_size(format, best_audio);
        let slot = by_height.entry(height).or_insert(None);
        if size > *slot {
            *slot = size;
        }
    }

    if by_height.is_empty() {
        DEFAULT_QUALITIES
            .iter()
            .map(|height| option(*height, ext, None))
            .collect()
    } else {
        by_height
            .into_iter()
            .rev()
            .map(|(height, size)| option(height, ext, size))
            .collect()
    }
}

fn combined_size(format: &MediaFormat, best_audio: Option<u64>) -> Option<u64> {
    let video = format.filesize?;
    if format.has_audio {
        Some(video)
    } else {
        Some(video.saturating_add(best_audio.unwrap_or(0)))
    }
}

fn option(height: u32, ext: &str, size: Option<u64>) -> FormatOption {
    FormatOption {
        quality: format!("{}p", height),
        height,
        ext: ext.to_string(),
        size,
    }
}
