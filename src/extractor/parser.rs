//! Parsers for yt-dlp output
//!
//! Progress and final-path lines carry fixed prefixes set through yt-dlp's
//! `--progress-template` and `--print` options, so they can be told apart from
//! ordinary log output on either stream.

use super::traits::{MediaFormat, MediaMetadata, ProgressPhase, ProgressUpdate};
use crate::error::{ExtractionError, Result};
use std::path::PathBuf;

/// Prefix of progress lines
pub(crate) const PROGRESS_PREFIX: &str = "vidgrab-progress:";

/// Prefix of the line naming the final file
pub(crate) const FILE_PREFIX: &str = "vidgrab-file:";

/// Number of non-progress output lines kept for error messages
const TAIL_LINES: usize = 20;

/// Value for `--progress-template`
pub(crate) fn progress_template() -> String {
    format!(
        "download:{}%(progress.status)s:%(progress.downloaded_bytes)s:%(progress.total_bytes)s:%(progress.total_bytes_estimate)s",
        PROGRESS_PREFIX
    )
}

/// Value for `--print`
pub(crate) fn final_path_template() -> String {
    format!("after_move:{}%(filepath)s", FILE_PREFIX)
}

/// Parse a progress line into cumulative counters
///
/// Fields are `status:downloaded:total:estimate`; yt-dlp prints `NA` for unknown
/// values and may print the estimate as a float.
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split(':');

    let phase = match fields.next()? {
        "downloading" => ProgressPhase::Downloading,
        "finished" => ProgressPhase::Finished,
        _ => ProgressPhase::Other,
    };
    let downloaded_bytes = parse_byte_count(fields.next()?).unwrap_or(0);
    let total = fields.next().and_then(parse_byte_count);
    let estimate = fields.next().and_then(parse_byte_count);

    Some(ProgressUpdate {
        phase,
        downloaded_bytes,
        total_bytes: total.filter(|t| *t > 0).or(estimate.filter(|e| *e > 0)),
    })
}

fn parse_byte_count(field: &str) -> Option<u64> {
    let field = field.trim();
    if let Ok(n) = field.parse::<u64>() {
        return Some(n);
    }
    match field.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f.round() as u64),
        _ => None,
    }
}

/// Parse the line naming the final file
pub fn parse_final_path_line(line: &str) -> Option<PathBuf> {
    let path = line.trim_end_matches(['\r', '\n']).strip_prefix(FILE_PREFIX)?;
    let path = path.trim();
    if path.is_empty() || path == "NA" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Parse `--dump-single-json` output
pub fn parse_metadata(json: &[u8]) -> Result<MediaMetadata> {
    let value: serde_json::Value =
        serde_json::from_slice(json).map_err(|e| ExtractionError::InvalidOutput {
            reason: format!("yt-dlp returned invalid JSON: {}", e),
        })?;

    let Some(object) = value.as_object() else {
        return Err(ExtractionError::InvalidOutput {
            reason: "yt-dlp metadata is not a JSON object".to_string(),
        }
        .into());
    };

    let formats = object
        .get("formats")
        .and_then(|v| v.as_array())
        .map(|formats| formats.iter().filter_map(parse_format).collect())
        .unwrap_or_default();

    Ok(MediaMetadata {
        title: object
            .get("title")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        thumbnail: object
            .get("thumbnail")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        duration: object.get("duration").and_then(|v| v.as_f64()),
        formats,
    })
}

fn parse_format(f: &serde_json::Value) -> Option<MediaFormat> {
    let format_id = f.get("format_id").and_then(|v| v.as_str())?.to_string();
    let ext = f
        .get("ext")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let height = f
        .get("height")
        .and_then(|v| v.as_u64())
        .and_then(|h| u32::try_from(h).ok())
        .filter(|h| *h > 0);
    let filesize = f
        .get("filesize")
        .and_then(json_byte_count)
        .or_else(|| f.get("filesize_approx").and_then(json_byte_count));

    let vcodec = f.get("vcodec").and_then(|v| v.as_str());
    let acodec = f.get("acodec").and_then(|v| v.as_str());
    // Sites that omit codec fields still report a height for video streams.
    let has_video = match vcodec {
        Some(codec) => codec != "none",
        None => height.is_some(),
    };
    let has_audio = match acodec {
        Some(codec) => codec != "none",
        None => false,
    };

    Some(MediaFormat {
        format_id,
        ext,
        height,
        filesize,
        has_video,
        has_audio,
    })
}

fn json_byte_count(v: &serde_json::Value) -> Option<u64> {
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.round() as u64)
    })
}

/// Bounded buffer of the most recent non-progress output lines
#[derive(Debug, Default)]
pub(crate) struct OutputTail {
    lines: std::collections::VecDeque<String>,
}

impl OutputTail {
    pub(crate) fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if self.lines.len() == TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    /// Best description of a failed run: the last `ERROR:` line, else the tail joined
    pub(crate) fn failure_reason(&self) -> Option<String> {
        if let Some(error_line) = self.lines.iter().rev().find(|l| l.starts_with("ERROR:")) {
            return Some(error_line.clone());
        }
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.iter().cloned().collect::<Vec<_>>().join("\n"))
        }
    }
}
