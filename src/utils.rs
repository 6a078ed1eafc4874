//! Utility functions for filenames, quality labels and HTTP headers

use crate::error::{Error, Result};
use crate::types::TaskId;
use regex::Regex;
use std::sync::OnceLock;

/// Maximum length (in characters) of a sanitized title before the task suffix
pub const MAX_STEM_CHARS: usize = 100;

/// Stem used when a title sanitizes down to nothing
const FALLBACK_STEM: &str = "video";

// Characters that are illegal in filenames on at least one major platform
#[allow(clippy::expect_used)]
fn illegal_chars() -> &'static Regex {
    static ILLEGAL: OnceLock<Regex> = OnceLock::new();
    ILLEGAL.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("static regex is valid"))
}

/// Turn a display title into a filesystem-safe stem
///
/// Strips `\ / * ? : " < > |` and control characters, replaces every run of
/// whitespace with a single underscore and truncates to [`MAX_STEM_CHARS`]
/// characters. Leading dots are dropped so the result is never a hidden file.
///
/// # Examples
///
/// ```
/// use vidgrab::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("My Clip"), "My_Clip");
/// assert_eq!(sanitize_title("a/b: c?"), "ab_c");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let stripped = illegal_chars().replace_all(title, "");
    let joined = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(|c: char| c.is_control(), "");
    let trimmed = joined.trim_start_matches('.');
    let truncated: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    let truncated = truncated.trim_end_matches('_').to_string();

    if truncated.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        truncated
    }
}

/// Stored-file stem for a task: `<sanitized-title>_<task-id>`
///
/// The task identifier suffix keeps files from two tasks with the same title apart.
pub fn output_stem(title: Option<&str>, id: &TaskId) -> String {
    let base = title.map(sanitize_title).unwrap_or_else(|| FALLBACK_STEM.to_string());
    format!("{}_{}", base, id)
}

/// Parse a quality label ("1080p", "720P", "480") into a height ceiling
pub fn parse_quality(label: &str) -> Option<u32> {
    let label = label.trim();
    let digits = label
        .strip_suffix('p')
        .or_else(|| label.strip_suffix('P'))
        .unwrap_or(label);
    match digits.parse::<u32>() {
        Ok(height) if height > 0 => Some(height),
        _ => None,
    }
}

/// Check a user-supplied page URL and return it normalized
///
/// The URL must be non-empty, parse, and use the `http` or `https` scheme. A URL
/// typed without a scheme (`youtu.be/abc`) is taken as `https://`.
pub fn validate_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("URL is required".to_string()));
    }
    let invalid = |e: url::ParseError| Error::InvalidInput(format!("invalid URL '{}': {}", trimmed, e));
    let (parsed, normalized) = match url::Url::parse(trimmed) {
        Ok(parsed) => (parsed, trimmed.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let with_scheme = format!("https://{}", trimmed);
            let parsed = url::Url::parse(&with_scheme).map_err(invalid)?;
            (parsed, with_scheme)
        }
        Err(e) => return Err(invalid(e)),
    };
    match parsed.scheme() {
        "http" | "https" => Ok(normalized),
        other => Err(Error::InvalidInput(format!(
            "unsupported URL scheme '{}'",
            other
        ))),
    }
}

/// Whether `name` can be joined onto the storage directory without escaping it
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.starts_with('.')
}

/// Round to one decimal place
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentage `downloaded / total`, clamped to [0, 100] and rounded to one decimal
///
/// Returns `None` when the total is unknown or zero.
pub fn percent_of(downloaded: u64, total: Option<u64>) -> Option<f64> {
    let total = total.filter(|t| *t > 0)?;
    let pct = downloaded as f64 / total as f64 * 100.0;
    Some(round_one_decimal(pct.clamp(0.0, 100.0)))
}

/// Content type for a stored media file, by extension
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("m4a") => "audio/mp4",
        Some("mp3") => "audio/mpeg",
        Some("opus") | Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// `Content-Disposition` value that names `filename` as an attachment
///
/// Carries an ASCII fallback plus an RFC 5987 `filename*` for non-ASCII titles.
pub fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && c != '"' && c != '\\' && !c.is_ascii_control() {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const FORBIDDEN: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

    #[test]
    fn sanitize_replaces_spaces() {
        assert_eq!(sanitize_title("My Clip"), "My_Clip");
        assert_eq!(sanitize_title("  lots   of\tspace  "), "lots_of_space");
    }

    #[test]
    fn sanitize_strips_forbidden_characters() {
        let title = r#"What? A "great" <video>: part 1/2 | \final*"#;
        let stem = sanitize_title(title);
        assert!(!stem.contains(FORBIDDEN), "{}", stem);
        assert!(!stem.contains(' '));
        assert_eq!(stem, "What_A_great_video_part_12_final");
    }

    #[test]
    fn sanitize_treats_tabs_and_newlines_as_spaces() {
        assert_eq!(sanitize_title("tab\tand\nnewline"), "tab_and_newline");
    }

    #[test]
    fn sanitize_caps_length_in_chars() {
        let long = "é".repeat(250);
        let stem = sanitize_title(&long);
        assert_eq!(stem.chars().count(), MAX_STEM_CHARS);
    }

    #[test]
    fn sanitize_property_over_assorted_titles() {
        let long = "x y ".repeat(80);
        let titles = [
            "",
            "   ",
            "////",
            "normal title",
            "中文 标题: 测试?",
            "..hidden",
            long.as_str(),
            "tab\tand\nnewline",
            "bell\u{7}char",
        ];
        for title in titles {
            let stem = sanitize_title(title);
            assert!(!stem.is_empty());
            assert!(!stem.contains(FORBIDDEN), "{:?} -> {:?}", title, stem);
            assert!(!stem.chars().any(char::is_whitespace), "{:?}", stem);
            assert!(stem.chars().count() <= MAX_STEM_CHARS);
            assert!(!stem.starts_with('.'));
        }
    }

    #[test]
    fn sanitize_falls_back_when_nothing_is_left() {
        assert_eq!(sanitize_title("???"), "video");
        assert_eq!(sanitize_title(""), "video");
    }

    #[test]
    fn output_stem_appends_task_id() {
        let a = TaskId::from("1a2b3c4d");
        let b = TaskId::from("5e6f7a8b");
        assert_eq!(output_stem(Some("My Clip"), &a), "My_Clip_1a2b3c4d");
        assert_ne!(output_stem(Some("My Clip"), &a), output_stem(Some("My Clip"), &b));
        assert_eq!(output_stem(None, &a), "video_1a2b3c4d");
    }

    #[test]
    fn parse_quality_accepts_height_labels() {
        assert_eq!(parse_quality("1080p"), Some(1080));
        assert_eq!(parse_quality("720P"), Some(720));
        assert_eq!(parse_quality(" 480 "), Some(480));
    }

    #[test]
    fn parse_quality_rejects_other_labels() {
        assert_eq!(parse_quality("best"), None);
        assert_eq!(parse_quality("p"), None);
        assert_eq!(parse_quality("0p"), None);
        assert_eq!(parse_quality("-720p"), None);
    }

    #[test]
    fn validate_url_trims_and_accepts_http() {
        assert_eq!(
            validate_url("  https://example/video ").unwrap(),
            "https://example/video"
        );
        assert!(validate_url("http://example.com/watch?v=abc").is_ok());
    }

    #[test]
    fn validate_url_adds_https_when_scheme_missing() {
        assert_eq!(validate_url("youtu.be/abc").unwrap(), "https://youtu.be/abc");
        assert_eq!(
            validate_url(" www.example.com/watch?v=abc ").unwrap(),
            "https://www.example.com/watch?v=abc"
        );
    }

    #[test]
    fn validate_url_rejects_empty_and_odd_input() {
        for raw in ["", "   ", "not a url", "ftp://example.com/a", "file:///etc/passwd"] {
            let err = validate_url(raw).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(ref m) if !m.is_empty()), "{:?}", raw);
        }
    }

    #[test]
    fn safe_filename_rejects_traversal() {
        assert!(is_safe_filename("My_Clip_1a2b3c4d.mp4"));
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename("a/b.mp4"));
        assert!(!is_safe_filename("a\\b.mp4"));
        assert!(!is_safe_filename(".."));
        assert!(!is_safe_filename(""));
        assert!(!is_safe_filename(".hidden"));
    }

    #[test]
    fn percent_rounds_and_clamps() {
        assert_eq!(percent_of(1, Some(3)), Some(33.3));
        assert_eq!(percent_of(2, Some(3)), Some(66.7));
        assert_eq!(percent_of(150, Some(100)), Some(100.0));
        assert_eq!(percent_of(10, Some(0)), None);
        assert_eq!(percent_of(10, None), None);
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for("a.mp4"), "video/mp4");
        assert_eq!(content_type_for("a.WEBM"), "video/webm");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[test]
    fn disposition_encodes_non_ascii_names() {
        let value = attachment_disposition("中文_1a2b3c4d.mp4");
        assert!(value.starts_with("attachment; filename=\""));
        assert!(value.contains("filename*=UTF-8''%E4%B8%AD%E6%96%87_1a2b3c4d.mp4"));
        assert!(value.is_ascii());
    }
}
