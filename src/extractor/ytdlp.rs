//! Extractor driving the external yt-dlp binary

use super::parser::{
    OutputTail, final_path_template, parse_final_path_line, parse_metadata, parse_progress_line,
    progress_template,
};
use super::traits::{FetchRequest, MediaExtractor, MediaMetadata, ProgressUpdate};
use crate::config::ExtractorConfig;
use crate::error::{Error, ExtractionError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Extractor that shells out to `yt-dlp`
///
/// Metadata comes from `--dump-single-json`. Downloads run with a progress template
/// and an `after_move` print so that byte counters and the final path can be read
/// from the process output.
///
/// # Examples
///
/// ```no_run
/// use vidgrab::extractor::{MediaExtractor, YtDlpExtractor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = YtDlpExtractor::from_path().expect("yt-dlp not found in PATH");
/// let meta = extractor.fetch_metadata("https://example.com/watch?v=abc").await?;
/// println!("{:?}", meta.title);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    ffmpeg_location: Option<PathBuf>,
    socket_timeout: Duration,
}

impl YtDlpExtractor {
    /// Create an extractor for an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            ffmpeg_location: None,
            socket_timeout: Duration::from_secs(30),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Build from configuration
    ///
    /// An explicit `ytdlp_path` wins; otherwise PATH is searched when `search_path` is set.
    /// Returns `None` when no binary could be located.
    pub fn from_config(config: &ExtractorConfig) -> Option<Self> {
        let extractor = match &config.ytdlp_path {
            Some(path) => Some(Self::new(path.clone())),
            None if config.search_path => Self::from_path(),
            None => None,
        }?;
        Some(
            extractor
                .with_ffmpeg_location(config.ffmpeg_location.clone())
                .with_socket_timeout(config.socket_timeout),
        )
    }

    /// Pass `--ffmpeg-location` to every download
    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    /// Network socket timeout handed to yt-dlp
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Path of the binary this extractor runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    fn metadata_args(&self, url: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--dump-single-json",
            "--no-playlist",
            "--no-warnings",
            "--skip-download",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push("--socket-timeout".into());
        args.push(self.socket_timeout.as_secs().max(1).to_string().into());
        // "--" keeps a URL starting with '-' from being read as an option
        args.push("--".into());
        args.push(url.into());
        args
    }

    fn download_args(&self, request: &FetchRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.push("-f".into());
        args.push(request.format_selector().into());
        args.push("--merge-output-format".into());
        args.push(request.merge_format.clone().into());
        args.push("-o".into());
        args.push(output_template(request).into());
        for flag in ["--no-playlist", "--no-warnings", "--newline", "--progress"] {
            args.push(flag.into());
        }
        args.push("--progress-template".into());
        args.push(progress_template().into());
        args.push("--print".into());
        args.push(final_path_template().into());
        args.push("--socket-timeout".into());
        args.push(self.socket_timeout.as_secs().max(1).to_string().into());
        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(ffmpeg.clone().into_os_string());
        }
        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }

    fn spawn_error(e: std::io::Error) -> Error {
        Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e))
    }
}

/// `-o` template; '%' in the directory or stem is escaped so yt-dlp keeps it literally
fn output_template(request: &FetchRequest) -> String {
    let dir = request.output_dir.to_string_lossy().replace('%', "%%");
    let stem = request.output_stem.replace('%', "%%");
    PathBuf::from(dir)
        .join(format!("{}.%(ext)s", stem))
        .to_string_lossy()
        .into_owned()
}

/// What one output stream of a download run carried besides progress
#[derive(Debug, Default)]
struct StreamScan {
    final_path: Option<PathBuf>,
    tail: OutputTail,
}

/// Read a stream line by line, forwarding progress and recording the final path
///
/// Lines are decoded lossily so a stray non-UTF-8 byte never stops the pipe from
/// being drained.
async fn scan_stream<R>(reader: R, progress: mpsc::Sender<ProgressUpdate>) -> StreamScan
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut scan = StreamScan::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                if let Some(update) = parse_progress_line(line) {
                    // The receiver going away only means nobody is listening any more
                    let _ = progress.send(update).await;
                } else if let Some(path) = parse_final_path_line(line) {
                    scan.final_path = Some(path);
                } else {
                    scan.tail.push(line);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read yt-dlp output");
                break;
            }
        }
    }

    scan
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn fetch_metadata(&self, url: &str) -> crate::Result<MediaMetadata> {
        tracing::debug!(url = %url, "fetching metadata with yt-dlp");

        let output = Command::new(&self.binary_path)
            .args(self.metadata_args(url))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(Self::spawn_error)?;

        if !output.status.success() {
            let mut tail = OutputTail::default();
            for line in String::from_utf8_lossy(&output.stderr).lines() {
                tail.push(line);
            }
            let reason = tail
                .failure_reason()
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            return Err(ExtractionError::Failed { reason }.into());
        }

        parse_metadata(&output.stdout)
    }

    async fn download(
        &self,
        request: &FetchRequest,
        progress: mpsc::Sender<ProgressUpdate>,
    ) -> crate::Result<PathBuf> {
        tracing::debug!(
            url = %request.url,
            format = %request.format_selector(),
            stem = %request.output_stem,
            "starting yt-dlp download"
        );

        let mut child = Command::new(&self.binary_path)
            .args(self.download_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(Self::spawn_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExternalTool("yt-dlp stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalTool("yt-dlp stderr was not captured".into()))?;

        let stderr_scan = tokio::spawn(scan_stream(stderr, progress.clone()));
        let stdout_scan = scan_stream(stdout, progress).await;
        let status = child.wait().await?;
        let stderr_scan = stderr_scan.await.unwrap_or_default();

        if !status.success() {
            let reason = stderr_scan
                .tail
                .failure_reason()
                .or_else(|| stdout_scan.tail.failure_reason())
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            return Err(ExtractionError::Failed { reason }.into());
        }

        let path = stdout_scan
            .final_path
            .or(stderr_scan.final_path)
            .unwrap_or_else(|| request.expected_path());

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExtractionError::FileMissing { path }.into());
        }

        Ok(path)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
