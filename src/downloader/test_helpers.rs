//! Shared test helpers for creating VideoDownloader instances in tests.

use crate::config::Config;
use crate::downloader::VideoDownloader;
use crate::error::ExtractionError;
use crate::extractor::{
    FetchRequest, MediaExtractor, MediaFormat, MediaMetadata, ProgressPhase, ProgressUpdate,
};
use crate::types::{Task, TaskId};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::{Semaphore, mpsc};

/// What a [`MockExtractor`] download ends with
#[derive(Clone, Debug)]
pub(crate) enum MockOutcome {
    /// Write `content` to `<stem>.<ext>` and return that path
    Succeed { ext: String, content: Vec<u8> },
    /// Report an extractor failure with this reason
    Fail(String),
    /// Report success without writing anything
    MissingFile,
}

/// Scriptable extractor: canned metadata, progress steps and download outcome
#[derive(Clone)]
pub(crate) struct MockExtractor {
    metadata: std::result::Result<MediaMetadata, String>,
    progress: Vec<(u64, Option<u64>)>,
    outcome: MockOutcome,
    gate: Option<Arc<Semaphore>>,
    requests: Arc<std::sync::Mutex<Vec<FetchRequest>>>,
    running: Arc<AtomicUsize>,
    peak_running: Arc<AtomicUsize>,
}

impl MockExtractor {
    /// Succeeds with a small mp4 and no progress reports
    pub(crate) fn succeeding() -> Self {
        Self {
            metadata: Ok(sample_metadata()),
            progress: Vec::new(),
            outcome: MockOutcome::Succeed {
                ext: "mp4".to_string(),
                content: b"fake mp4 bytes".to_vec(),
            },
            gate: None,
            requests: Arc::new(std::sync::Mutex::new(Vec::new())),
            running: Arc::new(AtomicUsize::new(0)),
            peak_running: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fails every download (and metadata lookup) with `reason`
    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            metadata: Err(reason.to_string()),
            outcome: MockOutcome::Fail(reason.to_string()),
            ..Self::succeeding()
        }
    }

    pub(crate) fn with_outcome(mut self, outcome: MockOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub(crate) fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = Ok(metadata);
        self
    }

    /// Byte counters `(downloaded, total)` sent before the outcome
    pub(crate) fn with_progress(mut self, steps: Vec<(u64, Option<u64>)>) -> Self {
        self.progress = steps;
        self
    }

    /// Block every download until the returned semaphore gets a permit per download
    pub(crate) fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(gate.clone());
        (self, gate)
    }

    /// Every request the extractor has received so far
    pub(crate) fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Downloads currently inside the extractor
    pub(crate) fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Highest number of downloads that were inside the extractor at once
    pub(crate) fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaExtractor for MockExtractor {
    async fn fetch_metadata(&self, _url: &str) -> crate::Result<MediaMetadata> {
        self.metadata
            .clone()
            .map_err(|reason| ExtractionError::Failed { reason }.into())
    }

    async fn download(
        &self,
        request: &FetchRequest,
        progress: mpsc::Sender<ProgressUpdate>,
    ) -> crate::Result<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());
        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(now_running, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        for (downloaded, total) in &self.progress {
            let _ = progress
                .send(ProgressUpdate {
                    phase: ProgressPhase::Downloading,
                    downloaded_bytes: *downloaded,
                    total_bytes: *total,
                })
                .await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        match &self.outcome {
            MockOutcome::Succeed { ext, content } => {
                let path = request
                    .output_dir
                    .join(format!("{}.{}", request.output_stem, ext));
                tokio::fs::write(&path, content).await?;
                Ok(path)
            }
            MockOutcome::Fail(reason) => Err(ExtractionError::Failed {
                reason: reason.clone(),
            }
            .into()),
            MockOutcome::MissingFile => Ok(request.expected_path()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Metadata with a spread of streams around the 720p cut-off
pub(crate) fn sample_metadata() -> MediaMetadata {
    let format = |id: &str, height: Option<u32>, size: u64, video: bool, audio: bool| MediaFormat {
        format_id: id.to_string(),
        ext: if video { "mp4" } else { "m4a" }.to_string(),
        height,
        filesize: Some(size),
        has_video: video,
        has_audio: audio,
    };
    MediaMetadata {
        title: Some("My Clip".to_string()),
        thumbnail: Some("https://example/thumb.jpg".to_string()),
        duration: Some(212.0),
        formats: vec![
            format("140", None, 3_000_000, false, true),
            format("18", Some(360), 9_000_000, true, true),
            format("136", Some(720), 20_000_000, true, false),
            format("137", Some(1080), 50_000_000, true, false),
        ],
    }
}

/// Helper to create a test VideoDownloader around `extractor`.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) async fn create_test_downloader(
    extractor: MockExtractor,
) -> (VideoDownloader, tempfile::TempDir) {
    create_test_downloader_with(extractor, |_| {}).await
}

/// Like [`create_test_downloader`], letting the caller adjust the config first
pub(crate) async fn create_test_downloader_with(
    extractor: MockExtractor,
    adjust: impl FnOnce(&mut Config),
) -> (VideoDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = 3;
    adjust(&mut config);

    let downloader = VideoDownloader::with_extractor(config, Arc::new(extractor))
        .await
        .unwrap();

    (downloader, temp_dir)
}

/// Poll until the task reaches a terminal state (panics after 5 seconds)
pub(crate) async fn wait_for_terminal(downloader: &VideoDownloader, id: &TaskId) -> Task {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let task = downloader.get_task(id).await.unwrap();
        if task.status.is_terminal() {
            return task;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {} stuck in {}",
            id,
            task.status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Poll until `check` holds for the task (panics after 5 seconds)
pub(crate) async fn wait_for_task(
    downloader: &VideoDownloader,
    id: &TaskId,
    check: impl Fn(&Task) -> bool,
) -> Task {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let task = downloader.get_task(id).await.unwrap();
        if check(&task) {
            return task;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "task {} never reached the expected state (last: {:?})",
            id,
            task
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
