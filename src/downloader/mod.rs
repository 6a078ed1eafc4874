//! Core downloader implementation split into focused submodules.
//!
//! The `VideoDownloader` struct and its methods are organized by domain:
//! - [`tasks`] - Download submission and status lookup
//! - [`download_task`] - Per-task worker and progress reporting
//! - [`info`] - Video metadata and selectable qualities
//! - [`storage`] - Listing, serving and deleting stored files
//! - [`retention`] - Timed deletion of old files
//! - [`lifecycle`] - Shutdown coordination

mod download_task;
mod info;
mod lifecycle;
mod retention;
mod storage;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use info::{DEFAULT_QUALITIES, MIN_LISTED_HEIGHT, summarize_formats};
pub use retention::{SweepReport, sweep_expired};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{MediaExtractor, NoOpExtractor, YtDlpExtractor};
use crate::registry::TaskRegistry;
use crate::types::{Event, TaskId};

/// Worker pool and download state management
#[derive(Clone)]
pub(crate) struct QueueState {
    /// Semaphore to limit concurrent downloads (respects max_concurrent_downloads config)
    pub(crate) concurrent_limit: std::sync::Arc<tokio::sync::Semaphore>,
    /// Tasks whose worker has been spawned and has not finished yet
    pub(crate) active_downloads:
        std::sync::Arc<tokio::sync::Mutex<std::collections::HashSet<TaskId>>>,
    /// Flag to indicate whether new downloads are accepted (set to false during shutdown)
    pub(crate) accepting_new: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl QueueState {
    fn new(max_concurrent: usize) -> Self {
        Self {
            concurrent_limit: std::sync::Arc::new(tokio::sync::Semaphore::new(max_concurrent)),
            active_downloads: std::sync::Arc::new(tokio::sync::Mutex::new(
                std::collections::HashSet::new(),
            )),
            accepting_new: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true)),
        }
    }
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct VideoDownloader {
    /// Task table shared by workers and request handlers
    pub(crate) registry: TaskRegistry,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: std::sync::Arc<Config>,
    /// Extraction collaborator (trait object for pluggable implementations)
    pub(crate) extractor: std::sync::Arc<dyn MediaExtractor>,
    /// Worker pool and download state management
    pub(crate) queue_state: QueueState,
    /// Cancelled at shutdown to stop background services
    pub(crate) shutdown_token: tokio_util::sync::CancellationToken,
}

impl VideoDownloader {
    /// Create a new VideoDownloader instance
    ///
    /// Validates the configuration, creates the storage directory and picks the
    /// extractor: yt-dlp when it can be located, otherwise a no-op stand-in so stored
    /// files can still be listed and served.
    pub async fn new(config: Config) -> Result<Self> {
        let extractor: std::sync::Arc<dyn MediaExtractor> =
            match YtDlpExtractor::from_config(&config.extractor) {
                Some(extractor) => {
                    tracing::info!(
                        path = %extractor.binary_path().display(),
                        "using yt-dlp extractor"
                    );
                    std::sync::Arc::new(extractor)
                }
                None => {
                    tracing::warn!(
                        "yt-dlp not found; metadata lookups and new downloads are disabled"
                    );
                    std::sync::Arc::new(NoOpExtractor)
                }
            };

        Self::with_extractor(config, extractor).await
    }

    /// Create a VideoDownloader around an explicit extractor
    pub async fn with_extractor(
        config: Config,
        extractor: std::sync::Arc<dyn MediaExtractor>,
    ) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        // Create broadcast channel with buffer size of 1000 events
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        let queue_state = QueueState::new(config.download.max_concurrent_downloads);

        tracing::info!(
            download_dir = %config.download.download_dir.display(),
            max_concurrent = config.download.max_concurrent_downloads,
            extractor = extractor.name(),
            "video downloader initialized"
        );

        Ok(Self {
            registry: TaskRegistry::new(),
            event_tx,
            config: std::sync::Arc::new(config),
            extractor,
            queue_state,
            shutdown_token: tokio_util::sync::CancellationToken::new(),
        })
    }

    /// Subscribe to download events
    ///
    /// Each subscriber receives every event independently. A subscriber that falls
    /// more than 1000 events behind gets `RecvError::Lagged` and skips ahead.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers (no-op when nobody listens)
    pub(crate) fn emit_event(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    /// Active configuration
    pub fn get_config(&self) -> std::sync::Arc<Config> {
        self.config.clone()
    }

    /// Task registry
    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Name of the extractor in use
    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Whether new downloads are currently accepted
    pub fn is_accepting(&self) -> bool {
        self.queue_state
            .accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}
