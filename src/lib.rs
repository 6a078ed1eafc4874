//! # vidgrab
//!
//! Self-hosted video download service: look up a video page, download it in
//! the background at a chosen quality, poll its progress and fetch the file.
//!
//! ## Design Philosophy
//!
//! vidgrab is designed to be:
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Non-blocking** - Submitting a download returns a task id right away
//! - **Bounded** - A fixed number of downloads run at once, the rest wait
//! - **Self-cleaning** - Stored files are deleted once they pass the retention age
//!
//! ## Quick Start
//!
//! ```no_run
//! use vidgrab::{Config, DownloadRequest, VideoDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = VideoDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let id = downloader
//!         .submit(DownloadRequest {
//!             url: "https://example.com/watch?v=abc".to_string(),
//!             quality: Some("720p".to_string()),
//!             title: Some("My Clip".to_string()),
//!         })
//!         .await?;
//!     println!("status: {:?}", downloader.get_task(&id).await?);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Media extraction backends (yt-dlp)
pub mod extractor;
/// In-memory task registry
pub mod registry;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use downloader::VideoDownloader;
pub use error::{ApiError, Error, ExtractionError, Result, ToHttpStatus};
pub use extractor::{MediaExtractor, NoOpExtractor, YtDlpExtractor};
pub use registry::TaskRegistry;
pub use types::{
    DownloadRequest, Event, FormatOption, StoredFile, Task, TaskCounts, TaskId, TaskStatus,
    VideoInfo,
};

use std::sync::Arc;

/// Run the service until a termination signal arrives, then shut down gracefully.
///
/// Starts the retention sweeper, serves the API on the configured address and,
/// once a signal is received, stops the server and calls the downloader's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use vidgrab::{VideoDownloader, Config, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = VideoDownloader::new(Config::default()).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(Arc::new(downloader)).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: Arc<VideoDownloader>) -> Result<()> {
    let sweeper = downloader.start_retention_sweeper();
    let config = downloader.get_config();

    api::start_api_server_with_shutdown(downloader.clone(), config, wait_for_signal()).await?;

    downloader.shutdown().await?;
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "retention sweeper ended abnormally");
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
