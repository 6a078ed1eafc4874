//! Media extraction
//!
//! Resolving a page URL into metadata and fetching the media itself are delegated to
//! an external extractor behind the [`MediaExtractor`] trait:
//!
//! - [`YtDlpExtractor`]: drives the `yt-dlp` binary
//! - [`NoOpExtractor`]: stub used when no binary is available
//!
//! ## Usage
//!
//! ```no_run
//! use vidgrab::extractor::{FetchRequest, MediaExtractor, ProgressUpdate, YtDlpExtractor};
//! use std::path::PathBuf;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = YtDlpExtractor::from_path().expect("yt-dlp binary not found");
//!
//!     let (tx, mut rx) = mpsc::channel::<ProgressUpdate>(64);
//!     tokio::spawn(async move {
//!         while let Some(update) = rx.recv().await {
//!             println!("{} / {:?}", update.downloaded_bytes, update.total_bytes);
//!         }
//!     });
//!
//!     let request = FetchRequest {
//!         url: "https://example.com/watch?v=abc".into(),
//!         max_height: 720,
//!         output_dir: PathBuf::from("downloads"),
//!         output_stem: "clip_1a2b3c4d".into(),
//!         merge_format: "mp4".into(),
//!     };
//!     let path = extractor.download(&request, tx).await?;
//!     println!("saved to {}", path.display());
//!     Ok(())
//! }
//! ```

mod noop;
pub mod parser;
mod traits;
mod ytdlp;

pub use noop::NoOpExtractor;
pub(crate) use traits::file_name_of;
pub use traits::{
    FetchRequest, MediaExtractor, MediaFormat, MediaMetadata, ProgressPhase, ProgressUpdate,
};
pub use ytdlp::YtDlpExtractor;
