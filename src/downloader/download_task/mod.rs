//! Download task execution -- per-task worker lifecycle.
//!
//! Split into focused submodules:
//! - [`orchestration`] - Worker lifecycle from permit to terminal state
//! - [`progress`] - Drains extractor progress into the registry

mod orchestration;
mod progress;


pub(crate) use orchestration::DownloadJob;
pub(crate) use progress::{PROGRESS_CHANNEL_BUFFER, spawn_progress_reporter};
