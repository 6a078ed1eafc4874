//! Stored files: listing, lookup, serving and deletion.
//!
//! The storage directory is flat and is its own source of truth; there is no
//! manifest. Names handed in by clients are checked before they touch the
//! filesystem so nothing outside the directory can be reached.

use crate::error::{Error, Result};
use crate::types::{Event, StoredFile, TaskId, TaskStatus};
use crate::utils::{is_safe_filename, round_one_decimal};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use super::VideoDownloader;

const SECONDS_PER_DAY: u64 = 86_400;

/// Suffixes of files an in-flight download is still writing
const PARTIAL_SUFFIXES: [&str; 3] = [".part", ".ytdl", ".temp"];

impl VideoDownloader {
    /// Every stored file, newest first
    pub async fn list_videos(&self) -> Result<Vec<StoredFile>> {
        let dir = self.config.download_dir();
        let now = SystemTime::now();
        let max_age = self.config.retention.max_age;

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let Some(filename) = entry.file_name().to_str().map(|s| s.to_string()) else {
                continue;
            };
            if !is_listable(&filename) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!(filename = %filename, error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let modified = metadata.modified().unwrap_or(now);

            files.push(StoredFile {
                size_mb: round_one_decimal(metadata.len() as f64 / (1024.0 * 1024.0)),
                size: metadata.len(),
                created: DateTime::<Utc>::from(modified),
                days_left: days_left(modified, now, max_age),
                filename,
            });
        }

        files.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(files)
    }

    /// Path of a stored file, after checking the name and that the file exists
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for names that could escape the storage directory
    /// - [`Error::NotFound`] when no such file is stored
    pub async fn video_path(&self, filename: &str) -> Result<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(Error::InvalidInput(format!("invalid filename '{}'", filename)));
        }

        let path = self.config.download_dir().join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(path),
            Ok(_) => Err(Error::NotFound(format!("file '{}'", filename))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("file '{}'", filename)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored file by name
    pub async fn delete_video(&self, filename: &str) -> Result<()> {
        let path = self.video_path(filename).await?;
        tokio::fs::remove_file(&path).await?;

        tracing::info!(filename = %filename, "stored file deleted");
        self.emit_event(Event::FileDeleted {
            filename: filename.to_string(),
        });
        Ok(())
    }

    /// Filename and path of a completed task's file
    ///
    /// # Errors
    ///
    /// - [`Error::TaskNotFound`] for an unknown identifier
    /// - [`Error::FileNotReady`] unless the task completed and its file is still on disk
    pub async fn completed_file(&self, id: &TaskId) -> Result<(String, PathBuf)> {
        let task = self.get_task(id).await?;
        let not_ready = |reason: String| Error::FileNotReady {
            id: id.to_string(),
            reason,
        };

        if task.status != TaskStatus::Completed {
            return Err(not_ready(format!("task is {}", task.status)));
        }
        let filename = task
            .filename
            .ok_or_else(|| not_ready("no file was recorded".to_string()))?;

        let path = self.config.download_dir().join(&filename);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(not_ready("file no longer exists on disk".to_string()));
        }
        Ok((filename, path))
    }
}

/// Whether a directory entry name is a finished, visible file
fn is_listable(filename: &str) -> bool {
    !filename.starts_with('.') && !PARTIAL_SUFFIXES.iter().any(|s| filename.ends_with(s))
}

/// Whole days until a file modified at `modified` outlives `max_age` (never negative)
pub(crate) fn days_left(modified: SystemTime, now: SystemTime, max_age: Duration) -> i64 {
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    let remaining = max_age.saturating_sub(age).as_secs();
    remaining.div_ceil(SECONDS_PER_DAY) as i64
}
