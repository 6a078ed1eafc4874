//! Retention sweeper: timed deletion of old stored files.

use crate::error::Result;
use crate::types::Event;
use std::path::Path;
use std::time::{Duration, SystemTime};

use super::VideoDownloader;

/// Outcome of one sweep over the storage directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Names of files that were deleted
    pub deleted: Vec<String>,
    /// Number of expired files that could not be deleted
    pub failed: usize,
}

/// Delete every regular file in `dir` whose modification time is more than
/// `max_age` before `now`
///
/// A file that cannot be inspected or removed is logged and counted in
/// [`SweepReport::failed`]; the sweep carries on with the rest. An error while listing
/// stops the sweep early and is counted the same way. Only a failure to open the
/// directory itself is returned as an error.
pub async fn sweep_expired(dir: &Path, max_age: Duration, now: SystemTime) -> Result<SweepReport> {
    let mut report = SweepReport::default();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = next_listed(entries.next_entry().await, dir, &mut report) {
        let path = entry.path();
        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "failed to stat file during sweep");
                report.failed += 1;
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "file has no modification time");
                report.failed += 1;
                continue;
            }
        };
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = ?path, age_days = age.as_secs() / 86_400, "deleted expired file");
                report
                    .deleted
                    .push(entry.file_name().to_string_lossy().into_owned());
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "failed to delete expired file");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Unwrap one directory listing step; a listing error ends the sweep and counts as a failure
fn next_listed<T>(
    step: std::io::Result<Option<T>>,
    dir: &Path,
    report: &mut SweepReport,
) -> Option<T> {
    match step {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(dir = ?dir, error = %e, "failed to list directory during sweep");
            report.failed += 1;
            None
        }
    }
}

impl VideoDownloader {
    /// Run one retention sweep now and announce every removed file
    pub async fn run_retention_sweep(&self) -> Result<SweepReport> {
        let report = sweep_expired(
            self.config.download_dir(),
            self.config.retention.max_age,
            SystemTime::now(),
        )
        .await?;

        for filename in &report.deleted {
            self.emit_event(Event::FileExpired {
                filename: filename.clone(),
            });
        }

        if !report.deleted.is_empty() || report.failed > 0 {
            tracing::info!(
                deleted = report.deleted.len(),
                failed = report.failed,
                "retention sweep finished"
            );
        } else {
            tracing::debug!("retention sweep found nothing to delete");
        }
        Ok(report)
    }

    /// Start the retention sweeper background task
    ///
    /// Sweeps once right away and then every `retention.sweep_interval` until
    /// shutdown. A failed cycle is logged and the loop keeps going.
    pub fn start_retention_sweeper(&self) -> tokio::task::JoinHandle<()> {
        if !self.config.retention.enabled {
            tracing::info!("Retention disabled, skipping retention sweeper");
            return tokio::spawn(async {});
        }

        let period = self.config.retention.sweep_interval;
        let downloader = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = downloader.shutdown_token.cancelled() => {
                        tracing::debug!("retention sweeper stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = downloader.run_retention_sweep().await {
                            tracing::error!(error = %e, "retention sweep failed");
                        }
                    }
                }
            }
        });

        tracing::info!(
            max_age_days = self.config.retention.max_age.as_secs() / 86_400,
            interval_secs = period.as_secs(),
            "Retention sweeper background task started"
        );

        handle
    }
}
