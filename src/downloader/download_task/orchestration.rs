//! Top-level download task lifecycle: permit, extractor run, terminal state.

use crate::error::{Error, ExtractionError, Result};
use crate::extractor::{FetchRequest, file_name_of};
use crate::types::{Event, TaskId};
use crate::utils::{output_stem, parse_quality};
use tokio::sync::mpsc;

use super::super::VideoDownloader;
use super::{PROGRESS_CHANNEL_BUFFER, spawn_progress_reporter};

/// What a worker needs besides the task identifier
#[derive(Debug, Clone)]
pub(crate) struct DownloadJob {
    /// Source page URL (validated)
    pub url: String,
    /// Quality label as submitted
    pub quality: String,
    /// Display title used for the filename stem
    pub title: Option<String>,
}

impl VideoDownloader {
    /// Spawn the worker for a freshly allocated task
    ///
    /// The task is tracked in `active_downloads` from spawn until the worker has
    /// written its terminal state.
    pub(crate) async fn spawn_download_task(
        &self,
        id: TaskId,
        job: DownloadJob,
    ) -> tokio::task::JoinHandle<()> {
        self.queue_state
            .active_downloads
            .lock()
            .await
            .insert(id.clone());

        let downloader = self.clone();
        tokio::spawn(async move {
            downloader.run_download_task(&id, job).await;
            downloader
                .queue_state
                .active_downloads
                .lock()
                .await
                .remove(&id);
        })
    }

    /// Worker body: wait for a slot, mark downloading, run, record the outcome
    async fn run_download_task(&self, id: &TaskId, job: DownloadJob) {
        let _permit = match self.queue_state.concurrent_limit.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                tracing::error!(task_id = %id, "download slot semaphore closed");
                return;
            }
        };

        if let Err(e) = self.registry.mark_downloading(id).await {
            tracing::error!(task_id = %id, error = %e, "failed to mark task downloading");
            return;
        }
        self.emit_event(Event::Started { id: id.clone() });
        tracing::info!(task_id = %id, url = %job.url, quality = %job.quality, "download started");

        let outcome = if self.is_accepting() {
            self.execute_download(id, &job).await
        } else {
            Err(Error::ShuttingDown)
        };

        self.finish_download(id, outcome).await;
    }

    /// Run the extractor and return the stored filename
    async fn execute_download(&self, id: &TaskId, job: &DownloadJob) -> Result<String> {
        let max_height = parse_quality(&job.quality).ok_or_else(|| {
            ExtractionError::InvalidQuality {
                label: job.quality.clone(),
            }
        })?;

        let request = FetchRequest {
            url: job.url.clone(),
            max_height,
            output_dir: self.config.download_dir().clone(),
            output_stem: output_stem(job.title.as_deref(), id),
            merge_format: self.config.extractor.merge_output_format.clone(),
        };

        let (progress_tx, progress_rx) = mpsc::channel(PROGRESS_CHANNEL_BUFFER);
        let reporter = spawn_progress_reporter(
            id.clone(),
            progress_rx,
            self.registry.clone(),
            self.event_tx.clone(),
        );

        let result = self.extractor.download(&request, progress_tx).await;

        // The sender was moved into the extractor, so the reporter ends once it has
        // drained everything that was sent.
        if let Err(e) = reporter.await {
            tracing::warn!(task_id = %id, error = %e, "progress reporter panicked");
        }

        let path = result?;
        let filename = file_name_of(&path).ok_or_else(|| ExtractionError::InvalidOutput {
            reason: format!("extractor returned unusable path '{}'", path.display()),
        })?;

        let stored = request.output_dir.join(&filename);
        if !tokio::fs::try_exists(&stored).await.unwrap_or(false) {
            return Err(ExtractionError::FileMissing { path: stored }.into());
        }

        Ok(filename)
    }

    /// Write the terminal state and announce it
    async fn finish_download(&self, id: &TaskId, outcome: Result<String>) {
        match outcome {
            Ok(filename) => match self.registry.mark_completed(id, filename.clone()).await {
                Ok(_) => {
                    tracing::info!(task_id = %id, filename = %filename, "download completed");
                    self.emit_event(Event::Completed {
                        id: id.clone(),
                        filename,
                    });
                }
                Err(e) => {
                    tracing::error!(task_id = %id, error = %e, "failed to mark task completed");
                }
            },
            Err(failure) => {
                let message = failure.to_string();
                tracing::warn!(task_id = %id, error = %message, "download failed");
                match self.registry.mark_failed(id, message.clone()).await {
                    Ok(_) => self.emit_event(Event::Failed {
                        id: id.clone(),
                        error: message,
                    }),
                    Err(e) => {
                        tracing::error!(task_id = %id, error = %e, "failed to mark task failed");
                    }
                }
            }
        }
    }
}
